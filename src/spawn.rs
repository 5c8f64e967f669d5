use std::future::IntoFuture;

use futures::task::{FutureObj, Spawn, SpawnError};

/// Runs futures on a tokio runtime, for code that only knows about `futures::task::Spawn`.
pub struct TokioSpawn {
    tokio: tokio::runtime::Handle,
}

impl TokioSpawn {
    pub fn from_handle(handle: tokio::runtime::Handle) -> Self {
        Self { tokio: handle }
    }
}

impl Spawn for TokioSpawn {
    fn spawn_obj(&self, future: FutureObj<'static, ()>) -> Result<(), SpawnError> {
        drop(self.tokio.spawn(future.into_future()));
        Ok(())
    }
}
