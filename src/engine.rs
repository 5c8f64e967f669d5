use std::sync::Arc;

use futures::task::Spawn;
use serde::Serialize;

use crate::runtime::{
    normalize, reduce, verify_confluence, Net, NetError, Normalized, ParallelReducer, RuleSet,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum Strategy {
    /// One active pair at a time, the first one in connection order.
    #[default]
    Sequential,
    /// All active pairs of the net at once, in rounds.
    Parallel,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EngineConfig {
    /// Give up after this many rewrites. `None` runs until normal form.
    pub max_steps: Option<usize>,
    pub strategy: Strategy,
}

pub struct Engine {
    config: EngineConfig,
    rules: Arc<RuleSet>,
    spawner: Arc<dyn Spawn + Send + Sync>,
}

impl Engine {
    pub fn new(config: EngineConfig, rules: RuleSet, spawner: Arc<dyn Spawn + Send + Sync>) -> Self {
        if config.strategy == Strategy::Parallel {
            if let Err(keys) = verify_confluence(&rules) {
                for key in keys {
                    tracing::warn!(rule = %key, "rule is not symmetric, parallel reduction may pick a different normal form");
                }
            }
        }
        Self {
            config,
            rules: Arc::new(rules),
            spawner,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub async fn run(&self, net: &mut Net) -> Result<Normalized, NetError> {
        tracing::debug!(
            strategy = ?self.config.strategy,
            max_steps = ?self.config.max_steps,
            agents = net.agent_count(),
            "reducing"
        );
        match (self.config.strategy, self.config.max_steps) {
            (Strategy::Sequential, Some(max)) => normalize(net, &self.rules, max),
            (Strategy::Sequential, None) => reduce(net, &self.rules),
            (Strategy::Parallel, max_steps) => {
                ParallelReducer::new(Arc::clone(&self.rules), Arc::clone(&self.spawner))
                    .normalize(net, max_steps)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{isomorphic, Outcome};
    use crate::systems::peano;
    use futures::executor::{block_on, ThreadPool};

    fn engine(config: EngineConfig) -> Engine {
        Engine::new(
            config,
            peano::rules().unwrap(),
            Arc::new(ThreadPool::new().unwrap()),
        )
    }

    #[test]
    fn test_strategies_agree() {
        let mut sequential = peano::mul(3, 4).unwrap();
        let mut parallel = sequential.clone();

        let done = block_on(engine(EngineConfig::default()).run(&mut sequential)).unwrap();
        let config = EngineConfig {
            max_steps: None,
            strategy: Strategy::Parallel,
        };
        let done_parallel = block_on(engine(config).run(&mut parallel)).unwrap();

        assert_eq!(done.outcome, Outcome::NormalForm);
        assert_eq!(done_parallel.outcome, Outcome::NormalForm);
        assert_eq!(done.steps, done_parallel.steps);
        assert!(isomorphic(&sequential, &parallel));
        assert_eq!(peano::read_nat(&parallel), Some(12));
        assert!(parallel.rewrites.rounds > 0);
        assert!(parallel.rewrites.rounds < done_parallel.steps as u64);
    }

    #[test]
    fn test_budget_applies_to_both() {
        for strategy in [Strategy::Sequential, Strategy::Parallel] {
            let mut net = peano::mul(2, 2).unwrap();
            let config = EngineConfig {
                max_steps: Some(2),
                strategy,
            };
            let done = block_on(engine(config).run(&mut net)).unwrap();
            assert_eq!(done.outcome, Outcome::Diverging);
            assert_eq!(done.steps, 2);
        }
    }
}
