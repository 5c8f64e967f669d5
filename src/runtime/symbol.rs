use std::fmt::{self, Display};
use std::sync::Arc;

pub type Str = Arc<str>;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// An agent type: a name and the fixed number of ports its agents carry.
/// Port 0 of every agent is its principal port; an arity-0 symbol has none.
pub struct Symbol {
    name: Str,
    arity: usize,
}

impl Symbol {
    pub fn new(name: impl Into<Str>, arity: usize) -> Self {
        Self {
            name: name.into(),
            arity,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shared_name(&self) -> Str {
        Arc::clone(&self.name)
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Number of auxiliary ports, that is every port except the principal one.
    pub fn aux_arity(&self) -> usize {
        self.arity.saturating_sub(1)
    }

    pub fn has_principal(&self) -> bool {
        self.arity > 0
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.arity)
    }
}
