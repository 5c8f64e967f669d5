//! Ready-made rule systems.

use std::fmt::{self, Display};
use std::str::FromStr;

use crate::runtime::{NetError, RuleSet};

pub mod combinators;
pub mod peano;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum System {
    Peano,
    Combinators,
}

impl System {
    pub const ALL: [System; 2] = [System::Peano, System::Combinators];

    pub fn name(self) -> &'static str {
        match self {
            Self::Peano => "peano",
            Self::Combinators => "combinators",
        }
    }

    pub fn rules(self) -> Result<RuleSet, NetError> {
        match self {
            Self::Peano => peano::rules(),
            Self::Combinators => combinators::rules(),
        }
    }
}

impl Display for System {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for System {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|system| system.name() == s)
            .ok_or_else(|| format!("unknown rule system `{s}`"))
    }
}
