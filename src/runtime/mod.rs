//! The interaction net engine.
//!
//! A [`Net`] is a graph of agents whose ports are joined pairwise by connections. Two agents
//! whose principal ports are connected form an active pair, which a [`Rule`] rewrites into a
//! [`ReplacementNet`]. Reduction repeats that until no active pair is left.

pub mod arena;
pub mod canonical;
pub mod compose;
pub mod error;
pub mod net;
pub mod parallel;
pub mod reducer;
pub mod rules;
pub mod show;
pub mod stats;
pub mod symbol;
pub mod verify;

pub use canonical::{isomorphic, Shape};
pub use compose::{compose, parallel, sequential, tensor};
pub use error::{NetError, Violation};
pub use net::{empty_net, new_net, Agent, AgentId, Connection, ConnectionId, Net, Port, PortId};
pub use parallel::ParallelReducer;
pub use reducer::{
    apply_rule, find_active_pairs, is_normal_form, match_rule, normalize, reduce, reduce_once,
    ActivePair, Normalized, Outcome, Reduction,
};
pub use rules::{AuxPort, ReplacementNet, Rule, RuleKey, RuleSet, Side, Splice};
pub use stats::Rewrites;
pub use symbol::Symbol;
pub use verify::{verify, verify_confluence, verify_deterministic};
