//! A rule-driven interaction net reduction engine.

pub mod engine;
pub mod runtime;
pub mod spawn;
pub mod systems;
