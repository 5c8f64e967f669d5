use std::fmt::{self, Display};

use super::net::{AgentId, ConnectionId, PortId};
use super::reducer::ActivePair;
use super::rules::RuleKey;
use super::symbol::Symbol;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NetError {
    UnknownPort(PortId),
    UnknownAgent(AgentId),
    UnknownConnection(ConnectionId),
    DoubleConnect(PortId),
    SelfLoop(PortId),
    ArityMismatch {
        key: RuleKey,
        expected: usize,
        found: usize,
    },
    NoPrincipal(Symbol),
    AmbiguousRule(RuleKey),
    InterfaceSizeMismatch {
        left: usize,
        right: usize,
    },
    NotActive(ConnectionId),
    NoApplicableRule(ActivePair),
    Stuck {
        pair: ActivePair,
        steps: usize,
    },
    FreeWire(RuleKey),
    /// A rewrite failed after `steps` others had been made, which stay applied.
    Aborted {
        steps: usize,
        cause: Box<NetError>,
    },
}

impl Display for NetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownPort(port) => write!(f, "port {port:?} is not part of this net"),
            Self::UnknownAgent(agent) => write!(f, "agent {agent:?} is not part of this net"),
            Self::UnknownConnection(connection) => {
                write!(f, "connection {connection:?} is not part of this net")
            }
            Self::DoubleConnect(port) => write!(f, "port {port:?} is already connected"),
            Self::SelfLoop(port) => write!(f, "port {port:?} cannot be connected to itself"),
            Self::ArityMismatch {
                key,
                expected,
                found,
            } => write!(
                f,
                "rule {key} splices {found} auxiliary port(s), but its pattern has {expected}"
            ),
            Self::NoPrincipal(symbol) => write!(
                f,
                "symbol {symbol} has no principal port and cannot appear in a rule"
            ),
            Self::AmbiguousRule(key) => write!(f, "more than one rule is defined for {key}"),
            Self::InterfaceSizeMismatch { left, right } => write!(
                f,
                "cannot compose an interface of {left} port(s) with one of {right} port(s)"
            ),
            Self::NotActive(connection) => write!(
                f,
                "connection {connection:?} does not join two principal ports"
            ),
            Self::NoApplicableRule(pair) => write!(f, "no rule applies to {pair}"),
            Self::Stuck { pair, steps } => {
                write!(f, "reduction is stuck after {steps} step(s): no rule applies to {pair}")
            }
            Self::FreeWire(key) => write!(
                f,
                "rule {key} would join two interface ports with a bare wire"
            ),
            Self::Aborted { steps, cause } => {
                write!(f, "reduction stopped after {steps} step(s): {cause}")
            }
        }
    }
}

impl std::error::Error for NetError {}

impl NetError {
    pub fn to_report(&self) -> miette::Report {
        let message = self.to_string();
        match self {
            Self::UnknownPort(_) | Self::UnknownAgent(_) | Self::UnknownConnection(_) => {
                miette::miette!(
                    code = "inet::unknown_id",
                    help = "ids are only meaningful in the net that allocated them",
                    "{}",
                    message
                )
            }
            Self::DoubleConnect(_) | Self::SelfLoop(_) => miette::miette!(
                code = "inet::connect",
                help = "disconnect the port first, every port takes part in at most one connection",
                "{}",
                message
            ),
            Self::ArityMismatch { .. } | Self::NoPrincipal(_) | Self::FreeWire(_) => {
                miette::miette!(
                    code = "inet::rule",
                    help = "every auxiliary port of the pattern must be spliced exactly once",
                    "{}",
                    message
                )
            }
            Self::AmbiguousRule(_) => miette::miette!(
                code = "inet::ambiguous_rule",
                help = "a rule set may contain at most one rule per pair of symbols",
                "{}",
                message
            ),
            Self::InterfaceSizeMismatch { .. } => miette::miette!(
                code = "inet::interface",
                help = "both nets must expose the same number of free ports",
                "{}",
                message
            ),
            Self::NotActive(_) => miette::miette!(code = "inet::not_active", "{}", message),
            Self::Aborted { .. } => miette::miette!(
                code = "inet::aborted",
                help = "the rewrites made before the failure are kept",
                "{}",
                message
            ),
            Self::NoApplicableRule(_) | Self::Stuck { .. } => miette::miette!(
                code = "inet::stuck",
                help = "add a rule for this pair of symbols to the rule set",
                "{}",
                message
            ),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// A broken structural invariant, as reported by [`verify`](super::verify::verify).
pub enum Violation {
    MultiplePrincipal { agent: AgentId, count: usize },
    PrincipalNotFirst { agent: AgentId },
    WrongPortCount { agent: AgentId, expected: usize, found: usize },
    ForeignPort { agent: AgentId, port: PortId },
    LinkMismatch { port: PortId },
    DanglingConnection { connection: ConnectionId },
    ConnectedOnInterface { port: PortId },
    UnknownInterfacePort { port: PortId },
}

impl Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MultiplePrincipal { agent, count } => {
                write!(f, "agent {agent:?} has {count} principal ports")
            }
            Self::PrincipalNotFirst { agent } => {
                write!(f, "agent {agent:?} does not have its principal port first")
            }
            Self::WrongPortCount {
                agent,
                expected,
                found,
            } => write!(f, "agent {agent:?} has {found} port(s), its symbol has arity {expected}"),
            Self::ForeignPort { agent, port } => {
                write!(f, "agent {agent:?} lists port {port:?}, which it does not own")
            }
            Self::LinkMismatch { port } => {
                write!(f, "port {port:?} disagrees with the connection table")
            }
            Self::DanglingConnection { connection } => {
                write!(f, "connection {connection:?} points at a missing port")
            }
            Self::ConnectedOnInterface { port } => {
                write!(f, "port {port:?} is on the interface but connected")
            }
            Self::UnknownInterfacePort { port } => {
                write!(f, "port {port:?} is on the interface but not in the net")
            }
        }
    }
}
