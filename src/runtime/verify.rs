//! Structural law checks over nets and rule sets.

use std::collections::HashMap;

use super::canonical::Shape;
use super::error::Violation;
use super::net::Net;
use super::rules::{AuxPort, Rule, RuleKey, RuleSet, Splice};

pub use super::reducer::is_normal_form;

/// Check every structural invariant of `net` and report all the violations found.
///
/// Unconnected ports that are not on the interface are not a violation: they are ports that
/// were hidden with [`Net::restrict_interface`].
pub fn verify(net: &Net) -> Result<(), Vec<Violation>> {
    let mut violations = Vec::new();

    for agent in net.get_agents() {
        let id = agent.id();
        let arity = agent.symbol().arity();
        if agent.ports().len() != arity {
            violations.push(Violation::WrongPortCount {
                agent: id,
                expected: arity,
                found: agent.ports().len(),
            });
        }

        let mut principal = Vec::new();
        for &port in agent.ports() {
            match net.port(port) {
                Some(data) if data.agent() == id => {
                    if data.is_principal() {
                        principal.push(data.position());
                    }
                }
                _ => violations.push(Violation::ForeignPort { agent: id, port }),
            }
        }
        match principal.as_slice() {
            [] if arity == 0 => {}
            [0] => {}
            [_] | [] => violations.push(Violation::PrincipalNotFirst { agent: id }),
            many => violations.push(Violation::MultiplePrincipal {
                agent: id,
                count: many.len(),
            }),
        }
    }

    for port in net.all_ports() {
        let Some(connection) = port.connection() else {
            continue;
        };
        let listed = net
            .connection(connection)
            .is_some_and(|data| data.ports().contains(&port.id()));
        if !listed {
            violations.push(Violation::LinkMismatch { port: port.id() });
        }
    }

    for connection in net.connections() {
        for (port, agent) in connection.ports().into_iter().zip(connection.agents()) {
            match net.port(port) {
                None => violations.push(Violation::DanglingConnection {
                    connection: connection.id(),
                }),
                Some(data) if data.connection() != Some(connection.id()) || data.agent() != agent => {
                    violations.push(Violation::LinkMismatch { port })
                }
                Some(_) => {}
            }
        }
    }

    for &port in net.interface() {
        match net.port(port) {
            None => violations.push(Violation::UnknownInterfacePort { port }),
            Some(data) if data.is_connected() => {
                violations.push(Violation::ConnectedOnInterface { port })
            }
            Some(_) => {}
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        tracing::debug!(count = violations.len(), "net failed verification");
        Err(violations)
    }
}

/// Check that no unordered pair of symbols is claimed by two rules. Returns each key that is
/// claimed more than once, in order of first appearance.
pub fn verify_deterministic<'a>(rules: impl IntoIterator<Item = &'a Rule>) -> Result<(), Vec<RuleKey>> {
    let mut claims: HashMap<RuleKey, usize> = HashMap::new();
    let mut duplicates = Vec::new();
    for rule in rules {
        let count = claims.entry(rule.key().clone()).or_insert(0);
        *count += 1;
        if *count == 2 {
            duplicates.push(rule.key().clone());
        }
    }
    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(duplicates)
    }
}

/// Check the conditions under which reduction with `rules` is confluent.
///
/// Every agent has at most one principal port, so two distinct active pairs never share an
/// agent and rewriting one never destroys another. What remains is that the result of a
/// rewrite must not depend on anything but the redex: a rule set holds at most one rule per
/// pair (guaranteed by [`RuleSet`] itself), and a rule between two agents of the same symbol
/// must not care which of them plays the left side. The keys of the rules failing the latter
/// are returned.
pub fn verify_confluence(rules: &RuleSet) -> Result<(), Vec<RuleKey>> {
    verify_deterministic(rules.rules().map(|rule| &**rule))?;
    let asymmetric: Vec<RuleKey> = rules
        .rules()
        .filter(|rule| rule.is_self_interaction() && !is_symmetric(rule))
        .map(|rule| rule.key().clone())
        .collect();
    if asymmetric.is_empty() {
        Ok(())
    } else {
        Err(asymmetric)
    }
}

/// Whether swapping the two sides of a self-interaction rule gives the same right-hand side.
pub fn is_symmetric(rule: &Rule) -> bool {
    let replacement = rule.replacement();
    let mirrored = |slot: AuxPort| match replacement.splice(slot.flip()) {
        Some(Splice::Wire(target)) => Some(Splice::Wire(target.flip())),
        other => other,
    };

    let mut ports = Vec::new();
    let mut mirrored_ports = Vec::new();
    for slot in rule.slots() {
        match (replacement.splice(slot), mirrored(slot)) {
            (Some(Splice::Wire(a)), Some(Splice::Wire(b))) if a == b => {}
            (Some(Splice::Port(a)), Some(Splice::Port(b))) => {
                ports.push(a);
                mirrored_ports.push(b);
            }
            _ => return false,
        }
    }
    Shape::with_boundary(replacement.net(), &ports)
        == Shape::with_boundary(replacement.net(), &mirrored_ports)
}
