//! Finding redexes and rewriting them.
//!
//! A rewrite happens in three steps. [`RedexView::read`] collects the redex's neighbourhood:
//! for every auxiliary port of the two agents, what it is connected to outside the redex.
//! [`Plan::new`] combines that with the rule's splice map into a list of links to make; it
//! is a pure function and touches no net. [`Plan::commit`] is the only step that mutates.
//! Everything that can fail is checked before the commit, so a rewrite either happens
//! completely or not at all.

use std::collections::{HashMap, HashSet};
use std::fmt::{self, Display};
use std::time::{Duration, Instant};

use indexmap::IndexSet;
use serde::Serialize;

use super::error::NetError;
use super::net::{AgentId, ConnectionId, Net, PortId};
use super::rules::{AuxPort, Rule, RuleKey, RuleSet, Splice};
use super::symbol::Symbol;

#[derive(Clone, Debug, PartialEq, Eq)]
/// Two agents whose principal ports are connected to each other.
pub struct ActivePair {
    pub connection: ConnectionId,
    pub agent1: AgentId,
    pub agent2: AgentId,
    pub port1: PortId,
    pub port2: PortId,
    pub symbol1: Symbol,
    pub symbol2: Symbol,
}

impl ActivePair {
    pub fn agents(&self) -> [AgentId; 2] {
        [self.agent1, self.agent2]
    }

    /// Independent pairs share no agent and can be rewritten in either order.
    pub fn is_independent_of(&self, other: &ActivePair) -> bool {
        self.agents()
            .iter()
            .all(|agent| !other.agents().contains(agent))
    }
}

impl Display for ActivePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:?} >< {}{:?}",
            self.symbol1.name(),
            self.agent1,
            self.symbol2.name(),
            self.agent2
        )
    }
}

/// Active pairs in connection order.
pub fn active_pairs(net: &Net) -> impl Iterator<Item = ActivePair> + '_ {
    net.connections().filter_map(|connection| {
        let [port1, port2] = connection.ports();
        let [agent1, agent2] = connection.agents();
        let principal = |port| net.port(port).is_some_and(|p| p.is_principal());
        if !principal(port1) || !principal(port2) {
            return None;
        }
        Some(ActivePair {
            connection: connection.id(),
            agent1,
            agent2,
            port1,
            port2,
            symbol1: net.agent(agent1)?.symbol().clone(),
            symbol2: net.agent(agent2)?.symbol().clone(),
        })
    })
}

pub fn find_active_pairs(net: &Net) -> Vec<ActivePair> {
    active_pairs(net).collect()
}

pub fn is_normal_form(net: &Net) -> bool {
    active_pairs(net).next().is_none()
}

pub fn match_rule(rule: &Rule, pair: &ActivePair) -> bool {
    rule.orient(&pair.symbol1, &pair.symbol2).is_some()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// What an auxiliary port of a redex is attached to outside the redex.
pub(crate) enum Outside {
    /// Connected to a port that survives the rewrite.
    Peer(PortId),
    /// Unconnected and on the interface; the port itself is recorded so that whatever
    /// replaces it can take its place there.
    Free(PortId),
    /// Unconnected and hidden.
    Hidden,
    /// Connected to another auxiliary port of the same redex.
    Slot(AuxPort),
}

impl Outside {
    fn end(self) -> Option<End> {
        match self {
            Self::Peer(port) => Some(End::Host(port)),
            Self::Free(port) => Some(End::Free(port)),
            Self::Hidden => Some(End::Hidden),
            Self::Slot(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct RedexView {
    pub(crate) pair: ActivePair,
    slots: Vec<(AuxPort, Outside)>,
}

impl RedexView {
    pub(crate) fn read(net: &Net, pair: &ActivePair, rule: &Rule) -> Result<Self, NetError> {
        let connection = net
            .connection(pair.connection)
            .ok_or(NetError::NotActive(pair.connection))?;
        if connection.ports() != [pair.port1, pair.port2]
            || connection.agents() != [pair.agent1, pair.agent2]
        {
            return Err(NetError::NotActive(pair.connection));
        }

        let agent1 = net
            .agent(pair.agent1)
            .ok_or(NetError::UnknownAgent(pair.agent1))?;
        let agent2 = net
            .agent(pair.agent2)
            .ok_or(NetError::UnknownAgent(pair.agent2))?;
        if agent1.principal() != Some(pair.port1) || agent2.principal() != Some(pair.port2) {
            return Err(NetError::NotActive(pair.connection));
        }
        let sides = rule
            .orient(agent1.symbol(), agent2.symbol())
            .ok_or_else(|| NetError::NoApplicableRule(pair.clone()))?;

        let side_of = |agent: AgentId| {
            if agent == pair.agent1 {
                Some(sides[0])
            } else if agent == pair.agent2 {
                Some(sides[1])
            } else {
                None
            }
        };

        let mut slots = Vec::new();
        for (agent, side) in [(agent1, sides[0]), (agent2, sides[1])] {
            for (index, &port) in agent.auxiliary().iter().enumerate() {
                let outside = match net.peer(port).and_then(|peer| net.port(peer)) {
                    Some(peer) => match side_of(peer.agent()) {
                        Some(peer_side) => Outside::Slot(AuxPort {
                            side: peer_side,
                            index: peer.position().saturating_sub(1),
                        }),
                        None => Outside::Peer(peer.id()),
                    },
                    None if net.interface().contains(&port) => Outside::Free(port),
                    None => Outside::Hidden,
                };
                slots.push((AuxPort { side, index }, outside));
            }
        }
        Ok(Self {
            pair: pair.clone(),
            slots,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum End {
    Host(PortId),
    /// A port of the replacement net, before it is instantiated.
    Local(PortId),
    Free(PortId),
    Hidden,
}

#[derive(Clone, Debug)]
pub(crate) struct Plan {
    pub(crate) view: RedexView,
    links: Vec<(End, End)>,
    planning: Duration,
}

impl Plan {
    /// Follow every path through the redex: from an outside end, across the slot, along the
    /// rule's splice, possibly through wires and other slots, until another end is reached.
    /// Paths that never reach an end are closed loops and disappear.
    pub(crate) fn new(view: RedexView, rule: &Rule) -> Result<Self, NetError> {
        let start = Instant::now();
        let outside: HashMap<AuxPort, Outside> = view.slots.iter().copied().collect();
        let inside = |slot: AuxPort| {
            rule.replacement()
                .splice(slot)
                .ok_or_else(|| NetError::ArityMismatch {
                    key: rule.key().clone(),
                    expected: rule.slots().count(),
                    found: view.slots.len(),
                })
        };
        let across = |slot: AuxPort| {
            outside.get(&slot).copied().ok_or_else(|| NetError::ArityMismatch {
                key: rule.key().clone(),
                expected: rule.slots().count(),
                found: view.slots.len(),
            })
        };

        let mut visited = HashSet::new();
        let mut links = Vec::new();

        // Paths that start outside the redex.
        for &(slot, out) in &view.slots {
            let Some(start) = out.end() else { continue };
            if visited.contains(&slot) {
                continue;
            }
            let mut slot = slot;
            let end = loop {
                visited.insert(slot);
                match inside(slot)? {
                    Splice::Port(port) => break End::Local(port),
                    Splice::Wire(next) => {
                        visited.insert(next);
                        match across(next)? {
                            Outside::Slot(further) => slot = further,
                            terminal => break terminal.end().unwrap_or(End::Hidden),
                        }
                    }
                }
            };
            links.push((start, end));
        }

        // Paths that start at a replacement port and only pass through the redex.
        for &(slot, _) in &view.slots {
            if visited.contains(&slot) {
                continue;
            }
            let Splice::Port(start) = inside(slot)? else {
                continue;
            };
            let mut slot = slot;
            let end = loop {
                visited.insert(slot);
                match across(slot)? {
                    Outside::Slot(next) => {
                        visited.insert(next);
                        match inside(next)? {
                            Splice::Port(port) => break End::Local(port),
                            Splice::Wire(further) => slot = further,
                        }
                    }
                    terminal => break terminal.end().unwrap_or(End::Hidden),
                }
            };
            links.push((End::Local(start), end));
        }

        if links
            .iter()
            .any(|link| matches!(link, (End::Free(_), End::Free(_))))
        {
            return Err(NetError::FreeWire(rule.key().clone()));
        }
        Ok(Self {
            view,
            links,
            planning: start.elapsed(),
        })
    }

    /// Whether the redex's neighbourhood in `net` is still what this plan was made from.
    pub(crate) fn is_fresh(&self, net: &Net, rule: &Rule) -> bool {
        RedexView::read(net, &self.view.pair, rule).is_ok_and(|view| view == self.view)
    }

    /// Carry out the plan. It must be fresh.
    pub(crate) fn commit(&self, net: &mut Net, rule: &Rule) {
        let start = Instant::now();
        let pair = &self.view.pair;
        let consumed: Vec<PortId> = pair
            .agents()
            .iter()
            .filter_map(|&agent| net.get_auxiliary(agent).ok())
            .flat_map(|ports| ports.iter().copied())
            .collect();

        net.unlink(pair.connection);
        for &port in &consumed {
            if let Some(connection) = net.port(port).and_then(|p| p.connection()) {
                net.unlink(connection);
            }
        }

        let local = net.inject(rule.replacement().net().clone(), false);
        let resolve = |end: End| match end {
            End::Host(port) => Some(port),
            End::Local(port) => local.get(&port).copied(),
            End::Free(_) | End::Hidden => None,
        };

        let mut substitutes: HashMap<PortId, Option<PortId>> = HashMap::new();
        for &link in &self.links {
            match link {
                (End::Free(slot), other) | (other, End::Free(slot)) => {
                    substitutes.insert(slot, resolve(other));
                }
                (a, b) => {
                    if let (Some(a), Some(b)) = (resolve(a), resolve(b)) {
                        net.link(a, b);
                    }
                }
            }
        }

        if !substitutes.is_empty() {
            let interface: IndexSet<PortId> = net
                .interface()
                .iter()
                .filter_map(|port| match substitutes.get(port) {
                    Some(substitute) => *substitute,
                    None => Some(*port),
                })
                .collect();
            net.replace_interface(interface);
        }

        for agent in pair.agents() {
            net.drop_agent(agent);
        }
        net.rewrites
            .record(rule.label(), self.planning + start.elapsed());
    }
}

/// Rewrite one active pair with `rule`.
pub fn apply_rule(net: &mut Net, pair: &ActivePair, rule: &Rule) -> Result<(), NetError> {
    if !match_rule(rule, pair) {
        return Err(NetError::NoApplicableRule(pair.clone()));
    }
    let view = RedexView::read(net, pair, rule)?;
    let plan = Plan::new(view, rule)?;
    plan.commit(net, rule);
    Ok(())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reduction {
    pub changed: bool,
    pub active_pair: Option<ActivePair>,
    pub rule: Option<RuleKey>,
}

impl Reduction {
    fn idle() -> Self {
        Self {
            changed: false,
            active_pair: None,
            rule: None,
        }
    }
}

/// Rewrite the first active pair, in connection order. A net in normal form is left as is.
pub fn reduce_once(net: &mut Net, rules: &RuleSet) -> Result<Reduction, NetError> {
    let Some(pair) = active_pairs(net).next() else {
        return Ok(Reduction::idle());
    };
    let rule = rules
        .lookup(&pair.symbol1, &pair.symbol2)
        .ok_or_else(|| NetError::NoApplicableRule(pair.clone()))?;
    apply_rule(net, &pair, rule)?;
    tracing::trace!(pair = %pair, rule = %rule.key(), "rewrite");
    Ok(Reduction {
        changed: true,
        active_pair: Some(pair),
        rule: Some(rule.key().clone()),
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Outcome {
    /// No active pairs remain.
    NormalForm,
    /// The step budget ran out with active pairs remaining.
    Diverging,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Normalized {
    pub outcome: Outcome,
    pub steps: usize,
}

/// Reduce to normal form. Does not return if the net has none.
///
/// A pair with no rule is reported as [`NetError::Stuck`]; any other failure comes wrapped in
/// [`NetError::Aborted`] with the number of rewrites already made.
pub fn reduce(net: &mut Net, rules: &RuleSet) -> Result<Normalized, NetError> {
    drive(net, rules, None)
}

/// Reduce for at most `max_steps` rewrites.
pub fn normalize(net: &mut Net, rules: &RuleSet, max_steps: usize) -> Result<Normalized, NetError> {
    drive(net, rules, Some(max_steps))
}

fn drive(net: &mut Net, rules: &RuleSet, budget: Option<usize>) -> Result<Normalized, NetError> {
    let start = Instant::now();
    let mut steps = 0;
    let result = loop {
        if budget.is_some_and(|max| steps >= max) {
            let outcome = if is_normal_form(net) {
                Outcome::NormalForm
            } else {
                Outcome::Diverging
            };
            break Ok(Normalized { outcome, steps });
        }
        match reduce_once(net, rules) {
            Ok(reduction) if reduction.changed => steps += 1,
            Ok(_) => {
                break Ok(Normalized {
                    outcome: Outcome::NormalForm,
                    steps,
                })
            }
            Err(NetError::NoApplicableRule(pair)) => break Err(NetError::Stuck { pair, steps }),
            Err(error) => {
                break Err(NetError::Aborted {
                    steps,
                    cause: Box::new(error),
                })
            }
        }
    };
    net.rewrites.busy_duration += start.elapsed();

    match &result {
        Ok(Normalized {
            outcome: Outcome::Diverging,
            steps,
        }) => tracing::warn!(steps, "step budget exhausted before normal form"),
        Ok(Normalized { steps, .. }) => tracing::debug!(steps, "reached normal form"),
        Err(error) => tracing::debug!(%error, "reduction failed"),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::rules::ReplacementNet;

    fn x() -> Symbol {
        Symbol::new("X", 1)
    }

    fn x_pair() -> Net {
        let mut net = Net::new(x());
        net.inject(Net::new(x()), true);
        let ports: Vec<PortId> = net.interface().iter().copied().collect();
        net.connect(ports[0], ports[1]).unwrap();
        net
    }

    fn annihilation() -> RuleSet {
        RuleSet::new([Rule::new(x(), x(), ReplacementNet::empty()).unwrap()]).unwrap()
    }

    /// `F` has one auxiliary port, `K` has none. `F ~ K` erases `F` and passes `K` on:
    /// the auxiliary port of `F` gets connected to a fresh `K`.
    fn passing() -> (Symbol, Symbol, RuleSet) {
        let f = Symbol::new("F", 2);
        let k = Symbol::new("K", 1);
        let mut rhs = Net::empty();
        let fresh = rhs.new_agent(k.clone());
        let port = rhs.get_ports(fresh).unwrap()[0];
        let rule = Rule::new(
            f.clone(),
            k.clone(),
            ReplacementNet::new(rhs).bind(AuxPort::left(0), port),
        )
        .unwrap();
        (f, k, RuleSet::new([rule]).unwrap())
    }

    #[test]
    fn test_find_active_pairs() {
        let net = x_pair();
        let pairs = find_active_pairs(&net);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].symbol1, x());
        assert!(!is_normal_form(&net));
        assert!(is_normal_form(&Net::new(x())));
    }

    #[test]
    fn test_auxiliary_connections_are_not_active() {
        let mut net = Net::empty();
        let f = net.new_agent(Symbol::new("F", 2));
        let g = net.new_agent(Symbol::new("F", 2));
        let f_aux = net.get_auxiliary(f).unwrap()[0];
        let g_principal = net.get_principal(g).unwrap().unwrap();
        net.connect(f_aux, g_principal).unwrap();
        assert!(find_active_pairs(&net).is_empty());
    }

    #[test]
    fn test_annihilation_yields_empty_net() {
        let mut net = x_pair();
        let reduction = reduce_once(&mut net, &annihilation()).unwrap();
        assert!(reduction.changed);
        assert_eq!(reduction.rule, Some(RuleKey::new(&x(), &x())));
        assert_eq!(net.agent_count(), 0);
        assert_eq!(net.connection_count(), 0);
        assert!(net.interface().is_empty());
        assert_eq!(net.rewrites.total(), 1);
    }

    #[test]
    fn test_idle_step_leaves_net_untouched() {
        let mut net = Net::new(x());
        let before = net.clone();
        let reduction = reduce_once(&mut net, &annihilation()).unwrap();
        assert!(!reduction.changed);
        assert_eq!(reduction.active_pair, None);
        assert_eq!(net, before);
    }

    #[test]
    fn test_stuck_pair_is_reported_and_net_untouched() {
        let mut net = x_pair();
        let before = net.clone();
        let error = reduce_once(&mut net, &RuleSet::default()).unwrap_err();
        assert!(matches!(error, NetError::NoApplicableRule(_)));
        assert_eq!(net, before);

        let error = normalize(&mut net, &RuleSet::default(), 10).unwrap_err();
        assert!(matches!(error, NetError::Stuck { steps: 0, .. }));
    }

    #[test]
    fn test_apply_rule_checks_the_pattern() {
        let (f, k, rules) = passing();
        let mut net = x_pair();
        let pair = find_active_pairs(&net).remove(0);
        let rule = rules.lookup(&f, &k).unwrap();
        let before = net.clone();
        assert_eq!(
            apply_rule(&mut net, &pair, rule),
            Err(NetError::NoApplicableRule(pair))
        );
        assert_eq!(net, before);
    }

    #[test]
    fn test_splice_reconnects_outside_peer() {
        let (f, k, rules) = passing();
        let mut net = Net::empty();
        let fa = net.new_agent(f.clone());
        let ka = net.new_agent(k.clone());
        let sink = net.new_agent(Symbol::new("S", 2));
        let [f0, f1] = [0, 1].map(|i| net.get_ports(fa).unwrap()[i]);
        let k0 = net.get_ports(ka).unwrap()[0];
        let s1 = net.get_ports(sink).unwrap()[1];
        net.connect(f0, k0).unwrap();
        net.connect(f1, s1).unwrap();

        reduce_once(&mut net, &rules).unwrap();
        assert_eq!(net.agent_count(), 2);
        assert_eq!(net.connection_count(), 1);
        let peer = net.peer(s1).unwrap();
        let peer_agent = net.agent(net.port(peer).unwrap().agent()).unwrap();
        assert_eq!(peer_agent.symbol(), &k);
        assert!(peer_agent.principal() == Some(peer));
        // the sink's principal port is still the only free port
        assert_eq!(net.interface().len(), 1);
    }

    #[test]
    fn test_free_auxiliary_port_is_replaced_in_place() {
        let (f, k, rules) = passing();
        let mut net = Net::new(Symbol::new("A", 1));
        let fa = net.new_agent(f);
        let tail = net.new_agent(Symbol::new("B", 1));
        let ka = net.new_agent(k.clone());
        let f0 = net.get_principal(fa).unwrap().unwrap();
        let k0 = net.get_principal(ka).unwrap().unwrap();
        net.connect(f0, k0).unwrap();
        let a0 = net.get_ports(net.get_agents().next().unwrap().id()).unwrap()[0];
        let b0 = net.get_principal(tail).unwrap().unwrap();

        reduce_once(&mut net, &rules).unwrap();
        let interface: Vec<PortId> = net.interface().iter().copied().collect();
        assert_eq!(interface.len(), 3);
        assert_eq!(interface[0], a0);
        assert_eq!(interface[2], b0);
        let middle = net.port(interface[1]).unwrap();
        assert_eq!(net.agent(middle.agent()).unwrap().symbol(), &k);
    }

    #[test]
    fn test_wires_join_outside_peers() {
        // I(p, a) ~ I(p, b) connects a to b directly.
        let i = Symbol::new("I", 2);
        let rule = Rule::new(
            i.clone(),
            i.clone(),
            ReplacementNet::empty().wire(AuxPort::left(0), AuxPort::right(0)),
        )
        .unwrap();
        let rules = RuleSet::new([rule]).unwrap();

        let mut net = Net::empty();
        let left = net.new_agent(i.clone());
        let right = net.new_agent(i);
        let end_a = net.new_agent(Symbol::new("A", 2));
        let end_b = net.new_agent(Symbol::new("B", 2));
        let [l0, l1] = [0, 1].map(|n| net.get_ports(left).unwrap()[n]);
        let [r0, r1] = [0, 1].map(|n| net.get_ports(right).unwrap()[n]);
        let a1 = net.get_auxiliary(end_a).unwrap()[0];
        let b1 = net.get_auxiliary(end_b).unwrap()[0];
        net.connect(l0, r0).unwrap();
        net.connect(l1, a1).unwrap();
        net.connect(r1, b1).unwrap();

        let normalized = reduce(&mut net, &rules).unwrap();
        assert_eq!(normalized.steps, 1);
        assert_eq!(net.agent_count(), 2);
        assert_eq!(net.connection_count(), 1);
        assert_eq!(net.peer(a1), Some(b1));
        assert!(is_normal_form(&net));
    }

    #[test]
    fn test_wire_between_two_free_ports_is_rejected() {
        let i = Symbol::new("I", 2);
        let rule = Rule::new(
            i.clone(),
            i.clone(),
            ReplacementNet::empty().wire(AuxPort::left(0), AuxPort::right(0)),
        )
        .unwrap();
        let mut net = Net::new(i.clone());
        net.inject(Net::new(i), true);
        let ports: Vec<PortId> = net.interface().iter().copied().collect();
        net.connect(ports[0], ports[2]).unwrap();
        let before = net.clone();

        let pair = find_active_pairs(&net).remove(0);
        assert_eq!(
            apply_rule(&mut net, &pair, &rule),
            Err(NetError::FreeWire(rule.key().clone()))
        );
        assert_eq!(net, before);
    }

    #[test]
    fn test_failure_after_some_steps_reports_them() {
        // I ~ I, I ~ I joined in a chain: the first rewrite leaves the second with both
        // auxiliary ports on the interface
        let i = Symbol::new("I", 2);
        let rule = Rule::new(
            i.clone(),
            i.clone(),
            ReplacementNet::empty().wire(AuxPort::left(0), AuxPort::right(0)),
        )
        .unwrap();
        let rules = RuleSet::new([rule]).unwrap();
        let mut net = Net::empty();
        let agents: Vec<AgentId> = (0..4).map(|_| net.new_agent(i.clone())).collect();
        let port = |net: &Net, agent: usize, position: usize| net.port_at(agents[agent], position).unwrap();
        net.connect(port(&net, 0, 0), port(&net, 1, 0)).unwrap();
        net.connect(port(&net, 2, 0), port(&net, 3, 0)).unwrap();
        net.connect(port(&net, 1, 1), port(&net, 2, 1)).unwrap();

        assert_eq!(
            reduce(&mut net, &rules),
            Err(NetError::Aborted {
                steps: 1,
                cause: Box::new(NetError::FreeWire(RuleKey::new(&i, &i))),
            })
        );
        assert_eq!(net.rewrites.total(), 1);
        assert_eq!(net.agent_count(), 2);
    }

    #[test]
    fn test_loops_between_the_two_agents_vanish() {
        // the auxiliary ports of the pair are connected to each other; a wire rule closes a loop
        let i = Symbol::new("I", 2);
        let rule = Rule::new(
            i.clone(),
            i.clone(),
            ReplacementNet::empty().wire(AuxPort::left(0), AuxPort::right(0)),
        )
        .unwrap();
        let mut net = Net::new(i.clone());
        net.inject(Net::new(i), true);
        let ports: Vec<PortId> = net.interface().iter().copied().collect();
        net.connect(ports[0], ports[2]).unwrap();
        net.connect(ports[1], ports[3]).unwrap();

        let pair = find_active_pairs(&net).remove(0);
        apply_rule(&mut net, &pair, &rule).unwrap();
        assert_eq!(net, Net::empty());
    }

    #[test]
    fn test_normalize_respects_budget() {
        // E(p, a) ~ E(p, b) replaces itself with a fresh pair: never terminates
        let e = Symbol::new("E", 2);
        let mut rhs = Net::new(e.clone());
        rhs.inject(Net::new(e.clone()), true);
        let ports: Vec<PortId> = rhs.interface().iter().copied().collect();
        rhs.connect(ports[0], ports[2]).unwrap();
        let rule = Rule::new(
            e.clone(),
            e.clone(),
            ReplacementNet::new(rhs)
                .bind(AuxPort::left(0), ports[1])
                .bind(AuxPort::right(0), ports[3]),
        )
        .unwrap();
        let rules = RuleSet::new([rule]).unwrap();

        let mut net = Net::new(e.clone());
        net.inject(Net::new(e), true);
        let ports: Vec<PortId> = net.interface().iter().copied().collect();
        net.connect(ports[0], ports[2]).unwrap();

        let normalized = normalize(&mut net, &rules, 25).unwrap();
        assert_eq!(
            normalized,
            Normalized {
                outcome: Outcome::Diverging,
                steps: 25,
            }
        );
        assert_eq!(net.agent_count(), 2);
        assert_eq!(net.interface().len(), 2);

        let normal = normalize(&mut Net::new(x()), &annihilation(), 0).unwrap();
        assert_eq!(normal.outcome, Outcome::NormalForm);
    }

    #[test]
    fn test_independence() {
        let mut net = x_pair();
        net.inject(x_pair(), true);
        let pairs = find_active_pairs(&net);
        assert_eq!(pairs.len(), 2);
        assert!(pairs[0].is_independent_of(&pairs[1]));
        assert!(!pairs[0].is_independent_of(&pairs[0]));
    }
}
