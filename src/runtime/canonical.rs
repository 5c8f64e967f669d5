//! Canonical shapes of nets, for comparing nets up to the choice of ids.
//!
//! Agents reachable from the interface are numbered by a breadth-first walk that starts at
//! the interface, in interface order, and visits ports in port order. Since ports are ordered
//! this numbering is forced, so the code it produces is canonical. Components not reachable
//! from the interface have no such anchor: each one is encoded from every possible starting
//! agent and the least code is kept, then the components are sorted.

use std::collections::{HashMap, HashSet, VecDeque};

use super::net::{AgentId, Net, PortId};
use super::symbol::Str;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Token {
    /// An interface entry: which agent, and which of its ports.
    Boundary(usize, usize),
    Agent(Str, usize),
    Peer(usize, usize),
    Free(usize),
    Hidden,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Shape {
    anchored: Vec<Token>,
    closed: Vec<Vec<Token>>,
}

impl Shape {
    pub fn of(net: &Net) -> Self {
        let boundary: Vec<PortId> = net.interface().iter().copied().collect();
        Self::with_boundary(net, &boundary)
    }

    /// The shape of `net` as if `boundary` were its interface, in that order.
    pub fn with_boundary(net: &Net, boundary: &[PortId]) -> Self {
        let positions: HashMap<PortId, usize> = boundary
            .iter()
            .enumerate()
            .map(|(index, &port)| (port, index))
            .collect();

        let mut walk = Walk::new(net, &positions);
        let mut anchored = Vec::with_capacity(boundary.len());
        for &port in boundary {
            anchored.push(match net.port(port) {
                Some(data) => Token::Boundary(walk.number(data.agent()), data.position()),
                None => Token::Hidden,
            });
        }
        anchored.extend(walk.run());
        let mut seen: HashSet<AgentId> = walk.numbers.into_keys().collect();

        let mut closed = Vec::new();
        for agent in net.get_agents() {
            if seen.contains(&agent.id()) {
                continue;
            }
            let component = component_of(net, agent.id());
            let code = component
                .iter()
                .map(|&start| {
                    let mut walk = Walk::new(net, &positions);
                    walk.number(start);
                    walk.run()
                })
                .min()
                .unwrap_or_default();
            seen.extend(component);
            closed.push(code);
        }
        closed.sort();

        Self { anchored, closed }
    }

    /// Number of components not connected to the interface.
    pub fn closed_components(&self) -> usize {
        self.closed.len()
    }
}

/// Whether two nets are the same up to renaming of ids.
pub fn isomorphic(a: &Net, b: &Net) -> bool {
    a.agent_count() == b.agent_count()
        && a.connection_count() == b.connection_count()
        && Shape::of(a) == Shape::of(b)
}

struct Walk<'a> {
    net: &'a Net,
    positions: &'a HashMap<PortId, usize>,
    numbers: HashMap<AgentId, usize>,
    queue: VecDeque<AgentId>,
}

impl<'a> Walk<'a> {
    fn new(net: &'a Net, positions: &'a HashMap<PortId, usize>) -> Self {
        Self {
            net,
            positions,
            numbers: HashMap::new(),
            queue: VecDeque::new(),
        }
    }

    fn number(&mut self, agent: AgentId) -> usize {
        let next = self.numbers.len();
        *self.numbers.entry(agent).or_insert_with(|| {
            self.queue.push_back(agent);
            next
        })
    }

    fn run(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        while let Some(agent) = self.queue.pop_front() {
            let Some(data) = self.net.agent(agent) else {
                continue;
            };
            tokens.push(Token::Agent(data.symbol().shared_name(), data.ports().len()));
            for &port in data.ports() {
                let token = match self.net.peer(port).and_then(|peer| self.net.port(peer)) {
                    Some(peer) => Token::Peer(self.number(peer.agent()), peer.position()),
                    None => match self.positions.get(&port) {
                        Some(&index) => Token::Free(index),
                        None => Token::Hidden,
                    },
                };
                tokens.push(token);
            }
        }
        tokens
    }
}

fn component_of(net: &Net, start: AgentId) -> Vec<AgentId> {
    let mut seen = HashSet::from([start]);
    let mut order = vec![start];
    let mut next = 0;
    while let Some(&agent) = order.get(next) {
        next += 1;
        for &port in net.get_ports(agent).unwrap_or(&[]) {
            let Some(peer) = net.peer(port).and_then(|peer| net.port(peer)) else {
                continue;
            };
            if seen.insert(peer.agent()) {
                order.push(peer.agent());
            }
        }
    }
    order
}
