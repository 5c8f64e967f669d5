//! The net itself: agents, their ports, the connections between ports, and the interface.
//!
//! Everything is stored in arenas and refers to everything else by [`Index`]; there are no
//! pointers between agents and ports, only ids. Every mutator either succeeds completely or
//! returns an error having changed nothing.

use std::collections::HashMap;

use indexmap::IndexSet;

use super::arena::{Arena, Index};
use super::error::NetError;
use super::stats::Rewrites;
use super::symbol::Symbol;

pub type AgentId = Index<Agent>;
pub type PortId = Index<Port>;
pub type ConnectionId = Index<Connection>;

/// Maps the ports of an injected net to the ports they became in the host.
pub type PortMap = HashMap<PortId, PortId>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Port {
    id: PortId,
    agent: AgentId,
    position: usize,
    principal: bool,
    link: Option<ConnectionId>,
}

impl Port {
    pub fn id(&self) -> PortId {
        self.id
    }

    pub fn agent(&self) -> AgentId {
        self.agent
    }

    /// Position of the port on its agent. The principal port sits at position 0.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_principal(&self) -> bool {
        self.principal
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    pub fn connection(&self) -> Option<ConnectionId> {
        self.link
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Agent {
    id: AgentId,
    symbol: Symbol,
    ports: Vec<PortId>,
}

impl Agent {
    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn ports(&self) -> &[PortId] {
        &self.ports
    }

    pub fn principal(&self) -> Option<PortId> {
        self.ports.first().copied()
    }

    pub fn auxiliary(&self) -> &[PortId] {
        self.ports.get(1..).unwrap_or(&[])
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Where a port goes back to when its connection is removed.
enum Restore {
    /// Its position on the interface at the time it was connected.
    Interface(usize),
    /// It was hidden, and stays hidden.
    Hidden,
    /// The connection was made by a rewrite or an injection: the end of the interface.
    Unrecorded,
}

#[derive(Clone, Debug)]
/// An undirected edge between two ports.
///
/// `restore` remembers where each port sat before the connection was made,
/// so that disconnecting puts the interface back the way it was.
pub struct Connection {
    id: ConnectionId,
    ports: [PortId; 2],
    agents: [AgentId; 2],
    restore: [Restore; 2],
}

impl Connection {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn ports(&self) -> [PortId; 2] {
        self.ports
    }

    pub fn agents(&self) -> [AgentId; 2] {
        self.agents
    }

    /// The endpoint opposite to `port`, if `port` is one of the endpoints.
    pub fn other(&self, port: PortId) -> Option<PortId> {
        match self.ports {
            [a, b] if a == port => Some(b),
            [a, b] if b == port => Some(a),
            _ => None,
        }
    }
}

impl PartialEq for Connection {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.ports == other.ports && self.agents == other.agents
    }
}
impl Eq for Connection {}

#[derive(Clone, Debug, Default)]
/// A Net is a set of agents and the connections between their ports.
/// The ports that take part in no connection and are exposed to the outside form its interface,
/// which is what composition operators wire together.
pub struct Net {
    agents: Arena<Agent>,
    ports: Arena<Port>,
    connections: Arena<Connection>,
    free_ports: IndexSet<PortId>,
    pub rewrites: Rewrites,
}

pub fn empty_net() -> Net {
    Net::empty()
}

pub fn new_net(symbol: Symbol) -> Net {
    Net::new(symbol)
}

impl Net {
    pub fn empty() -> Self {
        Self::default()
    }

    /// A net made of a single agent, all of whose ports are free.
    pub fn new(symbol: Symbol) -> Self {
        let mut net = Self::empty();
        net.new_agent(symbol);
        net
    }

    /// Allocate an agent and its ports. The new ports are appended to the interface.
    pub fn new_agent(&mut self, symbol: Symbol) -> AgentId {
        let agent = self.alloc_agent(symbol);
        for port in self.agents.get(agent).map(|a| a.ports.clone()).unwrap_or_default() {
            self.free_ports.insert(port);
        }
        agent
    }

    fn alloc_agent(&mut self, symbol: Symbol) -> AgentId {
        let arity = symbol.arity();
        let agent = self.agents.alloc_with(|id| Agent {
            id,
            symbol,
            ports: Vec::with_capacity(arity),
        });
        let ports: Vec<PortId> = (0..arity)
            .map(|position| self.new_port(agent, position, position == 0))
            .collect();
        if let Some(data) = self.agents.get_mut(agent) {
            data.ports = ports;
        }
        agent
    }

    fn new_port(&mut self, agent: AgentId, position: usize, is_principal: bool) -> PortId {
        self.ports.alloc_with(|id| Port {
            id,
            agent,
            position,
            principal: is_principal,
            link: None,
        })
    }

    /// Join two unconnected ports. Both leave the interface.
    pub fn connect(&mut self, a: PortId, b: PortId) -> Result<ConnectionId, NetError> {
        let port_a = self.port(a).ok_or(NetError::UnknownPort(a))?;
        let port_b = self.port(b).ok_or(NetError::UnknownPort(b))?;
        if a == b {
            return Err(NetError::SelfLoop(a));
        }
        if port_a.is_connected() {
            return Err(NetError::DoubleConnect(a));
        }
        if port_b.is_connected() {
            return Err(NetError::DoubleConnect(b));
        }

        let restore = [a, b].map(|port| match self.free_ports.get_index_of(&port) {
            Some(position) => Restore::Interface(position),
            None => Restore::Hidden,
        });
        self.free_ports.shift_remove(&a);
        self.free_ports.shift_remove(&b);
        let connection = self.link(a, b);
        if let Some(data) = self.connections.get_mut(connection) {
            data.restore = restore;
        }
        Ok(connection)
    }

    /// Remove a connection. Both ports go back to where they were before they were connected:
    /// to their old interface positions, or out of sight if they were hidden. Ports joined by a
    /// rewrite have no such record and are appended to the interface.
    pub fn disconnect(&mut self, connection: ConnectionId) -> Result<[PortId; 2], NetError> {
        let data = self
            .unlink(connection)
            .ok_or(NetError::UnknownConnection(connection))?;

        let mut positioned: Vec<(usize, PortId)> = Vec::new();
        for (port, restore) in data.ports.into_iter().zip(data.restore) {
            match restore {
                Restore::Interface(position) => positioned.push((position, port)),
                Restore::Hidden => {}
                Restore::Unrecorded => {
                    self.free_ports.insert(port);
                }
            }
        }
        positioned.sort();
        for (position, port) in positioned {
            let position = position.min(self.free_ports.len());
            self.free_ports.shift_insert(position, port);
        }
        Ok(data.ports)
    }

    /// Connect two equally long lists of ports pairwise.
    pub fn connect_interface(
        &mut self,
        left: &[PortId],
        right: &[PortId],
    ) -> Result<Vec<ConnectionId>, NetError> {
        if left.len() != right.len() {
            return Err(NetError::InterfaceSizeMismatch {
                left: left.len(),
                right: right.len(),
            });
        }
        self.check_pairing(left.iter().copied().zip(right.iter().copied()))?;
        left.iter()
            .zip(right)
            .map(|(&a, &b)| self.connect(a, b))
            .collect()
    }

    /// Everything `connect` would reject for a batch of pairs, checked up front so that a batch
    /// either connects completely or not at all.
    pub(crate) fn check_pairing(
        &self,
        pairs: impl IntoIterator<Item = (PortId, PortId)>,
    ) -> Result<(), NetError> {
        let mut used = IndexSet::new();
        for (a, b) in pairs {
            for port in [a, b] {
                let data = self.port(port).ok_or(NetError::UnknownPort(port))?;
                if data.is_connected() || !used.insert(port) {
                    return Err(if a == b {
                        NetError::SelfLoop(port)
                    } else {
                        NetError::DoubleConnect(port)
                    });
                }
            }
        }
        Ok(())
    }

    pub fn interface(&self) -> &IndexSet<PortId> {
        &self.free_ports
    }

    /// Hide ports from the interface. They stay unconnected.
    pub fn restrict_interface(
        &mut self,
        ports: impl IntoIterator<Item = PortId>,
    ) -> Result<(), NetError> {
        let ports: Vec<PortId> = ports.into_iter().collect();
        if let Some(&port) = ports.iter().find(|p| !self.free_ports.contains(*p)) {
            return Err(NetError::UnknownPort(port));
        }
        for port in ports {
            self.free_ports.shift_remove(&port);
        }
        Ok(())
    }

    /// Expose unconnected ports on the interface, after the ports already there.
    pub fn extend_interface(
        &mut self,
        ports: impl IntoIterator<Item = PortId>,
    ) -> Result<(), NetError> {
        let ports: Vec<PortId> = ports.into_iter().collect();
        for &port in &ports {
            let data = self.port(port).ok_or(NetError::UnknownPort(port))?;
            if data.is_connected() {
                return Err(NetError::DoubleConnect(port));
            }
        }
        self.free_ports.extend(ports);
        Ok(())
    }

    /// Remove an agent together with every connection touching it.
    /// The ports it was connected to are released the way [`Net::disconnect`] releases them.
    pub fn remove_agent(&mut self, agent: AgentId) -> Result<Symbol, NetError> {
        let ports = self.get_ports(agent)?.to_vec();
        for &port in &ports {
            if let Some(connection) = self.port(port).and_then(Port::connection) {
                self.disconnect(connection)?;
            }
        }
        Ok(self.drop_agent(agent).map(|a| a.symbol).unwrap_or_else(|| {
            unreachable!("agent {agent:?} vanished while it was being removed")
        }))
    }

    /// Copy `other` into this net with fresh ids. When `expose` is set, the interface of
    /// `other` is appended to the interface of this net; otherwise its free ports are left
    /// unconnected and hidden, for the caller to wire up.
    pub fn inject(&mut self, other: Net, expose: bool) -> PortMap {
        let mut ports = PortMap::with_capacity(other.ports.len());
        for (_, agent) in other.agents.iter() {
            let fresh = self.alloc_agent(agent.symbol.clone());
            let fresh_ports = self.agents.get(fresh).map(|a| a.ports.as_slice()).unwrap_or(&[]);
            ports.extend(agent.ports.iter().copied().zip(fresh_ports.iter().copied()));
        }
        for (_, connection) in other.connections.iter() {
            let [a, b] = connection.ports;
            self.link(ports[&a], ports[&b]);
        }
        if expose {
            self.free_ports
                .extend(other.free_ports.iter().map(|port| ports[port]));
        }
        self.rewrites = core::mem::take(&mut self.rewrites) + other.rewrites;
        ports
    }

    /// Create a connection without any interface bookkeeping.
    /// Both ports must exist and be unconnected.
    pub(crate) fn link(&mut self, a: PortId, b: PortId) -> ConnectionId {
        let agents = [self.ports.get(a), self.ports.get(b)].map(|port| {
            port.map(Port::agent)
                .unwrap_or_else(|| unreachable!("linking a port that does not exist"))
        });
        let connection = self.connections.alloc_with(|id| Connection {
            id,
            ports: [a, b],
            agents,
            restore: [Restore::Unrecorded; 2],
        });
        for port in [a, b] {
            if let Some(port) = self.ports.get_mut(port) {
                port.link = Some(connection);
            }
        }
        connection
    }

    /// Remove a connection without any interface bookkeeping.
    pub(crate) fn unlink(&mut self, connection: ConnectionId) -> Option<Connection> {
        let data = self.connections.remove(connection)?;
        for port in data.ports {
            if let Some(port) = self.ports.get_mut(port) {
                port.link = None;
            }
        }
        Some(data)
    }

    /// Remove an agent and its ports. The caller is responsible for its connections
    /// and its interface entries.
    pub(crate) fn drop_agent(&mut self, agent: AgentId) -> Option<Agent> {
        let data = self.agents.remove(agent)?;
        for &port in &data.ports {
            self.ports.remove(port);
            self.free_ports.shift_remove(&port);
        }
        Some(data)
    }

    pub(crate) fn replace_interface(&mut self, free_ports: IndexSet<PortId>) {
        self.free_ports = free_ports;
    }

    pub fn agent(&self, agent: AgentId) -> Option<&Agent> {
        self.agents.get(agent)
    }

    pub fn port(&self, port: PortId) -> Option<&Port> {
        self.ports.get(port)
    }

    pub fn connection(&self, connection: ConnectionId) -> Option<&Connection> {
        self.connections.get(connection)
    }

    pub fn get_agents(&self) -> impl Iterator<Item = &Agent> + '_ {
        self.agents.iter().map(|(_, agent)| agent)
    }

    pub fn get_ports(&self, agent: AgentId) -> Result<&[PortId], NetError> {
        self.agent(agent)
            .map(Agent::ports)
            .ok_or(NetError::UnknownAgent(agent))
    }

    /// The port at `position` on `agent`. A position past the agent's arity is reported as
    /// [`NetError::UnknownAgent`] too, since no such agent port exists.
    pub fn port_at(&self, agent: AgentId, position: usize) -> Result<PortId, NetError> {
        self.get_ports(agent)?
            .get(position)
            .copied()
            .ok_or(NetError::UnknownAgent(agent))
    }

    pub fn get_principal(&self, agent: AgentId) -> Result<Option<PortId>, NetError> {
        self.agent(agent)
            .map(Agent::principal)
            .ok_or(NetError::UnknownAgent(agent))
    }

    pub fn get_auxiliary(&self, agent: AgentId) -> Result<&[PortId], NetError> {
        self.agent(agent)
            .map(Agent::auxiliary)
            .ok_or(NetError::UnknownAgent(agent))
    }

    pub fn connections(&self) -> impl Iterator<Item = &Connection> + '_ {
        self.connections.iter().map(|(_, connection)| connection)
    }

    pub fn all_ports(&self) -> impl Iterator<Item = &Port> + '_ {
        self.ports.iter().map(|(_, port)| port)
    }

    /// The port on the other end of `port`'s connection.
    pub fn peer(&self, port: PortId) -> Option<PortId> {
        let connection = self.port(port)?.connection()?;
        self.connection(connection)?.other(port)
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    pub fn port_count(&self) -> usize {
        self.ports.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

/// Structural equality: same live agents, ports and connections under the same ids, and the
/// same interface in the same order. Statistics are not compared.
impl PartialEq for Net {
    fn eq(&self, other: &Self) -> bool {
        self.agents == other.agents
            && self.ports == other.ports
            && self.connections == other.connections
            && self.free_ports.iter().eq(other.free_ports.iter())
    }
}
