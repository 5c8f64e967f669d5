//! Textual rendering of nets and rules.
//!
//! A net is shown as a list of trees. An agent's auxiliary ports are shown as the subtrees
//! hanging off them, whenever the other end is the principal port of an agent not shown yet.
//! Any other connection is shown as a variable appearing at both of its ends. Interface
//! ports are shown as `#i`, hidden unconnected ports as `_`, and active pairs as `a ~ b`.

use std::collections::{HashMap, HashSet};
use std::fmt::Write;

use super::net::{AgentId, ConnectionId, Net, PortId};
use super::reducer::active_pairs;
use super::rules::{Rule, RuleSet, Splice};

pub fn number_to_string(mut number: usize) -> String {
    let mut result = String::new();
    number += 1;
    while number > 0 {
        let remainder = (number - 1) % 26;
        let character = (b'a' + remainder as u8) as char;
        result.insert(0, character);
        number = (number - 1) / 26;
    }
    result
}

struct Shower<'a> {
    net: &'a Net,
    shown: HashSet<AgentId>,
    names: HashMap<ConnectionId, String>,
}

impl<'a> Shower<'a> {
    fn new(net: &'a Net) -> Self {
        Self {
            net,
            shown: HashSet::new(),
            names: HashMap::new(),
        }
    }

    fn lines(mut self) -> Vec<String> {
        let net = self.net;
        let mut lines = Vec::new();
        for pair in active_pairs(net) {
            self.shown.insert(pair.agent1);
            self.shown.insert(pair.agent2);
            let left = self.body(pair.agent1);
            let right = self.body(pair.agent2);
            lines.push(format!("{left} ~ {right}"));
        }

        // roots: agents whose principal port is not connected
        let agents: Vec<AgentId> = net.get_agents().map(|agent| agent.id()).collect();
        for &agent in &agents {
            if self.shown.contains(&agent) {
                continue;
            }
            match net.get_principal(agent).ok().flatten() {
                None => lines.push(self.tree(agent)),
                Some(port) if net.peer(port).is_none() => {
                    let label = self.free(port);
                    let tree = self.tree(agent);
                    lines.push(format!("{label} = {tree}"));
                }
                Some(_) => {}
            }
        }

        // what is left hangs off a cycle
        for &agent in &agents {
            if self.shown.contains(&agent) {
                continue;
            }
            let label = match net.get_principal(agent).ok().flatten() {
                Some(port) => self.end(port),
                None => String::from("_"),
            };
            let tree = self.tree(agent);
            lines.push(format!("{label} = {tree}"));
        }
        lines
    }

    fn tree(&mut self, agent: AgentId) -> String {
        self.shown.insert(agent);
        self.body(agent)
    }

    fn body(&mut self, agent: AgentId) -> String {
        let Some(data) = self.net.agent(agent) else {
            return String::from("<missing>");
        };
        let name = data.symbol().name().to_owned();
        let auxiliary = data.auxiliary().to_vec();
        if auxiliary.is_empty() {
            return name;
        }
        let args: Vec<String> = auxiliary.into_iter().map(|port| self.end(port)).collect();
        format!("{name}({})", args.join(", "))
    }

    /// What is seen looking out of `port`.
    fn end(&mut self, port: PortId) -> String {
        let net = self.net;
        let Some(peer) = net.peer(port).and_then(|peer| net.port(peer)) else {
            return self.free(port);
        };
        if peer.is_principal() && !self.shown.contains(&peer.agent()) {
            return self.tree(peer.agent());
        }
        match net.port(port).and_then(|p| p.connection()) {
            Some(connection) => {
                let next = self.names.len();
                self.names
                    .entry(connection)
                    .or_insert_with(|| number_to_string(next))
                    .clone()
            }
            None => String::from("_"),
        }
    }

    fn free(&self, port: PortId) -> String {
        match self.net.interface().get_index_of(&port) {
            Some(index) => format!("#{index}"),
            None => String::from("_"),
        }
    }
}

impl Net {
    pub fn show(&self) -> String {
        self.show_indent(0)
    }

    pub fn show_indent(&self, indent: usize) -> String {
        let indent_string = "    ".repeat(indent);
        let mut s = String::new();
        for line in Shower::new(self).lines() {
            let _ = writeln!(&mut s, "{indent_string}{line}");
        }
        s
    }
}

impl Rule {
    pub fn show(&self) -> String {
        let replacement = self.replacement();
        let interface = replacement.net().interface();
        let mut s = format!("{} >< {}", self.left(), self.right());
        let splices: Vec<String> = self
            .slots()
            .map(|slot| match replacement.splice(slot) {
                Some(Splice::Port(port)) => match interface.get_index_of(&port) {
                    Some(index) => format!("{slot} = #{index}"),
                    None => format!("{slot} = {port:?}"),
                },
                Some(Splice::Wire(other)) => format!("{slot} = {other}"),
                None => format!("{slot} = ?"),
            })
            .collect();
        if !splices.is_empty() {
            let _ = write!(&mut s, " [{}]", splices.join(", "));
        }
        s.push('\n');
        s.push_str(&replacement.net().show_indent(1));
        s
    }
}

impl RuleSet {
    pub fn show(&self) -> String {
        self.rules().map(|rule| rule.show()).collect()
    }
}
