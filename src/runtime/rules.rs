//! Interaction rules.
//!
//! A rule is keyed on an unordered pair of symbols. Its right-hand side is a [`ReplacementNet`]:
//! a net, plus a splice map telling where each auxiliary port of the two interacting agents
//! gets reconnected once they are gone.

use std::collections::HashSet;
use std::fmt::{self, Display};
use std::sync::Arc;

use indexmap::IndexMap;

use super::error::NetError;
use super::net::{Net, PortId};
use super::symbol::{Str, Symbol};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// Which agent of a pattern a slot belongs to: the rule's left symbol or its right symbol.
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn flip(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// An auxiliary port of a pattern agent. `index` counts auxiliary ports only,
/// so `AuxPort::left(0)` is port 1 of the left agent.
pub struct AuxPort {
    pub side: Side,
    pub index: usize,
}

impl AuxPort {
    pub fn left(index: usize) -> Self {
        Self {
            side: Side::Left,
            index,
        }
    }

    pub fn right(index: usize) -> Self {
        Self {
            side: Side::Right,
            index,
        }
    }

    pub fn flip(self) -> Self {
        Self {
            side: self.side.flip(),
            index: self.index,
        }
    }
}

impl Display for AuxPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.side {
            Side::Left => write!(f, "L{}", self.index),
            Side::Right => write!(f, "R{}", self.index),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Splice {
    /// Reconnect the slot to this port of the replacement net.
    Port(PortId),
    /// Join the slot straight through to another slot of the pattern.
    Wire(AuxPort),
}

#[derive(Clone, Debug, Default)]
pub struct ReplacementNet {
    net: Net,
    splices: IndexMap<AuxPort, Splice>,
}

impl ReplacementNet {
    pub fn new(net: Net) -> Self {
        Self {
            net,
            splices: IndexMap::new(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn bind(mut self, slot: AuxPort, port: PortId) -> Self {
        self.splices.insert(slot, Splice::Port(port));
        self
    }

    pub fn wire(mut self, a: AuxPort, b: AuxPort) -> Self {
        self.splices.insert(a, Splice::Wire(b));
        self.splices.insert(b, Splice::Wire(a));
        self
    }

    pub fn net(&self) -> &Net {
        &self.net
    }

    pub fn splices(&self) -> &IndexMap<AuxPort, Splice> {
        &self.splices
    }

    pub fn splice(&self, slot: AuxPort) -> Option<Splice> {
        self.splices.get(&slot).copied()
    }

    /// The slots that are reconnected to a port of the replacement net, and those ports.
    pub fn interface_map(&self) -> impl Iterator<Item = (AuxPort, PortId)> + '_ {
        self.splices.iter().filter_map(|(&slot, splice)| match splice {
            Splice::Port(port) => Some((slot, *port)),
            Splice::Wire(_) => None,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// The canonical, order-independent key of a rule: its two symbol names, sorted.
pub struct RuleKey(Str, Str);

impl RuleKey {
    pub fn new(a: &Symbol, b: &Symbol) -> Self {
        if a.name() <= b.name() {
            Self(a.shared_name(), b.shared_name())
        } else {
            Self(b.shared_name(), a.shared_name())
        }
    }

    pub fn names(&self) -> (&str, &str) {
        (&self.0, &self.1)
    }
}

impl Display for RuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.0, self.1)
    }
}

#[derive(Clone, Debug)]
pub struct Rule {
    left: Symbol,
    right: Symbol,
    replacement: ReplacementNet,
    key: RuleKey,
    label: String,
}

impl Rule {
    /// Build a rule, checking that the replacement splices every auxiliary port of the
    /// pattern exactly once and that its ported splices are exactly its interface.
    pub fn new(left: Symbol, right: Symbol, replacement: ReplacementNet) -> Result<Self, NetError> {
        for symbol in [&left, &right] {
            if !symbol.has_principal() {
                return Err(NetError::NoPrincipal(symbol.clone()));
            }
        }
        let key = RuleKey::new(&left, &right);
        let expected = left.aux_arity() + right.aux_arity();
        let splices = replacement.splices();
        let mismatch = |found| NetError::ArityMismatch {
            key: key.clone(),
            expected,
            found,
        };

        let in_range = |slot: &AuxPort| match slot.side {
            Side::Left => slot.index < left.aux_arity(),
            Side::Right => slot.index < right.aux_arity(),
        };
        if splices.len() != expected || !splices.keys().all(in_range) {
            return Err(mismatch(splices.len()));
        }

        let mut targets = HashSet::new();
        for (&slot, &splice) in splices {
            match splice {
                Splice::Wire(other) => {
                    if other == slot || replacement.splice(other) != Some(Splice::Wire(slot)) {
                        return Err(mismatch(splices.len()));
                    }
                }
                Splice::Port(port) => {
                    let data = replacement
                        .net()
                        .port(port)
                        .ok_or(NetError::UnknownPort(port))?;
                    if data.is_connected() {
                        return Err(NetError::DoubleConnect(port));
                    }
                    if !targets.insert(port) {
                        return Err(mismatch(splices.len()));
                    }
                }
            }
        }

        let interface = replacement.net().interface();
        if targets.len() != interface.len() || !interface.iter().all(|p| targets.contains(p)) {
            return Err(NetError::ArityMismatch {
                key,
                expected: interface.len(),
                found: targets.len(),
            });
        }

        let label = key.to_string();
        let mut replacement = replacement;
        replacement.net.rewrites = Default::default();
        Ok(Self {
            left,
            right,
            replacement,
            key,
            label,
        })
    }

    pub fn left(&self) -> &Symbol {
        &self.left
    }

    pub fn right(&self) -> &Symbol {
        &self.right
    }

    pub fn key(&self) -> &RuleKey {
        &self.key
    }

    pub(crate) fn label(&self) -> &str {
        &self.label
    }

    pub fn replacement(&self) -> &ReplacementNet {
        &self.replacement
    }

    pub fn is_self_interaction(&self) -> bool {
        self.left == self.right
    }

    /// The sides played by two interacting agents with symbols `a` and `b`,
    /// or `None` if this rule is not for them.
    pub fn orient(&self, a: &Symbol, b: &Symbol) -> Option<[Side; 2]> {
        if *a == self.left && *b == self.right {
            Some([Side::Left, Side::Right])
        } else if *a == self.right && *b == self.left {
            Some([Side::Right, Side::Left])
        } else {
            None
        }
    }

    /// Every auxiliary slot of the pattern, left agent first.
    pub fn slots(&self) -> impl Iterator<Item = AuxPort> + '_ {
        (0..self.left.aux_arity())
            .map(AuxPort::left)
            .chain((0..self.right.aux_arity()).map(AuxPort::right))
    }
}

#[derive(Clone, Debug, Default)]
/// A deterministic rule set: at most one rule per unordered pair of symbol names.
/// Ambiguity is rejected on insertion, so lookups never have to choose.
pub struct RuleSet {
    rules: IndexMap<RuleKey, Arc<Rule>>,
}

impl RuleSet {
    pub fn new(rules: impl IntoIterator<Item = Rule>) -> Result<Self, NetError> {
        let mut set = Self::default();
        for rule in rules {
            set.insert(rule)?;
        }
        Ok(set)
    }

    pub fn insert(&mut self, rule: Rule) -> Result<(), NetError> {
        match self.rules.entry(rule.key().clone()) {
            indexmap::map::Entry::Occupied(entry) => {
                Err(NetError::AmbiguousRule(entry.key().clone()))
            }
            indexmap::map::Entry::Vacant(entry) => {
                entry.insert(Arc::new(rule));
                Ok(())
            }
        }
    }

    /// The rule for two interacting symbols, if there is one whose symbols match exactly.
    pub fn lookup(&self, a: &Symbol, b: &Symbol) -> Option<&Arc<Rule>> {
        self.rules
            .get(&RuleKey::new(a, b))
            .filter(|rule| rule.orient(a, b).is_some())
    }

    pub fn rules(&self) -> impl Iterator<Item = &Arc<Rule>> + '_ {
        self.rules.values()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
