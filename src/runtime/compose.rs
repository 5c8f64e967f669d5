//! Composition of nets. All of these are built from [`Net::inject`] and [`Net::connect`];
//! none of them reduce anything.

use std::collections::HashSet;

use indexmap::IndexMap;

use super::error::NetError;
use super::net::{Net, PortId};

/// Disjoint union. The interface is the left interface followed by the right one.
pub fn parallel(mut left: Net, right: Net) -> Net {
    left.inject(right, true);
    left
}

/// The monoidal product of two nets, which for nets is just [`parallel`].
pub fn tensor(left: Net, right: Net) -> Net {
    parallel(left, right)
}

/// Plug two nets into each other, connecting the i-th free port of `left` to the i-th free
/// port of `right`. Both interfaces are used up.
pub fn sequential(left: Net, right: Net) -> Result<Net, NetError> {
    let pairs: Vec<(PortId, PortId)> = left
        .interface()
        .iter()
        .copied()
        .zip(right.interface().iter().copied())
        .collect();
    let sizes = (left.interface().len(), right.interface().len());
    if sizes.0 != sizes.1 {
        return Err(NetError::InterfaceSizeMismatch {
            left: sizes.0,
            right: sizes.1,
        });
    }
    splice(left, right, pairs)
}

/// Like [`sequential`], but with an explicit pairing of the left free ports with the right
/// ones instead of a positional one. The pairing must be a bijection between the interfaces.
pub fn compose(left: Net, right: Net, mapping: &IndexMap<PortId, PortId>) -> Result<Net, NetError> {
    let sizes = (left.interface().len(), right.interface().len());
    if sizes.0 != sizes.1 {
        return Err(NetError::InterfaceSizeMismatch {
            left: sizes.0,
            right: sizes.1,
        });
    }
    if mapping.len() != sizes.0 {
        return Err(NetError::InterfaceSizeMismatch {
            left: sizes.0,
            right: mapping.len(),
        });
    }

    let mut targets = HashSet::new();
    for (&from, &to) in mapping {
        if !left.interface().contains(&from) {
            return Err(NetError::UnknownPort(from));
        }
        if !right.interface().contains(&to) {
            return Err(NetError::UnknownPort(to));
        }
        if !targets.insert(to) {
            return Err(NetError::DoubleConnect(to));
        }
    }
    splice(left, right, mapping.iter().map(|(&a, &b)| (a, b)).collect())
}

fn splice(mut left: Net, right: Net, pairs: Vec<(PortId, PortId)>) -> Result<Net, NetError> {
    let ports = left.inject(right, true);
    for (a, b) in pairs {
        left.connect(a, ports[&b])?;
    }
    Ok(left)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::reducer::find_active_pairs;
    use crate::runtime::symbol::Symbol;

    fn x() -> Symbol {
        Symbol::new("X", 1)
    }

    fn free(net: &Net) -> Vec<PortId> {
        net.interface().iter().copied().collect()
    }

    #[test]
    fn test_parallel_then_connect_makes_active_pair() {
        let mut net = parallel(Net::new(x()), Net::new(x()));
        assert_eq!(net.agent_count(), 2);
        assert_eq!(net.connection_count(), 0);
        let ports = free(&net);
        assert_eq!(ports.len(), 2);

        net.connect(ports[0], ports[1]).unwrap();
        assert_eq!(net.connection_count(), 1);
        assert!(net.interface().is_empty());
        assert_eq!(find_active_pairs(&net).len(), 1);
    }

    #[test]
    fn test_tensor_keeps_interface_order() {
        let left = Net::new(Symbol::new("A", 2));
        let right = Net::new(Symbol::new("B", 1));
        let net = tensor(left, right);
        let names: Vec<&str> = free(&net)
            .into_iter()
            .map(|p| {
                let agent = net.port(p).unwrap().agent();
                net.agent(agent).unwrap().symbol().name()
            })
            .collect();
        assert_eq!(names, vec!["A", "A", "B"]);
    }

    #[test]
    fn test_sequential_connects_positionally() {
        let net = sequential(Net::new(Symbol::new("A", 2)), Net::new(Symbol::new("B", 2))).unwrap();
        assert!(net.interface().is_empty());
        assert_eq!(net.connection_count(), 2);
        assert_eq!(find_active_pairs(&net).len(), 1);
    }

    #[test]
    fn test_sequential_rejects_unequal_interfaces() {
        let two = Net::new(Symbol::new("A", 2));
        let three = Net::new(Symbol::new("B", 3));
        assert_eq!(
            sequential(two, three).unwrap_err(),
            NetError::InterfaceSizeMismatch { left: 2, right: 3 }
        );
    }

    #[test]
    fn test_compose_follows_mapping() {
        let left = Net::new(Symbol::new("A", 2));
        let right = Net::new(Symbol::new("B", 2));
        let (l, r) = (free(&left), free(&right));

        let crossed: IndexMap<PortId, PortId> = [(l[0], r[1]), (l[1], r[0])].into_iter().collect();
        let net = compose(left.clone(), right.clone(), &crossed).unwrap();
        assert_eq!(net.connection_count(), 2);
        // principal meets auxiliary on both connections, so nothing is active
        assert!(find_active_pairs(&net).is_empty());

        let partial: IndexMap<PortId, PortId> = [(l[0], r[0])].into_iter().collect();
        assert_eq!(
            compose(left.clone(), right.clone(), &partial).unwrap_err(),
            NetError::InterfaceSizeMismatch { left: 2, right: 1 }
        );

        let repeated: IndexMap<PortId, PortId> = [(l[0], r[0]), (l[1], r[0])].into_iter().collect();
        assert_eq!(
            compose(left, right, &repeated).unwrap_err(),
            NetError::DoubleConnect(r[0])
        );
    }

    #[test]
    fn test_connect_interface_is_all_or_nothing() {
        let mut net = parallel(Net::new(Symbol::new("A", 2)), Net::new(Symbol::new("B", 2)));
        let ports = free(&net);
        let before = net.clone();

        assert_eq!(
            net.connect_interface(&ports[..2], &ports[2..3]),
            Err(NetError::InterfaceSizeMismatch { left: 2, right: 1 })
        );
        assert_eq!(
            net.connect_interface(&[ports[0], ports[1]], &[ports[2], ports[0]]),
            Err(NetError::DoubleConnect(ports[0]))
        );
        assert_eq!(net, before);

        let connections = net.connect_interface(&ports[..2], &ports[2..]).unwrap();
        assert_eq!(connections.len(), 2);
        assert!(net.interface().is_empty());
    }
}
