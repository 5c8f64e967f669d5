//! Lafont's symmetric interaction combinators: constructor γ, duplicator δ and eraser ε.
//!
//! Two combinators of the same kind annihilate, γ crossing its wires and δ keeping them
//! straight. γ and δ commute through each other, and ε erases whatever it meets.

use crate::runtime::{AuxPort, Net, NetError, ReplacementNet, Rule, RuleSet, Symbol};

pub fn gamma() -> Symbol {
    Symbol::new("γ", 3)
}

pub fn delta() -> Symbol {
    Symbol::new("δ", 3)
}

pub fn epsilon() -> Symbol {
    Symbol::new("ε", 1)
}

pub fn rules() -> Result<RuleSet, NetError> {
    let (l, r) = (AuxPort::left, AuxPort::right);
    let mut rules = RuleSet::default();

    rules.insert(Rule::new(
        gamma(),
        gamma(),
        ReplacementNet::empty().wire(l(0), r(1)).wire(l(1), r(0)),
    )?)?;
    rules.insert(Rule::new(
        delta(),
        delta(),
        ReplacementNet::empty().wire(l(0), r(0)).wire(l(1), r(1)),
    )?)?;
    rules.insert(Rule::new(epsilon(), epsilon(), ReplacementNet::empty())?)?;

    // γ(a, b) ~ δ(c, d)  =>  a = δ(x, y), b = δ(z, w), c = γ(x, z), d = γ(y, w)
    {
        let mut net = Net::empty();
        let d1 = net.new_agent(delta());
        let d2 = net.new_agent(delta());
        let g1 = net.new_agent(gamma());
        let g2 = net.new_agent(gamma());
        net.connect(net.port_at(d1, 1)?, net.port_at(g1, 1)?)?;
        net.connect(net.port_at(d1, 2)?, net.port_at(g2, 1)?)?;
        net.connect(net.port_at(d2, 1)?, net.port_at(g1, 2)?)?;
        net.connect(net.port_at(d2, 2)?, net.port_at(g2, 2)?)?;
        let replacement = ReplacementNet::new(net.clone())
            .bind(l(0), net.port_at(d1, 0)?)
            .bind(l(1), net.port_at(d2, 0)?)
            .bind(r(0), net.port_at(g1, 0)?)
            .bind(r(1), net.port_at(g2, 0)?);
        rules.insert(Rule::new(gamma(), delta(), replacement)?)?;
    }

    for symbol in [gamma(), delta()] {
        let mut net = Net::new(epsilon());
        net.new_agent(epsilon());
        let ports: Vec<_> = net.interface().iter().copied().collect();
        let replacement = ReplacementNet::new(net)
            .bind(l(0), ports[0])
            .bind(l(1), ports[1]);
        rules.insert(Rule::new(symbol, epsilon(), replacement)?)?;
    }

    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{
        find_active_pairs, isomorphic, reduce, verify, verify_confluence, AgentId, PortId,
    };

    fn principal(net: &Net, agent: AgentId) -> PortId {
        net.get_principal(agent).unwrap().unwrap()
    }

    fn pair(a: Symbol, b: Symbol) -> (Net, AgentId, AgentId) {
        let mut net = Net::empty();
        let x = net.new_agent(a);
        let y = net.new_agent(b);
        net.connect(principal(&net, x), principal(&net, y)).unwrap();
        (net, x, y)
    }

    #[test]
    fn test_rules_are_confluent() {
        let rules = rules().unwrap();
        assert_eq!(rules.len(), 6);
        assert_eq!(verify_confluence(&rules), Ok(()));
    }

    #[test]
    fn test_annihilation_erases_everything() {
        let (mut net, x, y) = pair(gamma(), gamma());
        for agent in [x, y] {
            for index in 0..2 {
                let eraser = net.new_agent(epsilon());
                let aux = net.get_auxiliary(agent).unwrap()[index];
                net.connect(aux, principal(&net, eraser)).unwrap();
            }
        }
        let normalized = reduce(&mut net, &rules().unwrap()).unwrap();
        assert_eq!(normalized.steps, 3);
        assert_eq!(net, Net::empty());
    }

    #[test]
    fn test_commutation() {
        let (mut net, _, _) = pair(gamma(), delta());
        assert_eq!(net.interface().len(), 4);
        reduce(&mut net, &rules().unwrap()).unwrap();

        assert_eq!(net.agent_count(), 4);
        assert_eq!(net.connection_count(), 4);
        assert_eq!(net.interface().len(), 4);
        assert!(find_active_pairs(&net).is_empty());
        assert_eq!(verify(&net), Ok(()));

        let names: Vec<String> = net
            .interface()
            .iter()
            .map(|&port| {
                let agent = net.port(port).unwrap().agent();
                net.agent(agent).unwrap().symbol().name().to_owned()
            })
            .collect();
        assert_eq!(names, ["δ", "δ", "γ", "γ"]);
    }

    #[test]
    fn test_erasure_spreads() {
        let (mut net, _, _) = pair(delta(), epsilon());
        reduce(&mut net, &rules().unwrap()).unwrap();

        let mut expected = Net::new(epsilon());
        expected.new_agent(epsilon());
        assert!(isomorphic(&net, &expected));
    }
}
