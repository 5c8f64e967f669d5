//! Unary natural numbers with addition and multiplication.
//!
//! A number is a chain `S(S(...Z))` whose root is the principal port of the outermost agent.
//! `Add` and `Mul` take their first argument on the principal port, the second one on the
//! first auxiliary port, and give the result on the second auxiliary port. Multiplication
//! needs to copy and to erase its second argument, which is what `Dup` and `Era` are for.

use crate::runtime::compose::parallel;
use crate::runtime::{AuxPort, Net, NetError, PortId, ReplacementNet, Rule, RuleSet, Symbol};

pub fn zero() -> Symbol {
    Symbol::new("Z", 1)
}

pub fn succ() -> Symbol {
    Symbol::new("S", 2)
}

pub fn add_symbol() -> Symbol {
    Symbol::new("Add", 3)
}

pub fn mul_symbol() -> Symbol {
    Symbol::new("Mul", 3)
}

pub fn dup() -> Symbol {
    Symbol::new("Dup", 3)
}

pub fn era() -> Symbol {
    Symbol::new("Era", 1)
}

pub fn rules() -> Result<RuleSet, NetError> {
    let (l, r) = (AuxPort::left, AuxPort::right);
    let mut rules = RuleSet::default();

    // Add(y, r) ~ Z  =>  r = y
    rules.insert(Rule::new(
        add_symbol(),
        zero(),
        ReplacementNet::empty().wire(l(0), l(1)),
    )?)?;

    // Add(y, r) ~ S(x)  =>  r = S(Add(x, y))
    {
        let mut net = Net::empty();
        let s = net.new_agent(succ());
        let add = net.new_agent(add_symbol());
        net.connect(net.port_at(s, 1)?, net.port_at(add, 2)?)?;
        let replacement = ReplacementNet::new(net.clone())
            .bind(l(0), net.port_at(add, 1)?)
            .bind(l(1), net.port_at(s, 0)?)
            .bind(r(0), net.port_at(add, 0)?);
        rules.insert(Rule::new(add_symbol(), succ(), replacement)?)?;
    }

    // Mul(y, r) ~ Z  =>  Era(y), r = Z
    {
        let mut net = Net::empty();
        let e = net.new_agent(era());
        let z = net.new_agent(zero());
        let replacement = ReplacementNet::new(net.clone())
            .bind(l(0), net.port_at(e, 0)?)
            .bind(l(1), net.port_at(z, 0)?);
        rules.insert(Rule::new(mul_symbol(), zero(), replacement)?)?;
    }

    // Mul(y, r) ~ S(x)  =>  Dup(y) = (y1, y2), r = Add(Mul(x, y1), y2)
    {
        let mut net = Net::empty();
        let d = net.new_agent(dup());
        let mul = net.new_agent(mul_symbol());
        let add = net.new_agent(add_symbol());
        net.connect(net.port_at(d, 1)?, net.port_at(mul, 1)?)?;
        net.connect(net.port_at(d, 2)?, net.port_at(add, 1)?)?;
        net.connect(net.port_at(mul, 2)?, net.port_at(add, 0)?)?;
        let replacement = ReplacementNet::new(net.clone())
            .bind(l(0), net.port_at(d, 0)?)
            .bind(l(1), net.port_at(add, 2)?)
            .bind(r(0), net.port_at(mul, 0)?);
        rules.insert(Rule::new(mul_symbol(), succ(), replacement)?)?;
    }

    // Dup(a, b) ~ Z  =>  a = Z, b = Z
    {
        let mut net = Net::new(zero());
        net.new_agent(zero());
        let ports: Vec<PortId> = net.interface().iter().copied().collect();
        let replacement = ReplacementNet::new(net)
            .bind(l(0), ports[0])
            .bind(l(1), ports[1]);
        rules.insert(Rule::new(dup(), zero(), replacement)?)?;
    }

    // Dup(a, b) ~ S(x)  =>  a = S(a'), b = S(b'), Dup(x) = (a', b')
    {
        let mut net = Net::empty();
        let d = net.new_agent(dup());
        let a = net.new_agent(succ());
        let b = net.new_agent(succ());
        net.connect(net.port_at(d, 1)?, net.port_at(a, 1)?)?;
        net.connect(net.port_at(d, 2)?, net.port_at(b, 1)?)?;
        let replacement = ReplacementNet::new(net.clone())
            .bind(l(0), net.port_at(a, 0)?)
            .bind(l(1), net.port_at(b, 0)?)
            .bind(r(0), net.port_at(d, 0)?);
        rules.insert(Rule::new(dup(), succ(), replacement)?)?;
    }

    // Era ~ Z  =>  nothing
    rules.insert(Rule::new(era(), zero(), ReplacementNet::empty())?)?;

    // Era ~ S(x)  =>  Era(x)
    {
        let net = Net::new(era());
        let port = net.interface()[0];
        rules.insert(Rule::new(
            era(),
            succ(),
            ReplacementNet::new(net).bind(r(0), port),
        )?)?;
    }

    Ok(rules)
}

/// The number `n`. Its only free port is its root.
pub fn nat(n: usize) -> Result<Net, NetError> {
    let mut net = Net::new(zero());
    let mut root = net.interface()[0];
    for _ in 0..n {
        let s = net.new_agent(succ());
        net.connect(net.port_at(s, 1)?, root)?;
        root = net.port_at(s, 0)?;
    }
    Ok(net)
}

/// `a + b`, unreduced. Its only free port is the result.
pub fn add(a: usize, b: usize) -> Result<Net, NetError> {
    apply(add_symbol(), a, b)
}

/// `a * b`, unreduced. Its only free port is the result.
pub fn mul(a: usize, b: usize) -> Result<Net, NetError> {
    apply(mul_symbol(), a, b)
}

fn apply(operator: Symbol, a: usize, b: usize) -> Result<Net, NetError> {
    let mut net = parallel(nat(a)?, nat(b)?);
    let arguments: Vec<PortId> = net.interface().iter().copied().collect();
    let op = net.new_agent(operator);
    let inputs = [net.port_at(op, 0)?, net.port_at(op, 1)?];
    net.connect_interface(&arguments, &inputs)?;
    Ok(net)
}

/// Read the number rooted at the first free port, if there is one there.
pub fn read_nat(net: &Net) -> Option<usize> {
    let mut port = net.port(*net.interface().first()?)?;
    let mut n = 0;
    loop {
        if !port.is_principal() {
            return None;
        }
        let agent = net.agent(port.agent())?;
        if *agent.symbol() == zero() {
            return Some(n);
        }
        if *agent.symbol() != succ() {
            return None;
        }
        n += 1;
        let predecessor = net.peer(*agent.auxiliary().first()?)?;
        port = net.port(predecessor)?;
    }
}
