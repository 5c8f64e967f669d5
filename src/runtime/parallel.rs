//! Round-based parallel reduction.
//!
//! Every agent has a single principal port, so the active pairs of a net never share an
//! agent and can all be rewritten at once. A round takes every active pair, plans all the
//! rewrites concurrently on the spawner and then commits the plans one by one. Two redexes
//! joined through their auxiliary ports are still independent, but the first commit changes
//! the neighbourhood the second one was planned against; such plans are noticed at commit
//! time and redone on the spot.

use std::sync::Arc;
use std::time::Instant;

use futures::future::{self, BoxFuture, FutureExt};
use futures::task::{Spawn, SpawnExt};

use super::error::NetError;
use super::net::Net;
use super::reducer::{active_pairs, apply_rule, is_normal_form, Normalized, Outcome, Plan, RedexView};
use super::rules::{Rule, RuleSet};

pub struct ParallelReducer {
    rules: Arc<RuleSet>,
    spawner: Arc<dyn Spawn + Send + Sync>,
}

type Planned = (Result<Plan, NetError>, Arc<Rule>);

impl ParallelReducer {
    pub fn new(rules: Arc<RuleSet>, spawner: Arc<dyn Spawn + Send + Sync>) -> Self {
        Self { rules, spawner }
    }

    /// Rewrite up to `limit` active pairs. Returns how many were rewritten; zero means the
    /// net is in normal form (or `limit` is zero).
    ///
    /// If some active pair has no rule, or some plan cannot be made, nothing is rewritten and
    /// the error is returned as is. A re-plan can still fail once earlier plans of the round
    /// are committed; those commits stay, and the error comes wrapped in
    /// [`NetError::Aborted`] with their number.
    pub async fn round(&self, net: &mut Net, limit: usize) -> Result<usize, NetError> {
        self.run_round(net, limit)
            .await
            .map_err(|(done, error)| match done {
                0 => error,
                steps => NetError::Aborted {
                    steps,
                    cause: Box::new(error),
                },
            })
    }

    /// Like [`round`](Self::round), but failures come with the number of commits made.
    async fn run_round(&self, net: &mut Net, limit: usize) -> Result<usize, (usize, NetError)> {
        let mut jobs = Vec::new();
        for pair in active_pairs(net).take(limit) {
            let rule = self
                .rules
                .lookup(&pair.symbol1, &pair.symbol2)
                .ok_or_else(|| (0, NetError::NoApplicableRule(pair.clone())))?;
            let view = RedexView::read(net, &pair, rule).map_err(|error| (0, error))?;
            jobs.push((view, Arc::clone(rule)));
        }
        if jobs.is_empty() {
            return Ok(0);
        }

        let tasks: Vec<BoxFuture<'static, Planned>> = jobs
            .into_iter()
            .map(|(view, rule)| self.plan(view, rule))
            .collect();
        let mut plans = Vec::with_capacity(tasks.len());
        for (plan, rule) in future::join_all(tasks).await {
            plans.push((plan.map_err(|error| (0, error))?, rule));
        }

        let mut done = 0;
        let mut failure = None;
        for (plan, rule) in plans {
            if plan.is_fresh(net, &rule) {
                plan.commit(net, &rule);
            } else {
                tracing::trace!(pair = %plan.view.pair, "plan went stale, replanning");
                net.rewrites.record_replan(rule.label());
                if let Err(error) = apply_rule(net, &plan.view.pair, &rule) {
                    failure = Some(error);
                    break;
                }
            }
            done += 1;
        }
        if done > 0 {
            net.rewrites.rounds += 1;
        }
        tracing::debug!(rewrites = done, "round");
        match failure {
            Some(error) => Err((done, error)),
            None => Ok(done),
        }
    }

    fn plan(&self, view: RedexView, rule: Arc<Rule>) -> BoxFuture<'static, Planned> {
        let task = {
            let rule = Arc::clone(&rule);
            let view = view.clone();
            async move {
                let plan = Plan::new(view, &rule);
                (plan, rule)
            }
        };
        match self.spawner.spawn_with_handle(task) {
            Ok(handle) => handle.boxed(),
            Err(error) => {
                tracing::warn!(%error, "could not spawn a planning task, planning inline");
                future::ready((Plan::new(view, &rule), rule)).boxed()
            }
        }
    }

    /// Run rounds until normal form, or until `max_steps` rewrites have been made.
    /// Failures are reported the way [`reduce`](super::reducer::reduce) reports them.
    pub async fn normalize(
        &self,
        net: &mut Net,
        max_steps: Option<usize>,
    ) -> Result<Normalized, NetError> {
        let start = Instant::now();
        let mut steps = 0;
        let result = loop {
            let remaining = max_steps.map_or(usize::MAX, |max| max.saturating_sub(steps));
            if remaining == 0 {
                let outcome = if is_normal_form(net) {
                    Outcome::NormalForm
                } else {
                    Outcome::Diverging
                };
                break Ok(Normalized { outcome, steps });
            }
            match self.run_round(net, remaining).await {
                Ok(0) => {
                    break Ok(Normalized {
                        outcome: Outcome::NormalForm,
                        steps,
                    })
                }
                Ok(done) => steps += done,
                Err((done, NetError::NoApplicableRule(pair))) => {
                    break Err(NetError::Stuck {
                        pair,
                        steps: steps + done,
                    })
                }
                Err((done, error)) => {
                    break Err(NetError::Aborted {
                        steps: steps + done,
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
            Err(error) => tracing::debug!(%error, "parallel reduction failed"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::net::PortId;
    use crate::runtime::rules::{AuxPort, ReplacementNet, RuleKey};
    use crate::runtime::symbol::Symbol;
    use futures::executor::{block_on, ThreadPool};

    fn reducer(rules: RuleSet) -> ParallelReducer {
        ParallelReducer::new(Arc::new(rules), Arc::new(ThreadPool::new().unwrap()))
    }

    fn x() -> Symbol {
        Symbol::new("X", 1)
    }

    fn x_pairs(n: usize) -> Net {
        let mut net = Net::empty();
        for _ in 0..n {
            let a = net.new_agent(x());
            let b = net.new_agent(x());
            net.connect(
                net.get_principal(a).unwrap().unwrap(),
                net.get_principal(b).unwrap().unwrap(),
            )
            .unwrap();
        }
        net
    }

    fn annihilation() -> RuleSet {
        RuleSet::new([Rule::new(x(), x(), ReplacementNet::empty()).unwrap()]).unwrap()
    }

    #[test]
    fn test_one_round_reduces_every_pair() {
        let mut net = x_pairs(5);
        let reducer = reducer(annihilation());
        assert_eq!(block_on(reducer.round(&mut net, usize::MAX)), Ok(5));
        assert_eq!(net, Net::empty());
        assert_eq!(net.rewrites.rounds, 1);
        assert_eq!(net.rewrites.total(), 5);
    }

    #[test]
    fn test_budget_is_exact() {
        let mut net = x_pairs(5);
        let reducer = reducer(annihilation());
        let normalized = block_on(reducer.normalize(&mut net, Some(3))).unwrap();
        assert_eq!(
            normalized,
            Normalized {
                outcome: Outcome::Diverging,
                steps: 3,
            }
        );
        assert_eq!(net.agent_count(), 4);
    }

    #[test]
    fn test_missing_rule_leaves_net_untouched() {
        let mut net = x_pairs(2);
        let y = Symbol::new("Y", 1);
        let a = net.new_agent(y.clone());
        let b = net.new_agent(y);
        net.connect(
            net.get_principal(a).unwrap().unwrap(),
            net.get_principal(b).unwrap().unwrap(),
        )
        .unwrap();
        let before = net.clone();

        let reducer = reducer(annihilation());
        let error = block_on(reducer.normalize(&mut net, None)).unwrap_err();
        assert!(matches!(error, NetError::Stuck { steps: 0, .. }));
        assert_eq!(net, before);
    }

    #[test]
    fn test_failed_replan_keeps_the_round() {
        // I ~ I, I ~ I chained through their auxiliary ports: once the first pair is gone
        // the second one would wire two interface ports together
        let i = Symbol::new("I", 2);
        let rules = RuleSet::new([Rule::new(
            i.clone(),
            i.clone(),
            ReplacementNet::empty().wire(AuxPort::left(0), AuxPort::right(0)),
        )
        .unwrap()])
        .unwrap();
        let chain = || {
            let mut net = Net::empty();
            let agents: Vec<_> = (0..4).map(|_| net.new_agent(i.clone())).collect();
            for (a, b, position) in [(0, 1, 0), (2, 3, 0), (1, 2, 1)] {
                net.connect(
                    net.port_at(agents[a], position).unwrap(),
                    net.port_at(agents[b], position).unwrap(),
                )
                .unwrap();
            }
            net
        };
        let aborted = NetError::Aborted {
            steps: 1,
            cause: Box::new(NetError::FreeWire(RuleKey::new(&i, &i))),
        };
        let reducer = reducer(rules);

        let mut net = chain();
        assert_eq!(block_on(reducer.round(&mut net, usize::MAX)), Err(aborted.clone()));
        assert_eq!(net.rewrites.total(), 1);
        assert_eq!(net.rewrites.replanned, 1);
        assert_eq!(net.rewrites.rounds, 1);
        assert_eq!(net.agent_count(), 2);

        let mut net = chain();
        assert_eq!(block_on(reducer.normalize(&mut net, None)), Err(aborted));
    }

    #[test]
    fn test_adjacent_redexes_are_replanned() {
        // F(p, a) ~ K(p) gives a fresh K on `a`; K ~ K annihilates.
        let f = Symbol::new("F", 2);
        let k = Symbol::new("K", 1);
        let mut rhs = Net::empty();
        let fresh = rhs.new_agent(k.clone());
        let port = rhs.get_principal(fresh).unwrap().unwrap();
        let rules = RuleSet::new([
            Rule::new(
                f.clone(),
                k.clone(),
                ReplacementNet::new(rhs).bind(AuxPort::left(0), port),
            )
            .unwrap(),
            Rule::new(k.clone(), k.clone(), ReplacementNet::empty()).unwrap(),
        ])
        .unwrap();

        // K ~ F -- F ~ K, the two F joined by their auxiliary ports
        let mut net = Net::empty();
        let mut aux: Vec<PortId> = Vec::new();
        for _ in 0..2 {
            let fa = net.new_agent(f.clone());
            let ka = net.new_agent(k.clone());
            net.connect(
                net.get_principal(fa).unwrap().unwrap(),
                net.get_principal(ka).unwrap().unwrap(),
            )
            .unwrap();
            aux.push(net.get_auxiliary(fa).unwrap()[0]);
        }
        net.connect(aux[0], aux[1]).unwrap();

        let reducer = reducer(rules);
        let normalized = block_on(reducer.normalize(&mut net, None)).unwrap();
        assert_eq!(normalized.outcome, Outcome::NormalForm);
        assert_eq!(normalized.steps, 3);
        assert_eq!(net.rewrites.replanned, 1);
        assert_eq!(net.rewrites.rounds, 2);
        assert_eq!(net.agent_count(), 0);
    }
}
