use std::time::Duration;

use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
/// Interactions of a single rule and how long they took, planning and committing together.
pub struct RuleStats {
    pub interactions: u64,
    /// Plans for this rule that went stale in a parallel round and were redone.
    pub replanned: u64,
    pub total_time: Duration,
    pub min_time: Duration,
    pub max_time: Duration,
}

impl RuleStats {
    fn record(&mut self, took: Duration) {
        if self.interactions == 0 || took < self.min_time {
            self.min_time = took;
        }
        self.max_time = self.max_time.max(took);
        self.total_time += took;
        self.interactions += 1;
    }

    pub fn avg_time(&self) -> Duration {
        match u32::try_from(self.interactions) {
            Ok(0) => Duration::ZERO,
            Ok(n) => self.total_time / n,
            Err(_) => Duration::from_secs_f64(
                self.total_time.as_secs_f64() / self.interactions as f64,
            ),
        }
    }
}

impl core::ops::Add<RuleStats> for RuleStats {
    type Output = RuleStats;

    fn add(self, rhs: RuleStats) -> Self::Output {
        let min_time = match (self.interactions, rhs.interactions) {
            (0, _) => rhs.min_time,
            (_, 0) => self.min_time,
            _ => self.min_time.min(rhs.min_time),
        };
        RuleStats {
            interactions: self.interactions + rhs.interactions,
            replanned: self.replanned + rhs.replanned,
            total_time: self.total_time + rhs.total_time,
            min_time,
            max_time: self.max_time.max(rhs.max_time),
        }
    }
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct Rewrites {
    pub interactions: u64,
    /// Statistics per rule, keyed by the rule's display form, in order of first use.
    pub by_rule: IndexMap<String, RuleStats>,
    /// Rounds run by the parallel reducer.
    pub rounds: u64,
    /// Plans invalidated by an adjacent rewrite in the same round and redone serially.
    pub replanned: u64,
    pub busy_duration: Duration,
}

impl core::ops::Add<Rewrites> for Rewrites {
    type Output = Rewrites;

    fn add(mut self, rhs: Rewrites) -> Self::Output {
        self.interactions += rhs.interactions;
        for (rule, stats) in rhs.by_rule {
            let entry = self.by_rule.entry(rule).or_default();
            *entry = core::mem::take(entry) + stats;
        }
        self.rounds += rhs.rounds;
        self.replanned += rhs.replanned;
        self.busy_duration += rhs.busy_duration;
        self
    }
}

impl Rewrites {
    pub(crate) fn record(&mut self, rule: &str, took: Duration) {
        self.interactions += 1;
        self.rule_mut(rule).record(took);
    }

    pub(crate) fn record_replan(&mut self, rule: &str) {
        self.replanned += 1;
        self.rule_mut(rule).replanned += 1;
    }

    fn rule_mut(&mut self, rule: &str) -> &mut RuleStats {
        if !self.by_rule.contains_key(rule) {
            self.by_rule.insert(rule.to_owned(), RuleStats::default());
        }
        &mut self.by_rule[rule]
    }

    pub fn total(&self) -> u64 {
        self.interactions
    }

    pub fn per_second(&self) -> u64 {
        if self.busy_duration.is_zero() {
            return 0;
        }
        (self.interactions as f64 / self.busy_duration.as_secs_f64()) as u64
    }

    pub fn show(&self, elapsed: Duration) -> String {
        use core::fmt::Write;
        let mut s = String::new();
        for (rule, stats) in &self.by_rule {
            let _ = writeln!(
                s,
                "\t{rule}: {} (avg {:?}, min {:?}, max {:?})",
                stats.interactions,
                stats.avg_time(),
                stats.min_time,
                stats.max_time,
            );
        }
        let _ = write!(
            s,
            "\
            \tTotal interactions: {}\n\
            \tRounds: {}\n\
            \tReplanned: {}\n\
            \tTotal time (ms): {}\n\
            \tNet time (ms): {}\n\
            \tInteractions per second: {}\n\
            ",
            self.total(),
            self.rounds,
            self.replanned,
            elapsed.as_millis(),
            self.busy_duration.as_millis(),
            self.per_second(),
        );
        s
    }
}
