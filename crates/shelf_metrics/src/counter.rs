//! Named counters for catalog events

use std::collections::BTreeMap;

/// Event tallies keyed by a static name, reported in name order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Counter {
    counts: BTreeMap<&'static str, usize>,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, name: &'static str, value: usize) {
        *self.counts.entry(name).or_default() += value;
    }

    pub fn get(&self, name: &str) -> usize {
        self.counts.get(name).copied().unwrap_or(0)
    }

    /// Add every tally of `other` into this one.
    pub fn merge(&mut self, other: &Counter) {
        for (&name, &value) in &other.counts {
            self.increment(name, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, usize)> + '_ {
        self.counts.iter().map(|(&name, &value)| (name, value))
    }
}
