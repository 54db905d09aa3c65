use std::{borrow::Borrow, collections::BTreeMap};

use crate::{Config, Value, Vote};

/// What a completed round tells a participant to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A value was held by more than half of all `n` participants.
    Decide(Value),
    /// No value reached a majority, flip the coin and move on.
    NoMajority,
}

/// Per-value tally of the votes collected for a single round.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VoteCount {
    pub values: BTreeMap<Value, usize>,
}

impl VoteCount {
    pub fn count<V: Borrow<Vote>>(votes: impl IntoIterator<Item = V>) -> Self {
        let mut count = VoteCount::default();

        for vote in votes.into_iter() {
            let vote = vote.borrow();
            *count.values.entry(vote.value).or_default() += 1;
        }

        count
    }

    pub fn total(&self) -> usize {
        self.values.values().sum()
    }

    pub fn votes_for(&self, value: Value) -> usize {
        self.values.get(&value).copied().unwrap_or_default()
    }

    pub fn value_with_most_votes(&self) -> Option<(Value, usize)> {
        self.values
            .iter()
            .map(|(value, c)| (*value, *c))
            .max_by_key(|(_, c)| *c)
    }

    /// Majority is measured per value against the full participant set,
    /// never against the size of the quorum that was collected.
    pub fn outcome(&self, config: &Config) -> Outcome {
        match self.value_with_most_votes() {
            Some((value, c)) if config.is_majority(c) => Outcome::Decide(value),
            _ => Outcome::NoMajority,
        }
    }
}
