use std::collections::BTreeMap;

use crate::{Round, Vote, VoteCount};

/// Votes received per round, kept in the order they arrived.
///
/// The ledger does not judge whether a round is the right one to record
/// into; the participant only records votes for its current round and
/// evicts everything older once it advances.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteLedger {
    rounds: BTreeMap<Round, Vec<Vote>>,
}

impl VoteLedger {
    /// Appends `vote` to its round. A second vote from the same sender for
    /// the same round is not recorded and `false` is returned.
    pub fn record(&mut self, vote: Vote) -> bool {
        let votes = self.rounds.entry(vote.round).or_default();
        if votes.iter().any(|v| v.sender == vote.sender) {
            return false;
        }
        votes.push(vote);
        true
    }

    pub fn votes(&self, round: Round) -> &[Vote] {
        self.rounds.get(&round).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn len(&self, round: Round) -> usize {
        self.votes(round).len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.values().all(Vec::is_empty)
    }

    pub fn has_quorum(&self, round: Round, quorum: usize) -> bool {
        self.len(round) >= quorum
    }

    pub fn count(&self, round: Round) -> VoteCount {
        VoteCount::count(self.votes(round))
    }

    /// Drops every round before `round`; they can no longer trigger a decision.
    pub fn evict_before(&mut self, round: Round) {
        self.rounds = self.rounds.split_off(&round);
    }

    pub fn rounds(&self) -> impl Iterator<Item = Round> + '_ {
        self.rounds.keys().copied()
    }

    pub fn clear(&mut self) {
        self.rounds.clear();
    }
}
