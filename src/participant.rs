use log::{debug, info, warn};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::vote_count::Outcome;
use crate::{Broadcaster, Coin, Config, Error, NodeId, Result, Round, Value, Vote, VoteLedger};

/// Where a participant is in its lifetime. `Decided` and `Killed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Idle,
    Running { round: Round },
    Decided { round: Round, value: Value },
    /// A participant stopped after deciding still remembers what it decided.
    Killed { decision: Option<(Round, Value)> },
}

/// Snapshot served to whoever asks for a participant's state.
///
/// Field names follow the wire format: `x` is the current value, `k` the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantState {
    pub killed: bool,
    pub x: Option<Value>,
    pub decided: bool,
    pub k: Option<Round>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteResponse {
    /// The vote was for another round, repeated a sender, or arrived after deciding.
    Dropped,
    WaitingForMoreVotes,
    /// No majority; we flipped the coin and cast a vote for this round.
    NextRound(Round),
    Decided(Value),
}

#[derive(Debug)]
pub struct Participant<C: Coin = StdRng> {
    id: NodeId,
    config: Config,
    faulty: bool,
    initial_value: Value,
    lifecycle: Lifecycle,
    value: Option<Value>,
    ledger: VoteLedger,
    broadcaster: Broadcaster,
    coin: C,
}

impl Participant<StdRng> {
    pub fn from_entropy(
        id: NodeId,
        config: Config,
        initial_value: Value,
        faulty: bool,
    ) -> Result<Self> {
        Self::new(id, config, initial_value, faulty, StdRng::from_entropy())
    }
}

impl<C: Coin> Participant<C> {
    pub fn new(
        id: NodeId,
        config: Config,
        initial_value: Value,
        faulty: bool,
        coin: C,
    ) -> Result<Self> {
        config.check_id(id)?;
        Ok(Self {
            id,
            config,
            faulty,
            initial_value,
            lifecycle: Lifecycle::Idle,
            value: None,
            ledger: VoteLedger::default(),
            broadcaster: Broadcaster::new(id, &config),
            coin,
        })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn is_faulty(&self) -> bool {
        self.faulty
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn ledger(&self) -> &VoteLedger {
        &self.ledger
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    pub fn broadcaster_mut(&mut self) -> &mut Broadcaster {
        &mut self.broadcaster
    }

    /// The round votes are currently accepted for. An idle participant
    /// already collects round 0 so early votes from its peers are not lost.
    pub fn round(&self) -> Option<Round> {
        match self.lifecycle {
            Lifecycle::Idle => Some(0),
            Lifecycle::Running { round } | Lifecycle::Decided { round, .. } => Some(round),
            Lifecycle::Killed { decision } => decision.map(|(round, _)| round),
        }
    }

    pub fn decision(&self) -> Option<Value> {
        match self.lifecycle {
            Lifecycle::Decided { value, .. } => Some(value),
            Lifecycle::Killed { decision } => decision.map(|(_, value)| value),
            _ => None,
        }
    }

    pub fn is_killed(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Killed { .. })
    }

    /// Liveness as the outside world sees it: only faulty participants report a failure.
    pub fn status(&self) -> Result<()> {
        if self.faulty {
            Err(Error::Faulty)
        } else {
            Ok(())
        }
    }

    pub fn state(&self) -> ParticipantState {
        match self.lifecycle {
            Lifecycle::Killed { decision } => ParticipantState {
                killed: true,
                x: decision.map(|(_, value)| value),
                decided: decision.is_some(),
                k: decision.map(|(round, _)| round),
            },
            _ if self.faulty => ParticipantState {
                killed: false,
                x: None,
                decided: false,
                k: Some(0),
            },
            Lifecycle::Idle => ParticipantState {
                killed: false,
                x: Some(self.initial_value),
                decided: false,
                k: Some(0),
            },
            Lifecycle::Running { round } => ParticipantState {
                killed: false,
                x: self.value,
                decided: false,
                k: Some(round),
            },
            Lifecycle::Decided { round, value } => ParticipantState {
                killed: false,
                x: Some(value),
                decided: true,
                k: Some(round),
            },
        }
    }

    fn check_participating(&self) -> Result<()> {
        if self.faulty {
            Err(Error::Faulty)
        } else if self.is_killed() {
            Err(Error::Killed)
        } else {
            Ok(())
        }
    }

    /// Enters round 0 with our initial value and queues its broadcast.
    pub fn start(&mut self) -> Result<VoteResponse> {
        if let Err(err) = self.check_participating() {
            warn!("[BO-{}] refusing to start: {}", self.id, err);
            return Err(err);
        }
        if self.lifecycle != Lifecycle::Idle {
            return Err(Error::AlreadyStarted);
        }

        info!(
            "[BO-{}] starting with value {:?} (n: {}, f: {})",
            self.id, self.initial_value, self.config.n, self.config.f
        );
        Ok(self.cast(0, self.initial_value))
    }

    /// Moves to `Killed` from any state. Votes queued but not yet sent are discarded.
    pub fn stop(&mut self) {
        if self.is_killed() {
            debug!("[BO-{}] already stopped", self.id);
            return;
        }
        let decision = match self.lifecycle {
            Lifecycle::Decided { round, value } => Some((round, value)),
            _ => None,
        };
        info!("[BO-{}] stopping (decision: {:?})", self.id, decision);
        self.lifecycle = Lifecycle::Killed { decision };
        self.value = decision.map(|(_, value)| value);
        self.ledger.clear();
        self.broadcaster.take_outgoings();
    }

    pub fn receive_vote(&mut self, vote: Vote) -> Result<VoteResponse> {
        self.check_participating()?;
        self.config.check_id(vote.sender)?;
        if vote.sender == self.id {
            warn!("[BO-{}] rejecting {:?} carrying our own id", self.id, vote);
            return Err(Error::SelfAddressed { id: self.id });
        }

        let round = match self.lifecycle {
            Lifecycle::Idle => 0,
            Lifecycle::Running { round } => round,
            Lifecycle::Decided { .. } | Lifecycle::Killed { .. } => {
                debug!("[BO-{}] already decided, dropping {:?}", self.id, vote);
                return Ok(VoteResponse::Dropped);
            }
        };

        if vote.round != round {
            debug!(
                "[BO-{}] dropping {:?}, we are at round {}",
                self.id, vote, round
            );
            return Ok(VoteResponse::Dropped);
        }

        if !self.ledger.record(vote) {
            debug!("[BO-{}] dropping repeated {:?}", self.id, vote);
            return Ok(VoteResponse::Dropped);
        }
        debug!(
            "[BO-{}] logged {:?} ({}/{})",
            self.id,
            vote,
            self.ledger.len(round),
            self.config.quorum()
        );

        Ok(self.check_quorum())
    }

    // Records our own vote for `round`, queues it for broadcast and sees
    // whether it completes the round.
    fn cast(&mut self, round: Round, value: Value) -> VoteResponse {
        self.lifecycle = Lifecycle::Running { round };
        self.value = Some(value);
        self.ledger.evict_before(round);

        let vote = Vote::new(self.id, round, value);
        let recorded = self.ledger.record(vote);
        debug_assert!(recorded, "own vote for round {} already logged", round);
        self.broadcaster.broadcast(vote);

        self.check_quorum()
    }

    fn check_quorum(&mut self) -> VoteResponse {
        let round = match self.lifecycle {
            Lifecycle::Running { round } => round,
            _ => return VoteResponse::WaitingForMoreVotes,
        };

        if !self.ledger.has_quorum(round, self.config.quorum()) {
            return VoteResponse::WaitingForMoreVotes;
        }

        let count = self.ledger.count(round);
        match count.outcome(&self.config) {
            Outcome::Decide(value) => {
                info!(
                    "[BO-{}] decided {:?} at round {} ({:?})",
                    self.id, value, round, count.values
                );
                self.lifecycle = Lifecycle::Decided { round, value };
                self.value = Some(value);
                self.ledger.clear();
                VoteResponse::Decided(value)
            }
            Outcome::NoMajority => {
                let next_value = self.coin.flip();
                info!(
                    "[BO-{}] no majority at round {} ({:?}), moving on with {:?}",
                    self.id, round, count.values, next_value
                );
                match self.cast(round + 1, next_value) {
                    VoteResponse::WaitingForMoreVotes => VoteResponse::NextRound(round + 1),
                    resp => resp,
                }
            }
        }
    }
}
