use log::{debug, warn};
use thiserror::Error;

use crate::{Config, NodeId, Vote};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to deliver {vote:?} to participant {dest}: {reason}")]
pub struct DeliveryError {
    pub dest: NodeId,
    pub vote: Vote,
    pub reason: String,
}

/// Hands a vote to a single peer. How and when it arrives is up to the implementor.
pub trait Transport {
    fn send(&mut self, dest: NodeId, vote: Vote) -> Result<(), DeliveryError>;
}

/// Broadcaster holds the votes a participant has cast but not yet sent.
///
/// Sending is fire-and-forget: every queued vote goes to every peer once,
/// failed deliveries are logged and handed back for diagnostics, and nothing
/// is ever retried.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    self_id: NodeId,
    peers: Vec<NodeId>,
    outgoings: Vec<Vote>,
}

impl Broadcaster {
    pub fn new(self_id: NodeId, config: &Config) -> Self {
        Self {
            self_id,
            peers: config.peers(self_id).collect(),
            outgoings: Vec::new(),
        }
    }

    pub fn broadcast(&mut self, vote: Vote) {
        self.outgoings.push(vote);
    }

    pub fn outgoings(&self) -> &[Vote] {
        &self.outgoings
    }

    pub fn take_outgoings(&mut self) -> Vec<Vote> {
        std::mem::take(&mut self.outgoings)
    }

    /// Sends every queued vote to every peer through `transport`.
    pub fn dispatch(&mut self, transport: &mut impl Transport) -> Vec<DeliveryError> {
        let mut failures = Vec::new();
        for vote in self.take_outgoings() {
            for dest in self.peers.iter().copied() {
                debug!("[BO-{}] sending {:?} to {}", self.self_id, vote, dest);
                if let Err(err) = transport.send(dest, vote) {
                    warn!("[BO-{}] {}", self.self_id, err);
                    failures.push(err);
                }
            }
        }
        failures
    }
}
