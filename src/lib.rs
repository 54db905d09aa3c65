//! Randomized binary consensus in the style of Ben-Or.
//!
//! `N` participants, up to `F` of which may be faulty, agree on a single
//! [`Value`] as long as `N > 2F`. Each participant is a [`Participant`] state
//! machine: it never touches the network itself, it hands back the [`Vote`]
//! that must be broadcast and leaves delivery to a [`Transport`].

pub mod broadcaster;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod ledger;
pub mod participant;
pub mod value;
pub mod vote;
pub mod vote_count;

pub use crate::broadcaster::{Broadcaster, DeliveryError, Transport};
pub use crate::config::{Config, BASE_NODE_PORT};
pub use crate::endpoint::{Body, Endpoint, Request, Response};
pub use crate::error::{Error, Result};
pub use crate::ledger::VoteLedger;
pub use crate::participant::{Lifecycle, Participant, ParticipantState, VoteResponse};
pub use crate::value::{Coin, Value};
pub use crate::vote::Vote;
pub use crate::vote_count::{Outcome, VoteCount};
pub use http::{Method, StatusCode};

pub type NodeId = usize;
pub type Round = u64;
