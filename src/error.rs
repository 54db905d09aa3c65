use thiserror::Error;

use crate::NodeId;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Participant is faulty and rejects all protocol operations")]
    Faulty,
    #[error("Participant has been stopped")]
    Killed,
    #[error("Participant has already started")]
    AlreadyStarted,
    #[error("Consensus requires n > 2f and n > 0 (n: {n}, f: {f})")]
    InvalidConfig { n: usize, f: usize },
    #[error("Vote claims to come from the receiving participant {id}")]
    SelfAddressed { id: NodeId },
    #[error("Participant {id} is not one of the {n} participants")]
    UnknownParticipant { id: NodeId, n: usize },
    #[error("A binary value must be 0 or 1, got {0}")]
    InvalidValue(u8),
    #[error("No operation is served at {method} {path}")]
    UnknownRoute { method: String, path: String },
    #[error("Failed to encode or decode JSON")]
    Encoding(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
