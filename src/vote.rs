use core::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::{NodeId, Result, Round, Value};

/// The `(sender, round, value)` record every participant broadcasts.
///
/// Serialized as the flat document `{"senderId": 2, "k": 0, "x": 1}`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Vote {
    #[serde(rename = "senderId")]
    pub sender: NodeId,
    #[serde(rename = "k")]
    pub round: Round,
    #[serde(rename = "x")]
    pub value: Value,
}

impl Debug for Vote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "R{}-{:?}@{}", self.round, self.value, self.sender)
    }
}

impl Vote {
    pub fn new(sender: NodeId, round: Round, value: Value) -> Self {
        Self {
            sender,
            round,
            value,
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
