use core::fmt::{self, Debug, Display};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::Error;

/// A binary consensus value. Encoded on the wire as the integer `0` or `1`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Value {
    Zero,
    One,
}

impl From<Value> for u8 {
    fn from(value: Value) -> Self {
        match value {
            Value::Zero => 0,
            Value::One => 1,
        }
    }
}

impl TryFrom<u8> for Value {
    type Error = Error;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Value::Zero),
            1 => Ok(Value::One),
            other => Err(Error::InvalidValue(other)),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        if b {
            Value::One
        } else {
            Value::Zero
        }
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", u8::from(*self))
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Debug::fmt(self, f)
    }
}

/// Source of the random fallback value used when a round ends without a majority.
///
/// Every `rand::Rng` is a coin, so tests swap in a seeded `StdRng` while
/// production participants flip an entropy-seeded one.
pub trait Coin {
    fn flip(&mut self) -> Value;
}

impl<R: Rng> Coin for R {
    fn flip(&mut self) -> Value {
        Value::from(self.gen::<bool>())
    }
}
