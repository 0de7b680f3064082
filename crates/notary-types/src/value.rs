use std::fmt;

use serde::{Deserialize, Serialize};

/// Amount of native ledger value, in wei.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Wei(u64);

impl Wei {
    /// Wei per finney (10^15).
    pub const PER_FINNEY: u64 = 1_000_000_000_000_000;

    pub const ZERO: Self = Self(0);

    pub const fn new(wei: u64) -> Self {
        Self(wei)
    }

    pub const fn from_finney(finney: u64) -> Self {
        Self(finney * Self::PER_FINNEY)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Wei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} wei", self.0)
    }
}
