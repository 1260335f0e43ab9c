//! Lsn - position in the replicated write-ahead log
//!
//! Ordered by view id first, then sequence number within the view. The
//! pair behaves as one comparable scalar everywhere else in the crate.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::LsnError;

/// A totally ordered log sequence number.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Lsn {
    view_id: u32,
    sequence_no: u64,
}

impl Lsn {
    /// Position of a replica that has applied nothing yet.
    pub const ZERO: Lsn = Lsn {
        view_id: 0,
        sequence_no: 0,
    };

    #[inline]
    pub fn new(view_id: u32, sequence_no: u64) -> Self {
        Self {
            view_id,
            sequence_no,
        }
    }

    #[inline]
    pub fn view_id(&self) -> u32 {
        self.view_id
    }

    #[inline]
    pub fn sequence_no(&self) -> u64 {
        self.sequence_no
    }

    /// The following position in the same view, `None` once the sequence
    /// number is exhausted.
    pub fn next(&self) -> Option<Self> {
        self.sequence_no
            .checked_add(1)
            .map(|sequence_no| Self::new(self.view_id, sequence_no))
    }
}

impl fmt::Display for Lsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.view_id, self.sequence_no)
    }
}

impl FromStr for Lsn {
    type Err = LsnError;

    /// Parses the `"<view>:<seq>"` form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (view, seq) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| LsnError::Malformed(s.to_string()))?;
        let view_id = view
            .parse::<u32>()
            .map_err(|_| LsnError::Malformed(s.to_string()))?;
        let sequence_no = seq
            .parse::<u64>()
            .map_err(|_| LsnError::Malformed(s.to_string()))?;
        Ok(Self::new(view_id, sequence_no))
    }
}
