//! LSN Error Types

use thiserror::Error;

use super::position::Lsn;

/// Result type for LSN operations
pub type LsnResult<T> = Result<T, LsnError>;

/// LSN errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LsnError {
    /// The applied position was asked to move backwards. This is an upstream
    /// correctness bug, never a recoverable condition.
    #[error("LSN regression: latest applied is {latest}, refused to move back to {attempted}")]
    Regression { latest: Lsn, attempted: Lsn },

    #[error("Malformed LSN: {0:?}")]
    Malformed(String),

    #[error("Wait-list notifier could not be started: {0}")]
    Notifier(String),
}

impl LsnError {
    /// Regressions are invariant breaches.
    pub fn is_fatal(&self) -> bool {
        matches!(self, LsnError::Regression { .. })
    }
}
