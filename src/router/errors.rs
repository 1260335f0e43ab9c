//! Router Error Types
//!
//! Every failure a caller can observe through an `AsyncResult` is one of
//! these. Transport faults never escape untranslated.

use std::fmt;

use thiserror::Error;

use crate::result::Abandon;

/// Result type for routed operations
pub type RouterResult<T> = Result<T, RouterError>;

/// Stable error codes exposed to callers and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// No primary is known, quorum is lost
    ReplicationUnavailable,
    /// Target database does not exist on the serving replica
    NoSuchDatabase,
    /// Target index or entry does not exist on the serving replica
    NoSuchIndex,
    /// Catch-all transport or protocol fault
    ReplicationFailure,
    /// Operation cannot be forwarded across the remote boundary
    UnsupportedOperation,
    /// Database handle has been shut down
    Shutdown,
}

impl ErrorCode {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ReplicationUnavailable => "REPLICATION_UNAVAILABLE",
            ErrorCode::NoSuchDatabase => "NO_SUCH_DATABASE",
            ErrorCode::NoSuchIndex => "NO_SUCH_INDEX",
            ErrorCode::ReplicationFailure => "REPLICATION_FAILURE",
            ErrorCode::UnsupportedOperation => "UNSUPPORTED_OPERATION",
            ErrorCode::Shutdown => "SHUTDOWN",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Router errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    /// No primary known (quorum not established)
    #[error("Replication unavailable: {0}")]
    ReplicationUnavailable(String),

    /// Database unavailable at the serving replica
    #[error("No such database: {0}")]
    NoSuchDatabase(String),

    /// Index or entry unavailable at the serving replica
    #[error("No such index: {0}")]
    NoSuchIndex(String),

    /// Transport or protocol fault
    #[error("Replication failure: {0}")]
    ReplicationFailure(String),

    /// Non-serializable operation attempted against a remote target
    #[error("Operation not supported in routed mode: {0}")]
    UnsupportedOperation(String),

    /// Operation attempted after shutdown
    #[error("Database is shut down: {0}")]
    Shutdown(String),
}

impl RouterError {
    /// Error raised when no primary can be trusted.
    pub fn no_quorum() -> Self {
        RouterError::ReplicationUnavailable(
            "a majority of replicas is currently not reachable, no primary is known".to_string(),
        )
    }

    /// Error raised when an operation cannot cross the remote boundary.
    pub fn unsupported(operation: &str) -> Self {
        RouterError::UnsupportedOperation(format!(
            "{} cannot be forwarded to a remote primary",
            operation
        ))
    }

    /// Returns the stable error code
    pub fn code(&self) -> ErrorCode {
        match self {
            RouterError::ReplicationUnavailable(_) => ErrorCode::ReplicationUnavailable,
            RouterError::NoSuchDatabase(_) => ErrorCode::NoSuchDatabase,
            RouterError::NoSuchIndex(_) => ErrorCode::NoSuchIndex,
            RouterError::ReplicationFailure(_) => ErrorCode::ReplicationFailure,
            RouterError::UnsupportedOperation(_) => ErrorCode::UnsupportedOperation,
            RouterError::Shutdown(_) => ErrorCode::Shutdown,
        }
    }

    /// Whether a later attempt may succeed without caller changes.
    ///
    /// The router itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RouterError::ReplicationUnavailable(_) | RouterError::ReplicationFailure(_)
        )
    }
}

impl Abandon for RouterError {
    fn abandoned() -> Self {
        RouterError::ReplicationFailure("request abandoned before completion".to_string())
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(String),

    #[error("Invalid config JSON: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
