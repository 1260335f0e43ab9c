//! Transport Error Types

use std::fmt;

use thiserror::Error;

use crate::result::Abandon;

/// Numeric error codes carried in remote error responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireErrorCode {
    FileUnavailable,
    ServiceUnavailable,
    LogUnavailable,
    /// Requested database does not exist at the responder
    DbUnavailable,
    /// Requested index or entry does not exist at the responder
    EntryUnavailable,
    Busy,
    /// Code not known to this client, preserved as received
    Unknown(u32),
}

impl WireErrorCode {
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => WireErrorCode::FileUnavailable,
            2 => WireErrorCode::ServiceUnavailable,
            3 => WireErrorCode::LogUnavailable,
            4 => WireErrorCode::DbUnavailable,
            5 => WireErrorCode::EntryUnavailable,
            6 => WireErrorCode::Busy,
            other => WireErrorCode::Unknown(other),
        }
    }

    pub fn code(&self) -> u32 {
        match self {
            WireErrorCode::FileUnavailable => 1,
            WireErrorCode::ServiceUnavailable => 2,
            WireErrorCode::LogUnavailable => 3,
            WireErrorCode::DbUnavailable => 4,
            WireErrorCode::EntryUnavailable => 5,
            WireErrorCode::Busy => 6,
            WireErrorCode::Unknown(code) => *code,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WireErrorCode::FileUnavailable => "FILE_UNAVAILABLE",
            WireErrorCode::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            WireErrorCode::LogUnavailable => "LOG_UNAVAILABLE",
            WireErrorCode::DbUnavailable => "DB_UNAVAILABLE",
            WireErrorCode::EntryUnavailable => "ENTRY_UNAVAILABLE",
            WireErrorCode::Busy => "BUSY",
            WireErrorCode::Unknown(_) => "UNKNOWN",
        }
    }
}

impl fmt::Display for WireErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireErrorCode::Unknown(code) => write!(f, "UNKNOWN({})", code),
            known => f.write_str(known.as_str()),
        }
    }
}

/// Failures reported by the transport client
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Responder answered with an error code
    #[error("Remote error {code}: {message}")]
    ErrorCode {
        code: WireErrorCode,
        message: String,
    },

    #[error("Transport I/O error: {0}")]
    Io(String),

    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    #[error("Connection closed")]
    Closed,

    #[error("Request abandoned before a response arrived")]
    Abandoned,
}

impl TransportError {
    pub fn remote(code: WireErrorCode, message: impl Into<String>) -> Self {
        TransportError::ErrorCode {
            code,
            message: message.into(),
        }
    }

    /// Wire code carried by the error, if the responder sent one.
    pub fn wire_code(&self) -> Option<WireErrorCode> {
        match self {
            TransportError::ErrorCode { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl Abandon for TransportError {
    fn abandoned() -> Self {
        TransportError::Abandoned
    }
}
