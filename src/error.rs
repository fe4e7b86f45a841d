//! Error types for mapbridge
//!
//! `BridgeError` is the closed taxonomy surfaced by every execution. Callers
//! match on the variant (or its stable [`BridgeError::code`]) rather than on
//! the human-readable text.

use thiserror::Error;

/// Classified failure of a bridge execution
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BridgeError {
    /// The script host raised an exception with a readable reason
    #[error("Host exception {code}: {reason}")]
    HostException {
        /// Code reported by the host
        code: i64,
        /// Reason extracted from the host exception
        reason: String,
    },

    /// The host returned a value shape the decoder does not accept
    #[error("Invalid result type: {0}")]
    InvalidResultType(String),

    /// The decoded value does not fit the type the command asked for
    #[error("Unsupported return type: {0}")]
    UnsupportedReturnType(String),

    /// The host failed without a usable explanation
    #[error("Unknown failure: {0}")]
    UnknownFailure(String),

    /// No executor is attached to the bridge
    #[error("Script host is not ready")]
    HostNotReady,

    /// The attached executor's owner has been dropped
    #[error("Script host has no parent")]
    MissingParent,
}

impl BridgeError {
    /// Stable numeric code for this variant
    ///
    /// Codes are unique per variant and never change between releases.
    pub fn code(&self) -> u32 {
        match self {
            BridgeError::HostException { .. } => 1,
            BridgeError::InvalidResultType(_) => 2,
            BridgeError::UnsupportedReturnType(_) => 3,
            BridgeError::UnknownFailure(_) => 4,
            BridgeError::HostNotReady => 5,
            BridgeError::MissingParent => 6,
        }
    }

    /// Code reported by the host, for host exceptions
    pub fn host_code(&self) -> Option<i64> {
        match self {
            BridgeError::HostException { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Human-readable reason without the variant prefix
    pub fn reason(&self) -> String {
        match self {
            BridgeError::HostException { reason, .. } => reason.clone(),
            BridgeError::InvalidResultType(desc)
            | BridgeError::UnsupportedReturnType(desc)
            | BridgeError::UnknownFailure(desc) => desc.clone(),
            BridgeError::HostNotReady => "no executor attached".to_string(),
            BridgeError::MissingParent => "executor owner was dropped".to_string(),
        }
    }
}

/// Convenience result alias for bridge executions
pub type BridgeResult<T> = std::result::Result<T, BridgeError>;

/// Errors raised while constructing a command
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    /// A name that must appear as a bare script identifier is not one
    #[error("Invalid script identifier '{0}'")]
    InvalidIdentifier(String),

    /// A numeric field must be finite
    #[error("Non-finite value for {field}: {value}")]
    NonFinite {
        /// Field name
        field: &'static str,
        /// Offending value
        value: f64,
    },

    /// A structured field has the wrong JSON shape
    #[error("Invalid {field}: {detail}")]
    InvalidShape {
        /// Field name
        field: &'static str,
        /// Description of the problem
        detail: String,
    },
}

/// Convenience result alias for command construction
pub type CommandResult<T> = std::result::Result<T, CommandError>;

/// Errors raised while reading host messages
///
/// These never reach the delegate; the event processor logs and drops them.
#[derive(Debug, Error)]
pub enum EventError {
    /// Message body is not valid JSON
    #[error("Malformed host message: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Message lacks a usable `name`
    #[error("Host message has no event name")]
    MissingName,

    /// Payload is present but not a JSON object
    #[error("Payload for '{0}' is not an object")]
    PayloadNotObject(String),
}

/// Convenience result alias for event parsing
pub type EventResult<T> = std::result::Result<T, EventError>;
