//! Error types for the remote controller

use std::time::Duration;
use thiserror::Error;

/// Result type for controller operations
pub type Result<T> = std::result::Result<T, LolRlError>;

/// Controller error types
///
/// Observation timeouts are not represented here: polling returns `None`
/// when nothing arrives in time.
#[derive(Debug, Error)]
pub enum LolRlError {
    /// Queue endpoint could not be reached
    #[error("Broker connection failed: {0}")]
    BrokerConnection(String),

    /// A queue command failed after the connection was established
    #[error("Broker error: {0}")]
    Broker(String),

    /// External server or client binary failed to launch
    #[error("Process spawn failed: {0}")]
    ProcessSpawn(String),

    /// Signalling or reaping an owned process failed
    #[error("Process error: {0}")]
    Process(String),

    /// No expected message within the allotted window
    #[error("Handshake timeout: no `{expected}` within {waited:?}")]
    HandshakeTimeout {
        expected: &'static str,
        waited: Duration,
    },

    /// An unexpected message arrived where a specific command was expected
    #[error("Handshake protocol violation: expected `{expected}`, received {received}")]
    HandshakeProtocolViolation {
        expected: &'static str,
        received: String,
    },

    /// Malformed payload on any channel
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid controller configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation attempted after `close`/`quit`
    #[error("Session closed")]
    SessionClosed,
}

impl LolRlError {
    /// Whether the error ends the session (caller must start a new one)
    pub fn is_fatal(&self) -> bool {
        !matches!(self, LolRlError::Serialization(_))
    }
}

impl From<serde_json::Error> for LolRlError {
    fn from(err: serde_json::Error) -> Self {
        LolRlError::Serialization(err.to_string())
    }
}
