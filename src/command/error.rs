//! Error type for command dispatch.

use std::error::Error;

use thiserror::Error;

/// Error returned by the mediator or by a command handler.
///
/// `Bus::send_command` returns mediator errors unchanged; it only adds
/// `EncodeFailed` and `DecodeFailed` for its own serialization steps.
#[derive(Debug, Error)]
pub enum CommandError {
    /// No handler registered for this command name.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// The command could not be serialized for the mediator.
    #[error("encode failed: {0}")]
    EncodeFailed(String),

    /// Input or response deserialization failed.
    #[error("decode failed: {0}")]
    DecodeFailed(String),

    /// Business logic rejected the command (validation, invariant violation).
    #[error("rejected: {0}")]
    Rejected(String),

    /// Target resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Guard rejected the command (input validation failed).
    #[error("guard rejected command: {0}")]
    GuardRejected(String),

    #[error("command error: {0}")]
    Other(#[from] Box<dyn Error + Send + Sync>),
}

impl From<serde_json::Error> for CommandError {
    fn from(err: serde_json::Error) -> Self {
        CommandError::DecodeFailed(err.to_string())
    }
}
