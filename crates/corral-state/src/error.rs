//! Error types for the corral history store and recorder.

use thiserror::Error;

/// Result type alias for history operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur while recording or persisting operation history.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to open database: {0}")]
    Open(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("table error: {0}")]
    Table(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("deserialization error: {0}")]
    Deserialize(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// The outcome handed to the recorder cannot be recorded as given.
    #[error("invalid outcome for {rsc}: {reason}")]
    InvalidOutcome { rsc: String, reason: String },
}
