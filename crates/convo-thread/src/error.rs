//! Error types for convo-thread

use thiserror::Error;

/// Result type alias using convo-thread Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can surface from dispatching a send.
///
/// Failures scoped to a single message are not represented here: adapters
/// record those on the message itself via `Helpers::set_error`, and the
/// message renders in a failed state while the thread keeps going.
#[derive(Error, Debug)]
pub enum Error {
    /// The adapter failed outside the helper-call surface
    #[error("adapter error: {0}")]
    Adapter(String),

    /// The in-flight send was cancelled
    #[error("send cancelled")]
    Cancelled,

    /// A generic engine error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an adapter error from any displayable cause
    pub fn adapter(message: impl Into<String>) -> Self {
        Self::Adapter(message.into())
    }

    /// Check if this error is a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}
