//! Error type shared by every layer of the scheduler.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can go wrong while scheduling, awaiting or driving a
/// computation.
#[derive(Debug, Error)]
pub enum Error {
    /// The future, task or computation was cancelled.
    ///
    /// This is the cancellation signal: it travels through `result()`,
    /// through a task resuming from an awaited future and out of
    /// [`wait`](crate::task::wait).
    #[error("operation was cancelled")]
    Cancelled,

    /// A future was used in a state that does not allow the operation,
    /// such as setting a result twice or reading one that is not ready.
    #[error("invalid future state: {0}")]
    InvalidState(&'static str),

    /// [`wait`](crate::task::wait) was called without any item to wait on.
    #[error("wait requires at least one future or computation")]
    EmptyWait,

    /// The loop is running but nothing can ever be scheduled again.
    #[error("loop stalled: no scheduled handles and no pending events")]
    Stalled,

    /// The configured tick budget was exhausted.
    #[error("tick limit of {0} exceeded")]
    TickLimit(u64),

    /// A computation failed with an application error.
    #[error(transparent)]
    Failed(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Builds an application failure from a message.
    pub fn failed(message: impl Into<String>) -> Self {
        Error::Failed(message.into().into())
    }

    /// Returns `true` if this is the cancellation signal.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}
