use std::fmt;

/// Lifecycle state of a [`Future`](crate::Future).
///
/// `Pending` moves to exactly one of the two terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FutureState {
    /// No result yet.
    Pending,

    /// A result was set.
    Done,

    /// The future was cancelled.
    Cancelled,
}

impl fmt::Display for FutureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FutureState::Pending => "pending",
            FutureState::Done => "done",
            FutureState::Cancelled => "cancelled",
        })
    }
}
