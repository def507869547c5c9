use crate::error::Result;
use crate::runtime::handle::Handle;

use std::time::Duration;

/// A producer of completion events, typically an I/O multiplexer.
///
/// The loop consults its source at the start of every tick. Handles it
/// returns are appended to the ready queue and run in that same tick;
/// they usually complete the [`Future`](crate::Future) a task is waiting on.
pub trait EventSource {
    /// Collects handles for events that completed.
    ///
    /// `timeout` is `Some(Duration::ZERO)` when the loop already has work
    /// queued and must not block, and `None` when the loop has nothing else
    /// to do and the source may block until an event arrives.
    fn poll(&mut self, timeout: Option<Duration>) -> Result<Vec<Handle>>;

    /// Returns `true` if no event can ever be produced by this source
    /// without outside interaction.
    ///
    /// An idle source with an empty ready queue means the loop is stalled.
    fn is_idle(&self) -> bool;
}
