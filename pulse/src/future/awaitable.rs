use crate::error::Result;

use std::rc::Rc;

/// Callback invoked with the awaitable that completed.
pub type DoneCallback = Box<dyn FnOnce(Rc<dyn Awaitable>) -> Result<()>>;

/// Type-erased view of something a computation can suspend on.
///
/// Both [`Future`](crate::Future) and [`Task`](crate::Task) implement it. A
/// task keeps the value its computation is currently waiting on as an
/// `Rc<dyn Awaitable>`, which lets it subscribe to completion and forward
/// cancellation without knowing the result type. Cancelling a task through
/// this trait runs the task's own cancellation, so cancellation reaches the
/// innermost awaited future of a chain of tasks.
pub trait Awaitable {
    /// Diagnostic name.
    fn name(&self) -> Option<&str>;

    /// Returns `true` until a result is set or the value is cancelled.
    fn is_pending(&self) -> bool;

    /// Requests cancellation. See [`Future::cancel`](crate::Future::cancel)
    /// and [`Task::cancel`](crate::Task::cancel).
    fn cancel(&self) -> bool;

    /// Outcome without the value: `Ok` when done, the error `result()`
    /// would return otherwise.
    fn outcome(&self) -> Result<()>;

    /// Registers `callback` to run through the loop on completion.
    fn on_done(&self, callback: DoneCallback);
}
