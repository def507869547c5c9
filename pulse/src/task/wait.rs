use super::coroutine::{AsyncCoroutine, Coroutine};
use super::core::Task;
use crate::error::{Error, Result};
use crate::future::core::Future;
use crate::runtime::core::Loop;

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

/// Something [`wait`] can wait on.
pub enum WaitItem<T> {
    /// An existing future, waited on as is.
    Future(Future<T>),

    /// An existing task, waited on as is.
    Task(Task<T>),

    /// A computation that still has to be wrapped in a task.
    Computation(Box<dyn Coroutine<Output = T>>),
}

impl<T: 'static> WaitItem<T> {
    /// Wraps an `async` block as an item to be run as its own task.
    pub fn computation<F>(future: F) -> Self
    where
        F: std::future::Future<Output = Result<T>> + 'static,
    {
        WaitItem::Computation(Box::new(AsyncCoroutine::new(future)))
    }
}

impl<T> From<Future<T>> for WaitItem<T> {
    fn from(future: Future<T>) -> Self {
        WaitItem::Future(future)
    }
}

impl<T> From<Task<T>> for WaitItem<T> {
    fn from(task: Task<T>) -> Self {
        WaitItem::Task(task)
    }
}

impl<T> fmt::Debug for WaitItem<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitItem::Future(_) => f.write_str("WaitItem::Future"),
            WaitItem::Task(_) => f.write_str("WaitItem::Task"),
            WaitItem::Computation(_) => f.write_str("WaitItem::Computation"),
        }
    }
}

/// Returns the future that completes with `item`.
///
/// Futures pass through unchanged. A task yields its completion future,
/// which still belongs to the task: cancelling it cancels the task and
/// its result cannot be set from outside. Computations are wrapped in a
/// new task scheduled on `event_loop`.
pub fn ensure_future<T: 'static>(event_loop: &Loop, item: WaitItem<T>) -> Future<T> {
    match item {
        WaitItem::Future(future) => future,
        WaitItem::Task(task) => task.future().clone(),
        WaitItem::Computation(coroutine) => {
            Task::new(event_loop, "wait item", coroutine).future().clone()
        }
    }
}

/// Waits for every item and returns their results in input order.
///
/// The results are gathered only after all items completed. If any of
/// them was cancelled, the whole call fails with [`Error::Cancelled`] even
/// though the others completed.
///
/// # Errors
///
/// - [`Error::EmptyWait`] if `items` is empty.
/// - [`Error::Cancelled`] if an item was cancelled or the caller was
///   cancelled while waiting.
///
/// # Examples
///
/// ```rust
/// use pulse::{Loop, WaitItem, wait};
///
/// let event_loop = Loop::new();
/// let handle = event_loop.clone();
///
/// let values = event_loop.run(async move {
///     wait(&handle, [
///         WaitItem::computation(async { Ok(1) }),
///         WaitItem::computation(async { Ok(2) }),
///     ])
///     .await
/// });
///
/// assert_eq!(values.unwrap(), vec![1, 2]);
/// ```
pub async fn wait<T, I>(event_loop: &Loop, items: I) -> Result<Vec<T>>
where
    T: Clone + 'static,
    I: IntoIterator<Item = WaitItem<T>>,
{
    let futures: Vec<Future<T>> = items
        .into_iter()
        .map(|item| ensure_future(event_loop, item))
        .collect();

    if futures.is_empty() {
        return Err(Error::EmptyWait);
    }

    let waiter = Future::new(event_loop, format!("waiter for {} futures", futures.len()));
    let remaining = Rc::new(Cell::new(futures.len()));

    for future in &futures {
        let waiter = waiter.clone();
        let remaining = remaining.clone();

        future.add_done_callback(move |_| {
            let left = remaining.get() - 1;
            remaining.set(left);

            trace!(left, "wait item completed");

            // The waiter is already cancelled if the caller was.
            if left == 0 && waiter.is_pending() {
                waiter.set_result(())?;
            }
            Ok(())
        });
    }

    waiter.await?;

    futures.iter().map(Future::result).collect()
}
