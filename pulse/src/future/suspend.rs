use super::awaitable::Awaitable;
use super::core::Future;
use crate::error::Result;
use crate::runtime::context;
use crate::task::coroutine::Yielded;

use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use tracing::warn;

/// Suspension point produced by `.await`ing a [`Future`] or a
/// [`Task`](crate::Task).
///
/// The first poll hands the awaited value to the driving task and
/// suspends, even if the value is already complete; the task resumes the
/// computation once it completes. The second poll yields either the error
/// thrown into the computation or the awaited result.
#[must_use = "suspension points do nothing unless `.await`ed"]
pub struct Suspend<T> {
    /// What the driving task waits on and may cancel.
    target: Rc<dyn Awaitable>,

    /// Where the result is read from.
    future: Future<T>,

    /// Set once the suspension value was handed out.
    suspended: bool,
}

impl<T> Suspend<T> {
    pub(crate) fn new(target: Rc<dyn Awaitable>, future: Future<T>) -> Self {
        Self {
            target,
            future,
            suspended: false,
        }
    }
}

impl<T: Clone + 'static> std::future::Future for Suspend<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
        if !self.suspended {
            self.suspended = true;

            if !context::suspend(Yielded::Future(self.target.clone())) {
                warn!(
                    future = self.target.name().unwrap_or("future"),
                    "awaited outside of a pulse task; nothing will resume it"
                );
            }
            return Poll::Pending;
        }

        if let Some(err) = context::take_thrown() {
            return Poll::Ready(Err(err));
        }

        Poll::Ready(self.future.result())
    }
}
