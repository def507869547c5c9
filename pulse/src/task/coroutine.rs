use crate::error::{Error, Result};
use crate::future::awaitable::Awaitable;
use crate::runtime::context;

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use tracing::trace;

/// How a suspended computation is resumed.
#[derive(Debug)]
pub enum Resume {
    /// Continue normally.
    Next,

    /// Raise this error at the suspension point.
    Throw(Error),
}

/// What a computation suspended on.
#[derive(Clone)]
pub enum Yielded {
    /// Resume once this completes.
    Future(Rc<dyn Awaitable>),

    /// Plain suspension marker: resume on the next tick.
    Marker,
}

impl fmt::Debug for Yielded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Yielded::Future(fut) => f
                .debug_tuple("Future")
                .field(&fut.name().unwrap_or("future"))
                .finish(),
            Yielded::Marker => f.write_str("Marker"),
        }
    }
}

/// Outcome of one resumption.
#[derive(Debug)]
pub enum CoroutineState<T> {
    /// The computation is waiting; resume it later.
    Suspended(Yielded),

    /// The computation finished with a value.
    Complete(T),

    /// The computation raised an error.
    Failed(Error),
}

/// A suspendable computation.
///
/// Every call to [`resume`](Self::resume) runs the computation up to its
/// next suspension point. Resumption carries either nothing or an error to
/// raise where the computation is suspended, and the outcome carries the
/// suspension value, the final value or the error the computation raised.
///
/// Native `async` blocks are adapted with [`AsyncCoroutine`]; explicit state
/// machines can implement this trait directly.
pub trait Coroutine {
    /// Value produced on completion.
    type Output;

    /// Runs the computation until it suspends, completes or fails.
    fn resume(&mut self, input: Resume) -> CoroutineState<Self::Output>;
}

impl<C: Coroutine + ?Sized> Coroutine for Box<C> {
    type Output = C::Output;

    fn resume(&mut self, input: Resume) -> CoroutineState<Self::Output> {
        (**self).resume(input)
    }
}

/// Adapter driving an `async` block as a [`Coroutine`].
///
/// Suspension points inside the block are `.await`s on
/// [`Future`](crate::Future)s and [`Task`](crate::Task)s, which yield the
/// awaited value, and [`yield_now`](crate::yield_now), which yields the
/// marker. Awaiting anything else that returns `Poll::Pending` behaves like
/// the marker: the block is polled again on the next tick.
///
/// A thrown error is handed to the suspension point being resumed, which
/// returns it as `Err`. Throwing into a block that never ran fails it
/// without running any of it.
pub struct AsyncCoroutine<F> {
    future: Pin<Box<F>>,
    started: bool,

    /// Thrown error no suspension point took, redelivered on the next
    /// resumption.
    unclaimed: Option<Error>,
}

impl<F> AsyncCoroutine<F> {
    /// Wraps `future`; it is not polled until the first resumption.
    pub fn new(future: F) -> Self {
        Self {
            future: Box::pin(future),
            started: false,
            unclaimed: None,
        }
    }
}

impl<F, T> Coroutine for AsyncCoroutine<F>
where
    F: Future<Output = Result<T>>,
{
    type Output = T;

    fn resume(&mut self, input: Resume) -> CoroutineState<T> {
        let thrown = match input {
            Resume::Next => self.unclaimed.take(),
            Resume::Throw(err) => Some(err),
        };

        if !self.started {
            self.started = true;

            if let Some(err) = thrown {
                return CoroutineState::Failed(err);
            }
        }

        let mut cx = Context::from_waker(Waker::noop());
        let (poll, frame) = context::enter_step(thrown, || self.future.as_mut().poll(&mut cx));

        match poll {
            Poll::Ready(Ok(value)) => CoroutineState::Complete(value),
            Poll::Ready(Err(err)) => CoroutineState::Failed(err),
            Poll::Pending => {
                if let Some(err) = frame.thrown {
                    trace!(error = %err, "thrown error not taken by a suspension point");
                    self.unclaimed = Some(err);
                }
                CoroutineState::Suspended(frame.yielded.unwrap_or(Yielded::Marker))
            }
        }
    }
}
