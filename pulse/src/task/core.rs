use super::coroutine::{AsyncCoroutine, Coroutine, CoroutineState, Resume, Yielded};
use crate::error::{Error, Result};
use crate::future::awaitable::{Awaitable, DoneCallback};
use crate::future::core::Future;
use crate::future::state::FutureState;
use crate::future::suspend::Suspend;
use crate::runtime::core::Loop;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::IntoFuture;
use std::rc::{Rc, Weak};

use tracing::debug;

/// A [`Future`] produced by driving a computation on a [`Loop`].
///
/// A `Task` resumes its computation one step per scheduled handle. When the
/// computation suspends on a future, the task subscribes to that future and
/// is not scheduled again until it completes; when it suspends on the plain
/// marker, the task reschedules itself for the next tick. The computation's
/// value completes the task, and a cancellation raised by the computation
/// cancels it.
///
/// Dropping a `Task` does not stop it; the loop keeps it alive until it
/// completes.
pub struct Task<T> {
    inner: Rc<Inner<T>>,
}

struct Inner<T> {
    /// Completion state of the task itself.
    future: Future<T>,

    /// Loop the task schedules its steps on.
    event_loop: Loop,

    /// The computation; taken while it runs and dropped once finished.
    coroutine: RefCell<Option<Box<dyn Coroutine<Output = T>>>>,

    /// What the computation is currently suspended on.
    awaited: RefCell<Option<Rc<dyn Awaitable>>>,

    /// Cancellation requested while nothing cancellable was awaited.
    must_cancel: Cell<bool>,
}

impl<T: 'static> Task<T> {
    /// Wraps `coroutine` in a task and schedules its first step.
    pub fn new<C>(event_loop: &Loop, name: impl Into<String>, coroutine: C) -> Self
    where
        C: Coroutine<Output = T> + 'static,
    {
        let task = Self {
            inner: Rc::new(Inner {
                future: Future::new(event_loop, name),
                event_loop: event_loop.clone(),
                coroutine: RefCell::new(Some(Box::new(coroutine))),
                awaited: RefCell::new(None),
                must_cancel: Cell::new(false),
            }),
        };

        let owner: Weak<Inner<T>> = Rc::downgrade(&task.inner);
        task.inner.future.set_owner(move || match owner.upgrade() {
            Some(inner) => Task { inner }.cancel(),
            None => false,
        });

        task.schedule(None);
        task
    }

    /// Wraps an `async` block in a task and schedules its first step.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pulse::{Loop, Task};
    ///
    /// let event_loop = Loop::new();
    /// let handle = event_loop.clone();
    ///
    /// let sum = event_loop.run(async move {
    ///     let a = Task::spawn(&handle, "a", async { Ok(1) });
    ///     let b = Task::spawn(&handle, "b", async { Ok(2) });
    ///     Ok(a.await? + b.await?)
    /// });
    ///
    /// assert_eq!(sum.unwrap(), 3);
    /// ```
    pub fn spawn<F>(event_loop: &Loop, name: impl Into<String>, future: F) -> Self
    where
        F: std::future::Future<Output = Result<T>> + 'static,
    {
        Self::new(event_loop, name, AsyncCoroutine::new(future))
    }

    /// Returns the task's name.
    pub fn name(&self) -> &str {
        self.inner.future.name().unwrap_or("task")
    }

    /// Returns the current state.
    pub fn state(&self) -> FutureState {
        self.inner.future.state()
    }

    /// Returns `true` if the computation completed with a value.
    pub fn done(&self) -> bool {
        self.inner.future.done()
    }

    /// Returns `true` if the task ended cancelled.
    pub fn cancelled(&self) -> bool {
        self.inner.future.cancelled()
    }

    /// Returns `true` until the task is done or cancelled.
    pub fn is_pending(&self) -> bool {
        self.inner.future.is_pending()
    }

    /// Registers `callback` to run once the task completes.
    ///
    /// The callback receives the task's completion future; cancelling it
    /// cancels the task.
    pub fn add_done_callback<F>(&self, callback: F)
    where
        F: FnOnce(Future<T>) -> Result<()> + 'static,
    {
        self.inner.future.add_done_callback(callback);
    }

    /// Requests cancellation of the task.
    ///
    /// If the computation is suspended on something that can be cancelled,
    /// that is cancelled and the computation is resumed with
    /// [`Error::Cancelled`] once it completes. Otherwise the request is
    /// latched and the error is raised into the computation on its next
    /// step.
    ///
    /// Returns `false` if the task already completed.
    pub fn cancel(&self) -> bool {
        if !self.is_pending() {
            return false;
        }

        let awaited = self.inner.awaited.borrow().clone();
        if let Some(awaited) = awaited {
            if awaited.cancel() {
                debug!(task = self.name(), "cancelled awaited future");
                return true;
            }
        }

        debug!(task = self.name(), "cancellation latched for next step");
        self.inner.must_cancel.set(true);
        true
    }

    /// Drops the computation and whatever it awaits.
    ///
    /// Used once nothing can drive the task anymore; the task stays
    /// pending forever.
    pub(crate) fn abandon(&self) {
        let coroutine = self.inner.coroutine.borrow_mut().take();
        let awaited = self.inner.awaited.borrow_mut().take();

        if coroutine.is_some() {
            debug!(task = self.name(), "task abandoned");
        }

        drop(awaited);
        drop(coroutine);
    }

    pub(crate) fn future(&self) -> &Future<T> {
        &self.inner.future
    }

    /// Schedules a step, optionally raising `error` into the computation.
    fn schedule(&self, error: Option<Error>) {
        let task = self.clone();
        self.inner
            .event_loop
            .schedule(self.name(), move |error| task.step(error), error);
    }

    /// Resumes the computation once and acts on the outcome.
    ///
    /// Errors other than cancellation escape to the loop.
    fn step(&self, error: Option<Error>) -> Result<()> {
        self.inner.awaited.replace(None);

        let mut error = error;
        if self.inner.must_cancel.replace(false) && !matches!(error, Some(Error::Cancelled)) {
            error = Some(Error::Cancelled);
        }

        let Some(mut coroutine) = self.inner.coroutine.borrow_mut().take() else {
            return Ok(());
        };

        let input = match error {
            Some(err) => Resume::Throw(err),
            None => Resume::Next,
        };

        match coroutine.resume(input) {
            CoroutineState::Complete(value) => {
                debug!(task = self.name(), "task done");
                self.inner.future.complete(value)?;
            }
            CoroutineState::Failed(Error::Cancelled) => {
                debug!(task = self.name(), "task cancelled");
                self.inner.future.cancel_now();
            }
            CoroutineState::Failed(err) => {
                debug!(task = self.name(), error = %err, "task failed");
                return Err(err);
            }
            CoroutineState::Suspended(Yielded::Future(awaited)) => {
                self.inner.coroutine.replace(Some(coroutine));

                let task = self.clone();
                awaited.on_done(Box::new(move |done| task.wakeup(done)));
                self.inner.awaited.replace(Some(awaited.clone()));

                if self.inner.must_cancel.get() && awaited.cancel() {
                    self.inner.must_cancel.set(false);
                }
            }
            CoroutineState::Suspended(Yielded::Marker) => {
                self.inner.coroutine.replace(Some(coroutine));
                self.schedule(None);
            }
        }

        Ok(())
    }

    /// Called once the awaited value completed.
    fn wakeup(&self, done: Rc<dyn Awaitable>) -> Result<()> {
        match done.outcome() {
            Ok(()) => self.schedule(None),
            Err(err) => self.schedule(Some(err)),
        }
        Ok(())
    }
}

impl<T: Clone + 'static> Task<T> {
    /// Returns a copy of the computation's value.
    ///
    /// # Errors
    ///
    /// - [`Error::Cancelled`] if the task was cancelled.
    /// - [`Error::InvalidState`] if it has not completed.
    pub fn result(&self) -> Result<T> {
        self.inner.future.result()
    }
}

impl<T> Clone for Task<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: 'static> Awaitable for Task<T> {
    fn name(&self) -> Option<&str> {
        Some(Task::name(self))
    }

    fn is_pending(&self) -> bool {
        Task::is_pending(self)
    }

    fn cancel(&self) -> bool {
        Task::cancel(self)
    }

    fn outcome(&self) -> Result<()> {
        Awaitable::outcome(&self.inner.future)
    }

    fn on_done(&self, callback: DoneCallback) {
        let task = self.clone();
        self.inner
            .future
            .add_done_callback(move |_| callback(Rc::new(task)));
    }
}

impl<T: Clone + 'static> IntoFuture for Task<T> {
    type Output = Result<T>;
    type IntoFuture = Suspend<T>;

    fn into_future(self) -> Suspend<T> {
        let future = self.inner.future.clone();
        Suspend::new(Rc::new(self), future)
    }
}

impl<T: Clone + 'static> IntoFuture for &Task<T> {
    type Output = Result<T>;
    type IntoFuture = Suspend<T>;

    fn into_future(self) -> Suspend<T> {
        self.clone().into_future()
    }
}

impl<T: 'static> fmt::Debug for Task<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name())
            .field("state", &self.state())
            .field("must_cancel", &self.inner.must_cancel.get())
            .finish()
    }
}
