use super::awaitable::{Awaitable, DoneCallback};
use super::state::FutureState;
use super::suspend::Suspend;
use crate::error::{Error, Result};
use crate::runtime::core::Loop;

use std::cell::RefCell;
use std::fmt;
use std::future::IntoFuture;
use std::mem;
use std::rc::Rc;

use tracing::trace;

/// Callback stored on a future until it completes.
type Callback<T> = Box<dyn FnOnce(Future<T>) -> Result<()>>;

/// Cancellation routed to whatever drives the future to completion.
type CancelHook = Rc<dyn Fn() -> bool>;

/// A one-shot result cell with completion callbacks.
///
/// A `Future` starts pending and is completed exactly once, either with
/// [`set_result`](Self::set_result) or [`cancel`](Self::cancel).
/// Completion callbacks never run inline: they are scheduled on the
/// [`Loop`] the future belongs to, even when registered after completion.
///
/// `Future` is a shared handle; clones observe the same cell. Inside a
/// computation driven by a [`Task`](crate::Task) it can be `.await`ed.
///
/// This is unrelated to [`std::future::Future`]; it plays the role of the
/// value being waited for, not of the computation doing the waiting.
pub struct Future<T> {
    inner: Rc<Inner<T>>,
}

struct Inner<T> {
    /// Diagnostic name.
    name: Option<String>,

    /// Loop used to run completion callbacks.
    event_loop: Loop,

    /// Current state and, once done, the result.
    slot: RefCell<Slot<T>>,

    /// Callbacks registered while pending.
    callbacks: RefCell<Vec<Callback<T>>>,

    /// Set when a task owns the cell; only the task completes it.
    owner: RefCell<Option<CancelHook>>,
}

enum Slot<T> {
    Pending,
    Done(T),
    Cancelled,
}

impl<T: 'static> Future<T> {
    /// Creates a pending future bound to `event_loop`.
    pub fn new(event_loop: &Loop, name: impl Into<String>) -> Self {
        Self::with_name(event_loop, Some(name.into()))
    }

    /// Creates a pending future without a name.
    pub fn unnamed(event_loop: &Loop) -> Self {
        Self::with_name(event_loop, None)
    }

    fn with_name(event_loop: &Loop, name: Option<String>) -> Self {
        Self {
            inner: Rc::new(Inner {
                name,
                event_loop: event_loop.clone(),
                slot: RefCell::new(Slot::Pending),
                callbacks: RefCell::new(Vec::new()),
                owner: RefCell::new(None),
            }),
        }
    }

    /// Returns the future's name, if it has one.
    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// Returns the current state.
    pub fn state(&self) -> FutureState {
        match &*self.inner.slot.borrow() {
            Slot::Pending => FutureState::Pending,
            Slot::Done(_) => FutureState::Done,
            Slot::Cancelled => FutureState::Cancelled,
        }
    }

    /// Returns `true` if a result was set.
    pub fn done(&self) -> bool {
        self.state() == FutureState::Done
    }

    /// Returns `true` if the future was cancelled.
    pub fn cancelled(&self) -> bool {
        self.state() == FutureState::Cancelled
    }

    /// Returns `true` while neither done nor cancelled.
    pub fn is_pending(&self) -> bool {
        self.state() == FutureState::Pending
    }

    /// Completes the future with `value` and schedules its callbacks.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] if the future is not pending, or if
    /// it is the completion cell of a [`Task`](crate::Task): only the
    /// task's computation produces its result.
    pub fn set_result(&self, value: T) -> Result<()> {
        if self.inner.owner.borrow().is_some() {
            return Err(Error::InvalidState("result of a task is set by its computation"));
        }
        self.complete(value)
    }

    /// Cancels the future and schedules its callbacks.
    ///
    /// For the completion cell of a [`Task`](crate::Task) this requests
    /// cancellation of the task itself, exactly like
    /// [`Task::cancel`](crate::Task::cancel).
    ///
    /// Returns `false`, doing nothing, if the future already completed.
    pub fn cancel(&self) -> bool {
        let owner = self.inner.owner.borrow().clone();
        match owner {
            Some(cancel) => cancel(),
            None => self.cancel_now(),
        }
    }

    /// Marks the cell as owned by a task whose cancellation is `cancel`.
    pub(crate) fn set_owner(&self, cancel: impl Fn() -> bool + 'static) {
        self.inner.owner.replace(Some(Rc::new(cancel)));
    }

    pub(crate) fn complete(&self, value: T) -> Result<()> {
        {
            let mut slot = self.inner.slot.borrow_mut();
            if !matches!(*slot, Slot::Pending) {
                return Err(Error::InvalidState("result already set or future cancelled"));
            }
            *slot = Slot::Done(value);
        }

        trace!(future = self.label(), "future done");
        self.schedule_callbacks();
        Ok(())
    }

    pub(crate) fn cancel_now(&self) -> bool {
        {
            let mut slot = self.inner.slot.borrow_mut();
            if !matches!(*slot, Slot::Pending) {
                return false;
            }
            *slot = Slot::Cancelled;
        }

        trace!(future = self.label(), "future cancelled");
        self.schedule_callbacks();
        true
    }

    /// Registers `callback` to run with this future once it completes.
    ///
    /// If the future already completed, the callback is scheduled on the
    /// loop right away; it still runs in a later tick, never inline.
    pub fn add_done_callback<F>(&self, callback: F)
    where
        F: FnOnce(Future<T>) -> Result<()> + 'static,
    {
        if self.is_pending() {
            self.inner.callbacks.borrow_mut().push(Box::new(callback));
        } else {
            self.inner
                .event_loop
                .schedule(self.label(), callback, self.clone());
        }
    }

    /// Moves every registered callback onto the loop.
    fn schedule_callbacks(&self) {
        let callbacks = mem::take(&mut *self.inner.callbacks.borrow_mut());

        for callback in callbacks {
            self.inner
                .event_loop
                .schedule(self.label(), callback, self.clone());
        }
    }

    fn label(&self) -> &str {
        self.name().unwrap_or("future")
    }
}

impl<T: Clone + 'static> Future<T> {
    /// Returns a copy of the result.
    ///
    /// # Errors
    ///
    /// - [`Error::Cancelled`] if the future was cancelled.
    /// - [`Error::InvalidState`] if it is still pending.
    pub fn result(&self) -> Result<T> {
        match &*self.inner.slot.borrow() {
            Slot::Done(value) => Ok(value.clone()),
            Slot::Cancelled => Err(Error::Cancelled),
            Slot::Pending => Err(Error::InvalidState("result is not ready")),
        }
    }
}

impl<T> Clone for Future<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: 'static> Awaitable for Future<T> {
    fn name(&self) -> Option<&str> {
        Future::name(self)
    }

    fn is_pending(&self) -> bool {
        Future::is_pending(self)
    }

    fn cancel(&self) -> bool {
        Future::cancel(self)
    }

    fn outcome(&self) -> Result<()> {
        match self.state() {
            FutureState::Done => Ok(()),
            FutureState::Cancelled => Err(Error::Cancelled),
            FutureState::Pending => Err(Error::InvalidState("result is not ready")),
        }
    }

    fn on_done(&self, callback: DoneCallback) {
        self.add_done_callback(move |future| callback(Rc::new(future)));
    }
}

impl<T: Clone + 'static> IntoFuture for Future<T> {
    type Output = Result<T>;
    type IntoFuture = Suspend<T>;

    fn into_future(self) -> Suspend<T> {
        Suspend::new(Rc::new(self.clone()), self)
    }
}

impl<T: Clone + 'static> IntoFuture for &Future<T> {
    type Output = Result<T>;
    type IntoFuture = Suspend<T>;

    fn into_future(self) -> Suspend<T> {
        self.clone().into_future()
    }
}

impl<T: 'static> fmt::Debug for Future<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Future")
            .field("name", &self.inner.name)
            .field("state", &self.state())
            .finish()
    }
}
