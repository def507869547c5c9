use crate::error::{Error, Result};
use crate::runtime::context::{self, CURRENT_LOOP};
use crate::runtime::handle::Handle;
use crate::runtime::source::EventSource;
use crate::task::Task;
use crate::task::coroutine::{AsyncCoroutine, Coroutine};

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::mem;
use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, trace};

/// The scheduler.
///
/// `Loop` owns a FIFO ready queue of [`Handle`]s and runs them in ticks.
/// A tick runs exactly the handles that were queued when it started;
/// anything scheduled while it runs waits for the next tick.
///
/// `Loop` is a cheap handle: clones share the same queue and state. It is
/// created explicitly (see [`LoopBuilder`](crate::LoopBuilder)) and handed
/// to futures and tasks, so several independent loops can coexist.
#[derive(Clone)]
pub struct Loop {
    inner: Rc<Inner>,
}

struct Inner {
    /// Diagnostic name.
    name: String,

    /// Cleared by [`Loop::stop`]; checked between ticks.
    running: Cell<bool>,

    /// Ready queue.
    scheduled: RefCell<VecDeque<Handle>>,

    /// Number of ticks executed so far.
    ticks: Cell<u64>,

    /// Upper bound on ticks for one [`Loop::run_loop`] call.
    max_ticks: Option<u64>,

    /// Tick count when the current `run_loop` call started.
    run_started: Cell<u64>,

    /// Producer of completion events consulted at the start of every tick.
    source: RefCell<Option<Box<dyn EventSource>>>,
}

impl Loop {
    /// Creates a loop with the default configuration.
    pub fn new() -> Self {
        crate::LoopBuilder::new().build()
    }

    pub(crate) fn with_config(
        name: String,
        max_ticks: Option<u64>,
        source: Option<Box<dyn EventSource>>,
    ) -> Self {
        Self {
            inner: Rc::new(Inner {
                name,
                running: Cell::new(false),
                scheduled: RefCell::new(VecDeque::new()),
                ticks: Cell::new(0),
                max_ticks,
                run_started: Cell::new(0),
                source: RefCell::new(source),
            }),
        }
    }

    /// Returns the loop whose tick is executing on this thread, if any.
    ///
    /// Computations driven by a loop can use this to reach it.
    pub fn current() -> Option<Loop> {
        CURRENT_LOOP.with(|cell| cell.borrow().clone())
    }

    /// Returns the loop's diagnostic name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns `true` between [`run_loop`](Self::run_loop) starting and the
    /// loop being stopped.
    pub fn is_running(&self) -> bool {
        self.inner.running.get()
    }

    /// Number of handles waiting for the next tick.
    pub fn pending(&self) -> usize {
        self.inner.scheduled.borrow().len()
    }

    /// Number of ticks executed so far.
    pub fn ticks(&self) -> u64 {
        self.inner.ticks.get()
    }

    /// Enqueues `callback(args)` at the tail of the ready queue.
    ///
    /// Safe to call from inside a running handle; the new handle runs in a
    /// later tick.
    pub fn schedule<A, F>(&self, name: impl Into<String>, callback: F, args: A)
    where
        A: 'static,
        F: FnOnce(A) -> Result<()> + 'static,
    {
        self.inner
            .scheduled
            .borrow_mut()
            .push_back(Handle::new(name, callback, args));
    }

    /// Runs a single tick.
    ///
    /// Pending events are collected first, then the ready queue is taken as
    /// a snapshot and every handle in it runs in FIFO order. An error from a
    /// handle aborts the tick: the remaining handles of the snapshot are
    /// dropped and the error is returned.
    pub fn run_step(&self) -> Result<()> {
        self.poll_events()?;

        let batch = mem::take(&mut *self.inner.scheduled.borrow_mut());
        let tick = self.inner.ticks.get() + 1;
        self.inner.ticks.set(tick);

        trace!(
            loop_name = %self.inner.name,
            tick,
            handles = batch.len(),
            "running tick"
        );

        context::enter_loop(self.clone(), || {
            for handle in batch {
                handle.run()?;
            }
            Ok(())
        })
    }

    /// Runs ticks until [`stop`](Self::stop) is called.
    ///
    /// # Errors
    ///
    /// - [`Error::Stalled`] if the queue is empty and no event source can
    ///   refill it.
    /// - [`Error::TickLimit`] once this call spent the configured tick
    ///   budget. Every call starts with a fresh budget.
    /// - Any error escaping a handle.
    ///
    /// The loop is no longer running when this returns.
    pub fn run_loop(&self) -> Result<()> {
        self.inner.running.set(true);
        self.inner.run_started.set(self.inner.ticks.get());

        while self.inner.running.get() {
            if let Err(err) = self.check_progress().and_then(|()| self.run_step()) {
                self.inner.running.set(false);
                debug!(loop_name = %self.inner.name, error = %err, "loop aborted");
                return Err(err);
            }
        }

        debug!(loop_name = %self.inner.name, ticks = self.ticks(), "loop stopped");
        Ok(())
    }

    /// Drives `computation` to completion and returns its result.
    ///
    /// The computation is wrapped in a [`Task`]; the loop stops as soon as
    /// that task completes.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pulse::{Future, Loop};
    ///
    /// let event_loop = Loop::new();
    /// let handle = event_loop.clone();
    ///
    /// let value = event_loop.run(async move {
    ///     let answer = Future::new(&handle, "answer");
    ///     answer.set_result(42)?;
    ///     answer.await
    /// });
    ///
    /// assert_eq!(value.unwrap(), 42);
    /// ```
    pub fn run<T, F>(&self, computation: F) -> Result<T>
    where
        T: Clone + 'static,
        F: std::future::Future<Output = Result<T>> + 'static,
    {
        self.run_coroutine(AsyncCoroutine::new(computation))
    }

    /// Same as [`run`](Self::run), for any [`Coroutine`].
    pub fn run_coroutine<C>(&self, coroutine: C) -> Result<C::Output>
    where
        C: Coroutine + 'static,
        C::Output: Clone + 'static,
    {
        let task = Task::new(self, "initial task", coroutine);

        let event_loop = self.clone();
        task.add_done_callback(move |_| {
            event_loop.stop();
            Ok(())
        });

        if let Err(err) = self.run_loop() {
            // Nothing drives the task anymore.
            task.abandon();
            return Err(err);
        }

        task.result()
    }

    /// Stops the loop after the current tick.
    pub fn stop(&self) {
        self.inner.running.set(false);
    }

    /// Fails if the next tick cannot possibly do anything.
    fn check_progress(&self) -> Result<()> {
        if let Some(max) = self.inner.max_ticks {
            if self.inner.ticks.get() - self.inner.run_started.get() >= max {
                return Err(Error::TickLimit(max));
            }
        }

        if !self.inner.scheduled.borrow().is_empty() {
            return Ok(());
        }

        match self.inner.source.borrow().as_ref() {
            Some(source) if !source.is_idle() => Ok(()),
            _ => Err(Error::Stalled),
        }
    }

    /// Moves handles for completed events into the ready queue.
    fn poll_events(&self) -> Result<()> {
        let mut slot = self.inner.source.borrow_mut();

        let Some(source) = slot.as_mut() else {
            return Ok(());
        };

        if source.is_idle() {
            return Ok(());
        }

        let timeout = if self.inner.scheduled.borrow().is_empty() {
            None
        } else {
            Some(Duration::ZERO)
        };

        let handles = source.poll(timeout)?;
        drop(slot);

        if !handles.is_empty() {
            trace!(loop_name = %self.inner.name, events = handles.len(), "collected events");
            self.inner.scheduled.borrow_mut().extend(handles);
        }

        Ok(())
    }
}

impl Default for Loop {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Loop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loop")
            .field("name", &self.inner.name)
            .field("running", &self.inner.running.get())
            .field("pending", &self.pending())
            .field("ticks", &self.inner.ticks.get())
            .finish()
    }
}
