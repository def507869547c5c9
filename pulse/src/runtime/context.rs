use crate::error::Error;
use crate::runtime::core::Loop;
use crate::task::coroutine::Yielded;

use std::cell::RefCell;
use std::thread::LocalKey;

thread_local! {
    /// Loop whose tick is currently executing on this thread.
    ///
    /// Installed for the duration of each tick so computations can reach
    /// their driver with [`Loop::current`] without passing it around.
    pub(crate) static CURRENT_LOOP: RefCell<Option<Loop>> = const { RefCell::new(None) };

    /// Resumption frame of the computation currently being resumed.
    static CURRENT_STEP: RefCell<Option<StepFrame>> = const { RefCell::new(None) };
}

/// What flows between a task and the suspension point it resumes.
#[derive(Default)]
pub(crate) struct StepFrame {
    /// Error thrown into the computation, taken by the suspension point.
    pub(crate) thrown: Option<Error>,

    /// Value the computation suspended on, set by the suspension point.
    pub(crate) yielded: Option<Yielded>,
}

/// Puts the previous value of a thread-local slot back when dropped, also
/// while unwinding.
struct Restore<T: 'static> {
    key: &'static LocalKey<RefCell<Option<T>>>,
    prev: Option<Option<T>>,
}

impl<T: 'static> Restore<T> {
    fn install(key: &'static LocalKey<RefCell<Option<T>>>, value: T) -> Self {
        let prev = key.with(|cell| cell.replace(Some(value)));
        Self {
            key,
            prev: Some(prev),
        }
    }

    /// Restores the previous value now and returns the one it replaces.
    fn finish(mut self) -> Option<T> {
        let prev = self.prev.take().flatten();
        self.key.with(|cell| cell.replace(prev))
    }
}

impl<T: 'static> Drop for Restore<T> {
    fn drop(&mut self) {
        if let Some(prev) = self.prev.take() {
            // Ignored if the thread-local is already being torn down.
            let _ = self.key.try_with(|cell| cell.replace(prev));
        }
    }
}

/// Runs `f` with `event_loop` installed as the current loop.
///
/// The previous loop, if any, is restored afterwards, even if `f` panics.
pub(crate) fn enter_loop<R>(event_loop: Loop, f: impl FnOnce() -> R) -> R {
    let _restore = Restore::install(&CURRENT_LOOP, event_loop);
    f()
}

/// Runs `f` inside a fresh resumption frame carrying `thrown`.
///
/// Returns the closure's output along with whatever the computation left in
/// the frame.
pub(crate) fn enter_step<R>(thrown: Option<Error>, f: impl FnOnce() -> R) -> (R, StepFrame) {
    let frame = StepFrame {
        thrown,
        yielded: None,
    };

    let restore = Restore::install(&CURRENT_STEP, frame);
    let out = f();
    let frame = restore.finish();

    (out, frame.unwrap_or_default())
}

/// Records what the running computation suspends on.
///
/// Returns `false` when called outside of any resumption, in which case
/// nothing will ever resume the caller.
pub(crate) fn suspend(yielded: Yielded) -> bool {
    CURRENT_STEP.with(|cell| match cell.borrow_mut().as_mut() {
        Some(frame) => {
            frame.yielded = Some(yielded);
            true
        }
        None => false,
    })
}

/// Takes the error thrown into the current resumption, if any.
pub(crate) fn take_thrown() -> Option<Error> {
    CURRENT_STEP.with(|cell| cell.borrow_mut().as_mut().and_then(|frame| frame.thrown.take()))
}
