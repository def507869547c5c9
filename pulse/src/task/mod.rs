//! Driving computations on the loop.
//!
//! This module defines:
//! - the [`Coroutine`](coroutine::Coroutine) abstraction for suspendable
//!   computations, and its adapter for `async` blocks,
//! - [`Task`](core::Task), which drives a computation and exposes its
//!   outcome as a future,
//! - the [`wait`](wait::wait) combinator gathering several of them.

pub(crate) mod coroutine;
pub(crate) mod core;
pub(crate) mod wait;

pub use self::core::Task;
pub use coroutine::{AsyncCoroutine, Coroutine, CoroutineState, Resume, Yielded};
pub use wait::{WaitItem, ensure_future, wait};
