//! # Pulse
//!
//! **Pulse** is a minimal single-threaded cooperative scheduler. It drives
//! many suspendable computations to completion on one thread, using an
//! explicit ready queue and a one-shot [`Future`] for signaling between
//! them.
//!
//! It exposes the mechanics that production runtimes keep hidden:
//!
//! - a [`Loop`] running [`Handle`]s in bounded ticks, where work scheduled
//!   during a tick always waits for the next one,
//! - a [`Future`] cell whose completion callbacks always go through the loop,
//! - a [`Task`] that resumes a computation step by step and turns its
//!   suspension points into scheduling decisions,
//! - cooperative cancellation that travels through chains of awaiting tasks,
//! - [`wait`], gathering several computations in input order.
//!
//! ## Quick Start
//!
//! ```rust
//! use pulse::{Future, Loop};
//!
//! async fn some_result(event_loop: Loop, value: i32) -> pulse::Result<i32> {
//!     let future = Future::new(&event_loop, "some result");
//!     future.set_result(value)?;
//!     future.await
//! }
//!
//! let event_loop = Loop::new();
//! let handle = event_loop.clone();
//!
//! let sum = event_loop.run(async move {
//!     let x = some_result(handle.clone(), 1).await?;
//!     let y = some_result(handle, 2).await?;
//!     Ok(x + y)
//! });
//!
//! assert_eq!(sum.unwrap(), 3);
//! ```
//!
//! ## Modules
//!
//! - [`task`]: tasks, the coroutine abstraction and `wait`
//!
//! Everything else is re-exported at the crate root.

mod error;
mod future;
mod runtime;

pub mod task;

pub use error::{Error, Result};
pub use future::awaitable::{Awaitable, DoneCallback};
pub use future::core::Future;
pub use future::state::FutureState;
pub use future::suspend::Suspend;
pub use runtime::builder::LoopBuilder;
pub use runtime::core::Loop;
pub use runtime::handle::Handle;
pub use runtime::source::EventSource;
pub use runtime::yield_now::yield_now;
pub use task::{Task, WaitItem, wait};

pub use pulse_macros::*;
