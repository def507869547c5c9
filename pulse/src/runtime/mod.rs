//! The scheduler and its supporting pieces.
//!
//! This module contains:
//! - [`Loop`](core::Loop), the single-threaded driver owning the ready queue,
//! - [`Handle`](handle::Handle), the deferred unit of work it runs,
//! - the builder used to configure a loop,
//! - the [`EventSource`](source::EventSource) seam for completion events,
//! - the thread-local context installed while a tick runs,
//! - [`yield_now`](yield_now::yield_now), the plain suspension point.

pub(crate) mod builder;
pub(crate) mod context;
pub(crate) mod core;
pub(crate) mod handle;
pub(crate) mod source;
pub(crate) mod yield_now;
