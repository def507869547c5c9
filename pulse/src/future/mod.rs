//! The one-shot result cell and what it takes to wait on one.
//!
//! - [`Future`](core::Future): result/cancellation cell with callbacks,
//! - [`FutureState`](state::FutureState): its lifecycle,
//! - [`Awaitable`](awaitable::Awaitable): type-erased view shared with tasks,
//! - [`Suspend`](suspend::Suspend): the suspension point behind `.await`.

pub(crate) mod awaitable;
pub(crate) mod core;
pub(crate) mod state;
pub(crate) mod suspend;
