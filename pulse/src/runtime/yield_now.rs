use crate::error::Result;
use crate::runtime::context;
use crate::task::coroutine::Yielded;

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A suspension point that yields the plain marker exactly once.
struct YieldOnce(bool);

impl Future for YieldOnce {
    type Output = Result<()>;

    /// On the first poll the computation suspends with
    /// [`Yielded::Marker`], so its task simply reschedules itself.
    /// On the second poll the computation resumes, receiving any error
    /// that was thrown into it.
    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
        if !self.0 {
            self.0 = true;
            context::suspend(Yielded::Marker);
            return Poll::Pending;
        }

        match context::take_thrown() {
            Some(err) => Poll::Ready(Err(err)),
            None => Poll::Ready(Ok(())),
        }
    }
}

/// Yields control back to the loop.
///
/// Every other scheduled handle gets to run before the caller resumes in a
/// later tick.
///
/// # Errors
///
/// Returns the error thrown into the computation while it was suspended,
/// typically [`Error::Cancelled`](crate::Error::Cancelled).
///
/// # Examples
///
/// ```rust
/// use pulse::{Loop, yield_now};
///
/// let event_loop = Loop::new();
/// let value = event_loop.run(async {
///     yield_now().await?;
///     Ok(5)
/// });
///
/// assert_eq!(value.unwrap(), 5);
/// ```
pub async fn yield_now() -> Result<()> {
    YieldOnce(false).await
}
