use crate::error::Result;

use std::fmt;

use tracing::{debug, trace};

/// A deferred, argument-bound unit of work.
///
/// A `Handle` pairs a callback with the argument it will be called with.
/// It is created whenever something is scheduled on a [`Loop`](crate::Loop)
/// and is consumed when the loop runs it during a tick.
///
/// # Examples
///
/// ```rust
/// use pulse::Handle;
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let seen = Rc::new(Cell::new(0));
/// let handle = Handle::new("store", |(cell, v): (Rc<Cell<i32>>, i32)| {
///     cell.set(v);
///     Ok(())
/// }, (seen.clone(), 7));
///
/// handle.run().unwrap();
/// assert_eq!(seen.get(), 7);
/// ```
pub struct Handle {
    /// Diagnostic name of the scheduled work.
    name: String,

    /// The callback with its argument already bound.
    callback: Box<dyn FnOnce() -> Result<()>>,
}

impl Handle {
    /// Binds `args` to `callback` under the given name.
    pub fn new<A, F>(name: impl Into<String>, callback: F, args: A) -> Self
    where
        A: 'static,
        F: FnOnce(A) -> Result<()> + 'static,
    {
        Self {
            name: name.into(),
            callback: Box::new(move || callback(args)),
        }
    }

    /// Returns the handle's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invokes the callback with its bound argument.
    ///
    /// Errors are returned to the caller untouched; the loop treats them as
    /// fatal for the current tick.
    pub fn run(self) -> Result<()> {
        let Handle { name, callback } = self;

        trace!(handle = %name, "running handle");

        callback().inspect_err(|err| {
            debug!(handle = %name, error = %err, "handle failed");
        })
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle").field("name", &self.name).finish()
    }
}
