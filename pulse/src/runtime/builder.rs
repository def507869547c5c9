use super::core::Loop;
use super::source::EventSource;

/// Builder for configuring and creating a [`Loop`].
///
/// # Examples
///
/// ```rust
/// use pulse::LoopBuilder;
///
/// let event_loop = LoopBuilder::new()
///     .name("worker")
///     .max_ticks(1_000)
///     .build();
///
/// assert_eq!(event_loop.name(), "worker");
/// ```
pub struct LoopBuilder {
    /// Diagnostic name of the loop.
    name: String,

    /// Tick budget for `run_loop`, unlimited when `None`.
    max_ticks: Option<u64>,

    /// Completion event producer.
    source: Option<Box<dyn EventSource>>,
}

impl LoopBuilder {
    /// Creates a new `LoopBuilder` with default configuration.
    ///
    /// The loop is named `"pulse"`, has no tick budget and no event source.
    pub fn new() -> Self {
        Self {
            name: String::from("pulse"),
            max_ticks: None,
            source: None,
        }
    }

    /// Sets the loop's diagnostic name, used in log records.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Limits how many ticks a single `run_loop` call may execute.
    ///
    /// The budget starts over on every call, so a reused loop is not
    /// charged for earlier runs.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    pub fn max_ticks(mut self, n: u64) -> Self {
        assert!(n > 0, "max_ticks must be > 0");

        self.max_ticks = Some(n);
        self
    }

    /// Installs the source of completion events.
    pub fn event_source(mut self, source: impl EventSource + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Builds the loop with the configured options.
    pub fn build(self) -> Loop {
        Loop::with_config(self.name, self.max_ticks, self.source)
    }
}

impl Default for LoopBuilder {
    /// Creates a default `LoopBuilder`.
    fn default() -> Self {
        Self::new()
    }
}
