//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::sync::Once;

use pulse::{Loop, LoopBuilder};
use tracing_subscriber::fmt::format::FmtSpan;

static INIT_LOGGING: Once = Once::new();

/// Installs a trace-level subscriber writing through the test harness.
///
/// Safe to call from every test; only the first call installs it.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_ansi(false)
            .try_init();
    });
}

/// A loop with logging enabled and a tick budget generous enough for any
/// test, so a scheduling bug fails fast instead of spinning.
pub fn test_loop() -> Loop {
    init_test_logging();
    LoopBuilder::new().name("test").max_ticks(10_000).build()
}

/// Runs ticks until `done` returns `true`, failing after `max` ticks.
pub fn drive_until(event_loop: &Loop, max: usize, mut done: impl FnMut() -> bool) {
    for _ in 0..max {
        if done() {
            return;
        }
        event_loop.run_step().expect("tick failed");
    }
    assert!(done(), "condition not reached within {max} ticks");
}
