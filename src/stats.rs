//! Operational counters.
//!
//! The source tracks a handful of running counters (`dropped`, `processed`) directly on the core
//! struct for diagnostics; this is that same ambient concern, expressed as plain atomics so reading
//! them never contends with the submission or worker paths.

use core::sync::atomic::{AtomicU32, Ordering};

/// Running counters for observing this core's behavior in production, independent of any
/// particular [`crate::Sink`].
#[derive(Default)]
pub struct Stats {
    submitted: AtomicU32,
    processed: AtomicU32,
    dropped_no_space: AtomicU32,
    dropped_not_initialized: AtomicU32,
    dropped_io_error: AtomicU32,
    sink_errors: AtomicU32,
}

impl Stats {
    /// A fresh, all-zero counter set.
    pub const fn new() -> Self {
        Stats {
            submitted: AtomicU32::new(0),
            processed: AtomicU32::new(0),
            dropped_no_space: AtomicU32::new(0),
            dropped_not_initialized: AtomicU32::new(0),
            dropped_io_error: AtomicU32::new(0),
            sink_errors: AtomicU32::new(0),
        }
    }

    pub(crate) fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped_no_space(&self) {
        self.dropped_no_space.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped_not_initialized(&self) {
        self.dropped_not_initialized.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped_io_error(&self) {
        self.dropped_io_error.fetch_add(1, Ordering::Relaxed);
    }

    /// Records `count` sink `emit` calls that reported a formatting/write failure for a single
    /// dequeued message. Does not change fan-out: every sink is still invoked regardless.
    pub(crate) fn record_sink_errors(&self, count: u32) {
        if count > 0 {
            self.sink_errors.fetch_add(count, Ordering::Relaxed);
        }
    }

    /// Messages successfully handed off to the queue since startup.
    pub fn submitted(&self) -> u32 {
        self.submitted.load(Ordering::Relaxed)
    }

    /// Messages the worker has fully drained (formatted, fanned out, freed).
    pub fn processed(&self) -> u32 {
        self.processed.load(Ordering::Relaxed)
    }

    /// Submissions rejected because the pool or queue was full.
    pub fn dropped_no_space(&self) -> u32 {
        self.dropped_no_space.load(Ordering::Relaxed)
    }

    /// Submissions rejected because they arrived before [`crate::Logger::init`].
    pub fn dropped_not_initialized(&self) -> u32 {
        self.dropped_not_initialized.load(Ordering::Relaxed)
    }

    /// Submissions rejected because argument capture wrote zero bytes for a non-empty format
    /// (an internal invariant violation — see [`crate::Error::IoError`]).
    pub fn dropped_io_error(&self) -> u32 {
        self.dropped_io_error.load(Ordering::Relaxed)
    }

    /// Sink `emit` calls that reported a formatting/write failure, summed across every dequeued
    /// message. Fan-out to the remaining sinks is unaffected by a failure here.
    pub fn sink_errors(&self) -> u32 {
        self.sink_errors.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero_and_accumulate() {
        let stats = Stats::new();
        assert_eq!(stats.submitted(), 0);

        stats.record_submitted();
        stats.record_submitted();
        stats.record_processed();
        stats.record_dropped_no_space();
        stats.record_dropped_not_initialized();
        stats.record_dropped_io_error();
        stats.record_sink_errors(2);

        assert_eq!(stats.submitted(), 2);
        assert_eq!(stats.processed(), 1);
        assert_eq!(stats.dropped_no_space(), 1);
        assert_eq!(stats.dropped_not_initialized(), 1);
        assert_eq!(stats.dropped_io_error(), 1);
        assert_eq!(stats.sink_errors(), 2);
    }

    #[test]
    fn record_sink_errors_ignores_a_zero_count() {
        let stats = Stats::new();
        stats.record_sink_errors(0);
        assert_eq!(stats.sink_errors(), 0);
    }
}
