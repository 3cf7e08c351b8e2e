//! The top-level handle applications hold: submission plus sink registration.
//!
//! Ties together the pool, queue, sink registry, and stats the rest of this crate implements in
//! isolation, the same composition the source's `log_core.c` does over its own pool/queue/registry
//! globals (there, as file-scope statics wired together by `log_init`; here, as one `const`
//! -constructible struct so an application can declare `static LOGGER: Logger<...> = Logger::new(...)`
//! and take its address, exactly the pattern `critical-section`-guarded `no_std` globals use
//! throughout the pack).

use core::sync::atomic::{AtomicBool, Ordering};

use crate::arg::LogArg;
use crate::error::Error;
use crate::format;
use crate::pool::MessagePool;
use crate::queue::{MessageQueue, WakeSignal};
use crate::severity::Severity;
use crate::sink::{Sink, SinkRegistry};
use crate::stats::Stats;

/// The deferred logging core: a pool, a queue, a sink registry, and the stats counters, sized at
/// compile time by `MAX_MESSAGES` (pool slots), `MAX_ARGS_BYTES` (per-slot capture capacity),
/// `QUEUE_DEPTH` (in-flight handles), and `MAX_SINKS` (registered backends), parameterized over the
/// [`WakeSignal`] `S` used to wake the worker.
pub struct Logger<
    const MAX_MESSAGES: usize,
    const MAX_ARGS_BYTES: usize,
    const QUEUE_DEPTH: usize,
    const MAX_SINKS: usize,
    S: WakeSignal,
> {
    pool: MessagePool<MAX_MESSAGES, MAX_ARGS_BYTES>,
    queue: MessageQueue<QUEUE_DEPTH>,
    sinks: SinkRegistry<MAX_SINKS>,
    stats: Stats,
    signal: S,
    initialized: AtomicBool,
}

impl<const MAX_MESSAGES: usize, const MAX_ARGS_BYTES: usize, const QUEUE_DEPTH: usize, const MAX_SINKS: usize, S: WakeSignal>
    Logger<MAX_MESSAGES, MAX_ARGS_BYTES, QUEUE_DEPTH, MAX_SINKS, S>
{
    /// Builds an uninitialized logger around `signal`. Call [`Self::init`] once, before the first
    /// [`Self::submit`], typically right after the `static` holding this value comes into scope.
    pub const fn new(signal: S) -> Self {
        Logger {
            pool: MessagePool::new(),
            queue: MessageQueue::new(),
            sinks: SinkRegistry::new(),
            stats: Stats::new(),
            signal,
            initialized: AtomicBool::new(false),
        }
    }

    /// Prepares the pool's free list and marks this logger ready to accept submissions. Must run
    /// exactly once, before any [`Self::submit`]/[`Self::submit_from_isr`] call; submissions that
    /// race ahead of `init` are rejected with [`Error::NotInitialized`] rather than corrupting the
    /// pool.
    pub fn init(&self) {
        self.pool.init();
        self.initialized.store(true, Ordering::Release);
    }

    /// Registers a sink to receive every subsequently formatted message, in registration order.
    pub fn register_sink(&self, sink: &'static dyn Sink) -> Result<(), Error> {
        self.sinks.register(sink)
    }

    /// Captures `args` against `format` and hands the message to the worker. Never blocks and
    /// never allocates: on failure the message is simply dropped and the failure reason returned.
    /// Safe to call from normal thread/task context.
    pub fn submit(
        &self,
        module: &'static str,
        function: &'static str,
        level: Severity,
        format: &'static str,
        args: &[LogArg],
    ) -> Result<(), Error> {
        self.submit_inner(module, function, level, format, args)
    }

    /// Identical to [`Self::submit`], and just as sound to call from interrupt context: every path
    /// it touches (pool alloc, capture, enqueue) is guarded by [`critical_section::with`], which
    /// never suspends the caller. Kept as a distinct entry point, matching the source's
    /// `log_queue_deferred_message`/`log_queue_deferred_message_from_isr` split, so call sites make
    /// their execution context explicit even though the underlying implementation is shared.
    pub fn submit_from_isr(
        &self,
        module: &'static str,
        function: &'static str,
        level: Severity,
        format: &'static str,
        args: &[LogArg],
    ) -> Result<(), Error> {
        self.submit_inner(module, function, level, format, args)
    }

    fn submit_inner(
        &self,
        module: &'static str,
        function: &'static str,
        level: Severity,
        format: &'static str,
        args: &[LogArg],
    ) -> Result<(), Error> {
        if !self.initialized.load(Ordering::Acquire) {
            self.stats.record_dropped_not_initialized();
            return Err(Error::NotInitialized);
        }

        let args_size = format::size_of(format);
        let handle = match self.pool.alloc(module, function, level, format, args_size) {
            Ok(handle) => handle,
            Err(e) => {
                self.stats.record_dropped_no_space();
                return Err(e);
            }
        };

        if args_size > 0 {
            let dst = self.pool.args_buffer_mut(handle);
            let written = format::capture(format, args, dst);
            if written == 0 {
                self.pool.free(handle);
                self.stats.record_dropped_io_error();
                return Err(Error::IoError);
            }
        }

        if let Err(e) = self.queue.enqueue(handle) {
            self.pool.free(handle);
            self.stats.record_dropped_no_space();
            return Err(e);
        }

        self.stats.record_submitted();
        self.signal.signal();
        Ok(())
    }

    /// The running operational counters for this logger.
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub(crate) fn pool(&self) -> &MessagePool<MAX_MESSAGES, MAX_ARGS_BYTES> {
        &self.pool
    }

    pub(crate) fn queue(&self) -> &MessageQueue<QUEUE_DEPTH> {
        &self.queue
    }

    pub(crate) fn sinks(&self) -> &SinkRegistry<MAX_SINKS> {
        &self.sinks
    }

    pub(crate) fn signal(&self) -> &S {
        &self.signal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::StdWake;
    use crate::worker::drain_one;

    struct RecordingSink {
        lines: critical_section::Mutex<core::cell::RefCell<heapless::Vec<heapless::String<64>, 8>>>,
    }

    impl Sink for RecordingSink {
        fn emit(&self, _module: &str, _function: &str, _level: Severity, line: &str) -> bool {
            critical_section::with(|cs| {
                let mut lines = self.lines.borrow(cs).borrow_mut();
                let mut s = heapless::String::new();
                let _ = s.push_str(line);
                let _ = lines.push(s);
            });
            true
        }
    }

    #[test]
    fn submit_before_init_is_rejected() {
        let logger: Logger<2, 16, 2, 1, StdWake> = Logger::new(StdWake::new());
        let err = logger
            .submit("mod", "func", Severity::Info, "hi\n", &[])
            .unwrap_err();
        assert_eq!(err, Error::NotInitialized);
        assert_eq!(logger.stats().dropped_not_initialized(), 1);
    }

    #[test]
    fn submit_then_drain_reaches_the_sink() {
        static SINK: RecordingSink = RecordingSink {
            lines: critical_section::Mutex::new(core::cell::RefCell::new(heapless::Vec::new())),
        };

        let logger: Logger<2, 16, 2, 1, StdWake> = Logger::new(StdWake::new());
        logger.init();
        logger.register_sink(&SINK).unwrap();

        logger
            .submit("net", "connect", Severity::Info, "x=%d", &[LogArg::Int(7)])
            .unwrap();

        drain_one(&logger);

        critical_section::with(|cs| {
            let lines = SINK.lines.borrow(cs).borrow();
            assert_eq!(lines.last().unwrap().as_str(), "x=7");
        });
        assert_eq!(logger.stats().processed(), 1);
        assert_eq!(logger.pool().outstanding(), 0);
    }

    #[test]
    fn pool_exhaustion_is_reported_and_counted() {
        let logger: Logger<1, 16, 2, 1, StdWake> = Logger::new(StdWake::new());
        logger.init();

        logger.submit("m", "f", Severity::Info, "a\n", &[]).unwrap();
        let err = logger
            .submit("m", "f", Severity::Info, "b\n", &[])
            .unwrap_err();
        assert_eq!(err, Error::NoSpace);
        assert_eq!(logger.stats().dropped_no_space(), 1);
    }

    #[test]
    fn mismatched_args_fail_capture_and_free_the_slot() {
        let logger: Logger<2, 16, 2, 1, StdWake> = Logger::new(StdWake::new());
        logger.init();

        // "%d" expects a `LogArg::Int`; passing a `Str` instead means `capture` writes zero
        // bytes, which must surface as `IoError` rather than silently enqueueing a message whose
        // capture buffer never got filled.
        let err = logger
            .submit("m", "f", Severity::Info, "%d", &[LogArg::Str("oops")])
            .unwrap_err();
        assert_eq!(err, Error::IoError);
        assert_eq!(logger.stats().dropped_io_error(), 1);
        assert_eq!(logger.pool().outstanding(), 0);
        assert_eq!(logger.queue().len(), 0);
    }
}
