//! The worker loop: the single consumer that turns queued handles into sink output.
//!
//! Grounded on the source's `prv_log_thread_task`, which loops forever on `xQueueReceive`,
//! reconstructs the message, walks the backend list, and frees the pool slot. The same four steps
//! appear here as [`run_worker`]'s loop body; what differs is only what SPEC_FULL.md's ambient
//! stack adds on top (stats bookkeeping) and what the pool/queue modules already buy back
//! (non-blocking, ISR-sound alloc/enqueue on the producer side).

use ufmt::uWrite;

use crate::logger::Logger;
use crate::queue::WakeSignal;
use crate::reconstruct::reconstruct;

/// The formatted line's working buffer size. A line longer than this is truncated rather than
/// rejected — formatting must never fail the worker loop, since there is nowhere to report a
/// formatting failure back to (the call site that produced the message has long since returned).
const LINE_CAPACITY: usize = 256;

struct LineBuffer {
    text: heapless::String<LINE_CAPACITY>,
}

impl LineBuffer {
    fn new() -> Self {
        LineBuffer {
            text: heapless::String::new(),
        }
    }
}

impl uWrite for LineBuffer {
    type Error = core::convert::Infallible;

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        // `push_str` fails only on capacity overflow; truncating silently here is the documented
        // trade-off noted on `LINE_CAPACITY` above rather than an oversight.
        let _ = self.text.push_str(s);
        Ok(())
    }
}

/// Drains and processes exactly one queued message, blocking on `signal` if the queue is
/// currently empty. Exposed for tests and for applications that want to drive the worker from
/// their own scheduling loop instead of calling [`run_worker`]'s infinite loop directly.
pub fn drain_one<
    const MAX_MESSAGES: usize,
    const MAX_ARGS_BYTES: usize,
    const QUEUE_DEPTH: usize,
    const MAX_SINKS: usize,
    S: WakeSignal,
>(
    logger: &Logger<MAX_MESSAGES, MAX_ARGS_BYTES, QUEUE_DEPTH, MAX_SINKS, S>,
) {
    let handle = logger.queue().dequeue_blocking(logger.signal());

    let mut line = LineBuffer::new();
    let (module, function, level) = logger.pool().with_message(handle, |msg| {
        let _ = reconstruct(&mut line, msg.format_string, msg.args());
        (msg.module, msg.function, msg.level)
    });

    let failures = logger.sinks().emit_all(module, function, level, &line.text);
    logger.pool().free(handle);
    logger.stats().record_sink_errors(failures);
    logger.stats().record_processed();
}

/// Runs the worker loop forever: dequeue, reconstruct, fan out to every registered sink, free the
/// slot, repeat. Intended to be the body of a long-lived task or thread that the embedding
/// application spawns — spawning that task is explicitly outside this crate's scope (SPEC_FULL.md
/// §1), matching the source's own documented assumption that `prv_log_thread_task` is handed to
/// `xTaskCreate` by the integrator, not by the logging library itself.
pub fn run_worker<
    const MAX_MESSAGES: usize,
    const MAX_ARGS_BYTES: usize,
    const QUEUE_DEPTH: usize,
    const MAX_SINKS: usize,
    S: WakeSignal,
>(
    logger: &Logger<MAX_MESSAGES, MAX_ARGS_BYTES, QUEUE_DEPTH, MAX_SINKS, S>,
) -> ! {
    loop {
        drain_one(logger);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::StdWake;
    use crate::severity::Severity;
    use crate::sink::Sink;

    struct CountingSink {
        count: core::sync::atomic::AtomicUsize,
    }

    impl Sink for CountingSink {
        fn emit(&self, _module: &str, _function: &str, _level: Severity, _line: &str) -> bool {
            self.count.fetch_add(1, core::sync::atomic::Ordering::Relaxed);
            true
        }
    }

    #[test]
    fn drain_one_frees_the_slot_and_notifies_every_sink() {
        static SINK_A: CountingSink = CountingSink {
            count: core::sync::atomic::AtomicUsize::new(0),
        };
        static SINK_B: CountingSink = CountingSink {
            count: core::sync::atomic::AtomicUsize::new(0),
        };

        let logger: Logger<2, 16, 2, 2, StdWake> = Logger::new(StdWake::new());
        logger.init();
        logger.register_sink(&SINK_A).unwrap();
        logger.register_sink(&SINK_B).unwrap();

        logger
            .submit("mod", "func", Severity::Warning, "boot\n", &[])
            .unwrap();

        drain_one(&logger);

        assert_eq!(SINK_A.count.load(core::sync::atomic::Ordering::Relaxed), 1);
        assert_eq!(SINK_B.count.load(core::sync::atomic::Ordering::Relaxed), 1);
        assert_eq!(logger.pool().outstanding(), 0);
        assert_eq!(logger.stats().processed(), 1);
        assert_eq!(logger.stats().sink_errors(), 0);
    }

    struct FailingSink;
    impl Sink for FailingSink {
        fn emit(&self, _module: &str, _function: &str, _level: Severity, _line: &str) -> bool {
            false
        }
    }

    #[test]
    fn drain_one_counts_sink_failures_without_skipping_other_sinks() {
        static FAILING: FailingSink = FailingSink;
        static SINK_B: CountingSink = CountingSink {
            count: core::sync::atomic::AtomicUsize::new(0),
        };

        let logger: Logger<2, 16, 2, 2, StdWake> = Logger::new(StdWake::new());
        logger.init();
        logger.register_sink(&FAILING).unwrap();
        logger.register_sink(&SINK_B).unwrap();

        logger
            .submit("mod", "func", Severity::Warning, "boot\n", &[])
            .unwrap();

        drain_one(&logger);

        assert_eq!(SINK_B.count.load(core::sync::atomic::Ordering::Relaxed), 1);
        assert_eq!(logger.stats().sink_errors(), 1);
        assert_eq!(logger.stats().processed(), 1);
    }
}
