//! Where formatted messages go.
//!
//! The source's registry is an intrusive singly-linked list threaded through a field embedded in
//! each backend struct, so registration never allocates: a new backend just splices its own node
//! onto the head. Rust has a safe substitute with the same "never allocates, fixed by construction"
//! property — a fixed-capacity array of `&'static dyn Sink` — at the cost of an upper bound on how
//! many sinks can ever be registered, fixed at compile time via `MAX_SINKS`.

use heapless::Vec as FixedVec;

use crate::error::Error;
use crate::severity::Severity;

/// A destination for formatted log output: a UART, an RTT channel, a file, a network socket.
///
/// Implementations live in the embedding application, not in this crate (SPEC_FULL.md §1: concrete
/// sinks are explicitly out of scope for the core). `emit` receives the message already formatted
/// into `line` and must not block the worker indefinitely — the same obligation the source's
/// backend vtable's `write` callback carries.
pub trait Sink: Sync {
    /// Writes one already-formatted log line. `module`/`function`/`level` are passed alongside the
    /// formatted text so a sink can prefix or color-code without re-parsing `line`.
    ///
    /// Returns `false` if the write failed (e.g. the medium was disconnected). The worker counts
    /// this in [`crate::Stats::sink_errors`] but never treats it as fatal: every other registered
    /// sink still sees the message, and the slot is still freed. The source's backend vtable
    /// callback returns nothing at all; this is SPEC_FULL.md §4.5's ambient-stack addition of
    /// observable sink health, applied the minimal way the original `void`-returning API allows.
    fn emit(&self, module: &str, function: &str, level: Severity, line: &str) -> bool;
}

/// A fixed-capacity, append-only collection of registered [`Sink`]s.
///
/// Registration order is fan-out order: [`SinkRegistry::emit_all`] walks sinks head to tail, the
/// same order the source's linked list is walked in (newest-registered backend is pushed to the
/// head there; this registry instead preserves registration order, which every pack sink fan-out —
/// e.g. `comix-kernel-comix`'s console writer loop — assumes for reproducible output ordering).
pub struct SinkRegistry<const MAX_SINKS: usize> {
    sinks: critical_section::Mutex<core::cell::RefCell<FixedVec<&'static dyn Sink, MAX_SINKS>>>,
}

impl<const MAX_SINKS: usize> SinkRegistry<MAX_SINKS> {
    /// Creates an empty registry. `const fn` so it can back a `static`.
    pub const fn new() -> Self {
        SinkRegistry {
            sinks: critical_section::Mutex::new(core::cell::RefCell::new(FixedVec::new())),
        }
    }

    /// Appends `sink` to the registry. Returns [`Error::NoSpace`] once `MAX_SINKS` sinks are
    /// already registered.
    pub fn register(&self, sink: &'static dyn Sink) -> Result<(), Error> {
        critical_section::with(|cs| {
            let mut sinks = self.sinks.borrow(cs).borrow_mut();
            sinks.push(sink).map_err(|_| Error::NoSpace)
        })
    }

    /// Calls `emit` on every registered sink, in registration order, with the same formatted
    /// line. Returns the number of sinks whose `emit` reported failure; fan-out does not stop
    /// early on a failure.
    pub(crate) fn emit_all(&self, module: &str, function: &str, level: Severity, line: &str) -> u32 {
        critical_section::with(|cs| {
            let sinks = self.sinks.borrow(cs).borrow();
            let mut failures = 0u32;
            for sink in sinks.iter() {
                if !sink.emit(module, function, level, line) {
                    failures += 1;
                }
            }
            failures
        })
    }

    /// Number of sinks currently registered.
    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.sinks.borrow(cs).borrow().len())
    }

    /// Whether no sinks have been registered yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<const MAX_SINKS: usize> Default for SinkRegistry<MAX_SINKS> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSink {
        calls: AtomicUsize,
    }

    impl Sink for CountingSink {
        fn emit(&self, _module: &str, _function: &str, _level: Severity, _line: &str) -> bool {
            self.calls.fetch_add(1, Ordering::Relaxed);
            true
        }
    }

    #[test]
    fn register_fails_once_full() {
        static A: CountingSink = CountingSink {
            calls: AtomicUsize::new(0),
        };
        static B: CountingSink = CountingSink {
            calls: AtomicUsize::new(0),
        };

        let registry: SinkRegistry<1> = SinkRegistry::new();
        registry.register(&A).unwrap();
        assert_eq!(registry.register(&B).unwrap_err(), Error::NoSpace);
    }

    #[test]
    fn emit_all_reaches_every_sink_in_registration_order() {
        static ORDER: critical_section::Mutex<core::cell::RefCell<heapless::Vec<u8, 4>>> =
            critical_section::Mutex::new(core::cell::RefCell::new(heapless::Vec::new()));

        struct TaggedSink(u8);
        impl Sink for TaggedSink {
            fn emit(&self, _module: &str, _function: &str, _level: Severity, _line: &str) -> bool {
                critical_section::with(|cs| {
                    let _ = ORDER.borrow(cs).borrow_mut().push(self.0);
                });
                true
            }
        }

        static FIRST: TaggedSink = TaggedSink(1);
        static SECOND: TaggedSink = TaggedSink(2);

        let registry: SinkRegistry<2> = SinkRegistry::new();
        registry.register(&FIRST).unwrap();
        registry.register(&SECOND).unwrap();
        let failures = registry.emit_all("m", "f", Severity::Info, "hello");
        assert_eq!(failures, 0);

        critical_section::with(|cs| {
            assert_eq!(ORDER.borrow(cs).borrow().as_slice(), &[1, 2]);
        });
    }

    #[test]
    fn emit_all_counts_failures_but_still_reaches_every_sink() {
        struct FailingSink {
            calls: AtomicUsize,
        }
        impl Sink for FailingSink {
            fn emit(&self, _module: &str, _function: &str, _level: Severity, _line: &str) -> bool {
                self.calls.fetch_add(1, Ordering::Relaxed);
                false
            }
        }

        static A: FailingSink = FailingSink {
            calls: AtomicUsize::new(0),
        };
        static B: CountingSink = CountingSink {
            calls: AtomicUsize::new(0),
        };

        let registry: SinkRegistry<2> = SinkRegistry::new();
        registry.register(&A).unwrap();
        registry.register(&B).unwrap();

        let failures = registry.emit_all("m", "f", Severity::Info, "hello");
        assert_eq!(failures, 1);
        assert_eq!(A.calls.load(Ordering::Relaxed), 1);
        assert_eq!(B.calls.load(Ordering::Relaxed), 1);
    }
}
