//! The bounded handle queue between producers and the worker.
//!
//! Every operation here runs inside a [`critical_section::with`] region — the same IRQ-disable
//! discipline the pool uses (see `pool.rs`) — so `enqueue`/`try_dequeue` are sound from both
//! thread and interrupt context without a schedulable mutex. The source's RTOS queue primitive
//! (`xQueueSend`/`xQueueReceive`) is itself ISR-safe for exactly this reason; this is the
//! `no_std`-portable equivalent SPEC_FULL.md §1 asks the core to require only an "abstract
//! contract" for.

use core::cell::UnsafeCell;

use heapless::Deque;

use crate::error::Error;
use crate::message::MessageHandle;

/// How the worker is woken up when a message becomes available.
///
/// The source's worker blocks forever on `xQueueReceive`; this core has no RTOS task primitive to
/// call, so blocking is factored out behind this trait (SPEC_FULL.md §1: "the core requires only
/// [the RTOS's] abstract contracts"). [`SpinWait`] is the portable `no_std` default — it never
/// suspends the calling task, it just busy-polls — and is meant to be replaced by an
/// RTOS-semaphore-backed implementation in a real deployment; [`StdWake`] is provided under the
/// `std` feature for host testing.
pub trait WakeSignal: Sync {
    /// Called by a producer immediately after a successful [`MessageQueue::enqueue`]. Must never
    /// block and must be sound to call from interrupt context.
    fn signal(&self);

    /// Called by the worker when the queue was empty. May suspend the calling task; only ever
    /// called from the worker's own thread context, never from an ISR.
    fn wait(&self);
}

/// The portable, always-available [`WakeSignal`]: the worker busy-polls the queue. Sound
/// everywhere, but burns CPU while idle — replace with a real RTOS semaphore/task notification in
/// production (see `demos/` for the pattern).
#[derive(Debug, Default)]
pub struct SpinWait;

impl WakeSignal for SpinWait {
    fn signal(&self) {}

    fn wait(&self) {
        core::hint::spin_loop();
    }
}

/// A bounded FIFO of [`MessageHandle`]s: multi-producer (tasks and ISRs), single-consumer (the
/// worker).
pub struct MessageQueue<const QUEUE_DEPTH: usize> {
    ring: UnsafeCell<Deque<MessageHandle, QUEUE_DEPTH>>,
}

// SAFETY: all access to `ring` is mediated by `critical_section::with`.
unsafe impl<const QUEUE_DEPTH: usize> Sync for MessageQueue<QUEUE_DEPTH> {}

impl<const QUEUE_DEPTH: usize> MessageQueue<QUEUE_DEPTH> {
    /// Creates an empty queue. `const fn` so it can back a `static`.
    pub const fn new() -> Self {
        MessageQueue {
            ring: UnsafeCell::new(Deque::new()),
        }
    }

    /// Enqueues `handle`. Never blocks: returns [`Error::NoSpace`] immediately if the queue is
    /// full, exactly as sound to call from an ISR as from a task.
    pub(crate) fn enqueue(&self, handle: MessageHandle) -> Result<(), Error> {
        critical_section::with(|_cs| {
            // SAFETY: exclusive access for the duration of the critical section.
            let ring = unsafe { &mut *self.ring.get() };
            ring.push_back(handle).map_err(|_| Error::NoSpace)
        })
    }

    /// Non-blocking dequeue: `None` if the queue is currently empty.
    pub(crate) fn try_dequeue(&self) -> Option<MessageHandle> {
        critical_section::with(|_cs| {
            // SAFETY: exclusive access for the duration of the critical section.
            let ring = unsafe { &mut *self.ring.get() };
            ring.pop_front()
        })
    }

    /// Blocks (via `signal`) until a handle is available, then returns it. Only ever called by
    /// the worker; producers only ever call [`Self::enqueue`].
    pub(crate) fn dequeue_blocking(&self, signal: &impl WakeSignal) -> MessageHandle {
        loop {
            if let Some(handle) = self.try_dequeue() {
                return handle;
            }
            signal.wait();
        }
    }

    /// Number of handles currently queued. Exposed for tests and diagnostics.
    pub fn len(&self) -> usize {
        critical_section::with(|_cs| unsafe { (*self.ring.get()).len() })
    }

    /// Whether the queue currently holds no handles.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<const QUEUE_DEPTH: usize> Default for MessageQueue<QUEUE_DEPTH> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "std"))]
mod std_wake {
    use super::WakeSignal;
    use std::sync::{Condvar, Mutex};

    /// A [`WakeSignal`] backed by a standard condition variable, for running this `no_std` core's
    /// worker loop under `cargo test` (or any other `std` host) without busy-polling.
    #[derive(Default)]
    pub struct StdWake {
        notified: Mutex<bool>,
        condvar: Condvar,
    }

    impl StdWake {
        /// Creates a fresh, unsignaled wake.
        pub const fn new() -> Self {
            StdWake {
                notified: Mutex::new(false),
                condvar: Condvar::new(),
            }
        }
    }

    impl WakeSignal for StdWake {
        fn signal(&self) {
            let mut notified = self.notified.lock().unwrap();
            *notified = true;
            self.condvar.notify_one();
        }

        fn wait(&self) {
            let mut notified = self.notified.lock().unwrap();
            while !*notified {
                notified = self.condvar.wait(notified).unwrap();
            }
            *notified = false;
        }
    }
}

#[cfg(any(test, feature = "std"))]
pub use std_wake::StdWake;
