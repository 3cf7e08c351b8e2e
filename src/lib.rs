//! A deferred, thread- and interrupt-safe logging core for real-time embedded systems.
//!
//! Call sites capture their arguments at the point of invocation into a self-contained message,
//! hand it off to a background worker, and return promptly; the worker formats the message and
//! fans it out to every registered [`Sink`]. All storage is statically reserved at compile time
//! (`const` generics size the pool, queue, and sink registry) and the submission path never
//! allocates and never blocks when called from interrupt context.
//!
//! # Working principle
//!
//! ```text
//! submit()/submit_from_isr()
//!     -> Analyzer::size_of(format)         // how many bytes do the args need?
//!     -> MessagePool::alloc(size)          // carve a slot out of the static arena
//!     -> Analyzer::capture(format, args)   // pack the args into the slot
//!     -> MessageQueue::enqueue(handle)     // hand off to the worker, non-blocking
//!
//! worker loop (run on a long-lived task, outside this crate's scope to spawn)
//!     -> MessageQueue::dequeue()           // blocks the worker task, nothing else
//!     -> for each Sink: sink.emit(message) // re-walks the format string, formats, writes out
//!     -> MessagePool::free(handle)
//! ```
//!
//! This crate only implements the core above. The macro front-end that stamps a call site with
//! its module/function name, severity color, and timestamp, and the concrete sinks (UART, RTT,
//! file, network) that actually move bytes, are expected to live in the embedding application —
//! see the `demos` workspace member for a worked example of both.
//!
//! # `no_std` and testing
//!
//! This crate is `#![no_std]` by default. Enable the `std` Cargo feature (or build with
//! `cfg(test)`) to pull in a host-backed [`critical_section`] implementation so the core can be
//! exercised with `cargo test` without target hardware.
//!
//! # Concurrency discipline
//!
//! Every mutable piece of shared state ([`MessagePool`], [`MessageQueue`], [`SinkRegistry`]) is
//! guarded by a [`critical_section::with`] region rather than a schedulable mutex: entering a
//! critical section is valid from both thread and interrupt context and never suspends the
//! caller, which is what makes [`Logger::submit_from_isr`] sound. See `DESIGN.md` for the
//! rationale.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod arg;
mod error;
mod format;
mod logger;
mod message;
mod pool;
mod queue;
mod reconstruct;
mod severity;
mod sink;
mod stats;
mod worker;

pub use crate::arg::LogArg;
pub use crate::error::Error;
pub use crate::logger::Logger;
pub use crate::message::MessageHandle;
pub use crate::pool::MessagePool;
pub use crate::queue::{MessageQueue, SpinWait, WakeSignal};
#[cfg(any(test, feature = "std"))]
pub use crate::queue::StdWake;
pub use crate::severity::Severity;
pub use crate::sink::{Sink, SinkRegistry};
pub use crate::stats::Stats;
pub use crate::worker::run_worker;

/// Result type used throughout this crate; the `Err` side is always an [`Error`].
pub type Result<T> = core::result::Result<T, Error>;
