//! The status taxonomy this core can return.
//!
//! Realized as a plain `Result`-friendly enum rather than the source's bare integer status codes
//! (`0`/`-EINVAL`/`-ENOSPC`/`-EIO`), per SPEC_FULL.md §1.1 — idiomatic Rust error propagation is
//! ambient stack, not a feature the spec's Non-goals exclude.

use core::fmt;

/// Every way a call into this crate can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A precondition was violated at the API boundary (null/empty format, unregisterable sink).
    /// Always a caller bug.
    InvalidArgument,
    /// The pool or queue is exhausted. An expected operating condition under burst load; the
    /// message is dropped and there is no retry inside the core.
    NoSpace,
    /// An internal invariant broke (e.g. `capture` wrote zero bytes for a non-empty format).
    IoError,
    /// A submission arrived before [`crate::Logger::init`] completed.
    NotInitialized,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Error::InvalidArgument => "invalid argument",
            Error::NoSpace => "no space",
            Error::IoError => "io error",
            Error::NotInitialized => "not initialized",
        };
        f.write_str(s)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
