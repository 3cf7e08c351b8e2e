//! The fixed-size message slab.
//!
//! The source's pool is a bump allocator over a single byte arena: `used` only ever advances on
//! allocation and only rewinds on `free` when the freed message happens to be the most recently
//! allocated one. That is correct only when messages are freed in exact reverse allocation order,
//! which a FIFO queue draining into a single worker does not guarantee once more than one message
//! is in flight — see `DESIGN.md` and SPEC_FULL.md §3/§9. This pool instead carves the arena into
//! `MAX_MESSAGES` fixed-size slots up front and tracks free slots with a free list, so any slot
//! can be reclaimed independently of arena position; the externally observable contract (`alloc`
//! may fail with `NoSpace`, `free` always succeeds) is unchanged.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, Ordering};

use heapless::Vec as FixedVec;

use crate::error::Error;
use crate::message::{LogMessage, MessageHandle};
use crate::severity::Severity;

/// A fixed-size arena of `MAX_MESSAGES` slots, each able to hold a header plus up to
/// `MAX_ARGS_BYTES` of captured arguments.
///
/// Every mutating operation runs inside a [`critical_section::with`] region, which is valid to
/// enter from both thread and interrupt context and never suspends the caller — the IRQ-disable
/// discipline SPEC_FULL.md §9's Open Question calls for in place of the source's "take a mutex,
/// yield on failure from ISR" pattern (which is unsound: a mutex cannot be taken from ISR context
/// under most RTOS contracts).
pub struct MessagePool<const MAX_MESSAGES: usize, const MAX_ARGS_BYTES: usize> {
    slots: UnsafeCell<[LogMessage<MAX_ARGS_BYTES>; MAX_MESSAGES]>,
    free: UnsafeCell<FixedVec<u16, MAX_MESSAGES>>,
    initialized: AtomicBool,
}

// SAFETY: all access to `slots` and `free` is mediated by `critical_section::with`, or (for
// `message_mut`/`args_mut`) by the exclusive-ownership discipline documented on `MessageHandle`.
unsafe impl<const MAX_MESSAGES: usize, const MAX_ARGS_BYTES: usize> Sync
    for MessagePool<MAX_MESSAGES, MAX_ARGS_BYTES>
{
}

impl<const MAX_MESSAGES: usize, const MAX_ARGS_BYTES: usize>
    MessagePool<MAX_MESSAGES, MAX_ARGS_BYTES>
{
    /// Creates an empty, uninitialized pool. `const fn` so it can back a `static`.
    pub const fn new() -> Self {
        MessagePool {
            slots: UnsafeCell::new([LogMessage::empty(); MAX_MESSAGES]),
            free: UnsafeCell::new(FixedVec::new()),
            initialized: AtomicBool::new(false),
        }
    }

    /// Populates the free list with every slot. Must run once before the first `alloc`; calling
    /// it again is harmless (it simply resets the free list, which is safe only if no messages
    /// are outstanding — the same one-shot discipline the source's `log_pool_init` assumes).
    pub fn init(&self) {
        critical_section::with(|_cs| {
            // SAFETY: exclusive access for the duration of the critical section.
            let free = unsafe { &mut *self.free.get() };
            free.clear();
            for slot in 0..MAX_MESSAGES as u16 {
                // Cannot fail: `free`'s capacity is exactly `MAX_MESSAGES`.
                let _ = free.push(slot);
            }
        });
        self.initialized.store(true, Ordering::Release);
    }

    /// Allocates a slot sized for `args_size` bytes of captured arguments and stamps its header.
    /// Returns [`Error::NoSpace`] if `args_size` exceeds the slot capacity or no slot is free.
    pub(crate) fn alloc(
        &self,
        module: &'static str,
        function: &'static str,
        level: Severity,
        format_string: &'static str,
        args_size: usize,
    ) -> Result<MessageHandle, Error> {
        if args_size > MAX_ARGS_BYTES {
            return Err(Error::NoSpace);
        }

        critical_section::with(|_cs| {
            // SAFETY: exclusive access for the duration of the critical section.
            let free = unsafe { &mut *self.free.get() };
            let slot = free.pop().ok_or(Error::NoSpace)?;

            // SAFETY: `slot` was just taken off the free list, so no other owner can be
            // concurrently touching it; `slots` access itself is still inside the same critical
            // section to avoid torn writes if a concurrent ISR allocator is mid-scan.
            let msg = unsafe { &mut (*self.slots.get())[slot as usize] };
            msg.module = module;
            msg.function = function;
            msg.level = level;
            msg.format_string = format_string;
            msg.args_buffer_size = args_size;

            Ok(MessageHandle { slot })
        })
    }

    /// Returns a slot to the free list. Tolerates an out-of-range handle as a no-op (mirrors the
    /// source's `NULL` tolerance) — this can only happen from a caller bug, never as a result of
    /// normal operation, since handles are only ever produced by [`Self::alloc`].
    pub(crate) fn free(&self, handle: MessageHandle) {
        if handle.slot as usize >= MAX_MESSAGES {
            return;
        }
        critical_section::with(|_cs| {
            // SAFETY: exclusive access for the duration of the critical section.
            let free = unsafe { &mut *self.free.get() };
            // A push can only fail if the free list is already full, i.e. this handle was
            // already freed (a double free). Free always "succeeds" from the caller's
            // perspective; we simply decline to corrupt the free list further.
            let _ = free.push(handle.slot);
        });
    }

    /// Mutable access to a slot's captured-argument buffer, to pack arguments into it.
    ///
    /// # Safety contract (not a `unsafe fn`, but relies on the following invariant)
    ///
    /// Only sound to call with a handle that the caller currently and exclusively owns (i.e.
    /// between a successful [`Self::alloc`] and the corresponding [`Self::free`]/enqueue), which
    /// is always true of every call site in this crate.
    pub(crate) fn args_buffer_mut(&self, handle: MessageHandle) -> &mut [u8] {
        // SAFETY: see doc comment; the caller holds exclusive ownership of this slot. Reached via
        // raw-pointer `.add()` rather than array indexing through `&mut *self.slots.get()`:
        // indexing through a reference would momentarily assert a reference to the *whole*
        // backing array, which races with a concurrent `with_message`/`args_buffer_mut` call on a
        // different slot even though the two touch disjoint memory.
        let base = self.slots.get() as *mut LogMessage<MAX_ARGS_BYTES>;
        let msg = unsafe { &mut *base.add(handle.slot as usize) };
        let n = msg.args_buffer_size;
        &mut msg.args_buffer[..n]
    }

    /// Read-only access to a slot, for the worker's fan-out to sinks.
    pub(crate) fn with_message<R>(
        &self,
        handle: MessageHandle,
        f: impl FnOnce(&LogMessage<MAX_ARGS_BYTES>) -> R,
    ) -> R {
        // SAFETY: the worker is the sole reader of a dequeued handle; no producer can be
        // concurrently mutating the same slot, since the handle left their ownership at enqueue.
        // Reached via raw-pointer `.add()` for the same reason as `args_buffer_mut` above.
        let base = self.slots.get() as *const LogMessage<MAX_ARGS_BYTES>;
        let msg = unsafe { &*base.add(handle.slot as usize) };
        f(msg)
    }

    /// Number of slots currently allocated (not yet freed). Used by tests to assert pool
    /// conservation (SPEC_FULL.md §8, property 3).
    pub fn outstanding(&self) -> usize {
        critical_section::with(|_cs| {
            let free = unsafe { &*self.free.get() };
            MAX_MESSAGES - free.len()
        })
    }
}

impl<const MAX_MESSAGES: usize, const MAX_ARGS_BYTES: usize> Default
    for MessagePool<MAX_MESSAGES, MAX_ARGS_BYTES>
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_and_free_is_conserved_out_of_order() {
        let pool: MessagePool<4, 16> = MessagePool::new();
        pool.init();

        let a = pool.alloc("m", "f", Severity::Info, "a", 0).unwrap();
        let b = pool.alloc("m", "f", Severity::Info, "b", 0).unwrap();
        let c = pool.alloc("m", "f", Severity::Info, "c", 0).unwrap();
        assert_eq!(pool.outstanding(), 3);

        // Free the middle allocation first -- a bump allocator could not reclaim this.
        pool.free(b);
        assert_eq!(pool.outstanding(), 2);

        pool.free(a);
        pool.free(c);
        assert_eq!(pool.outstanding(), 0);
    }

    #[test]
    fn alloc_fails_once_slots_are_exhausted() {
        let pool: MessagePool<2, 16> = MessagePool::new();
        pool.init();

        assert!(pool.alloc("m", "f", Severity::Info, "a", 0).is_ok());
        assert!(pool.alloc("m", "f", Severity::Info, "b", 0).is_ok());
        assert_eq!(
            pool.alloc("m", "f", Severity::Info, "c", 0).unwrap_err(),
            Error::NoSpace
        );
    }

    #[test]
    fn alloc_rejects_args_larger_than_the_slot() {
        let pool: MessagePool<2, 4> = MessagePool::new();
        pool.init();
        assert_eq!(
            pool.alloc("m", "f", Severity::Info, "%lld", 8).unwrap_err(),
            Error::NoSpace
        );
    }

    #[test]
    fn free_of_out_of_range_handle_is_a_no_op() {
        let pool: MessagePool<2, 4> = MessagePool::new();
        pool.init();
        pool.free(MessageHandle { slot: 99 });
        assert_eq!(pool.outstanding(), 0);
    }
}
