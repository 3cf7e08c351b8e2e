//! The captured-argument representation.
//!
//! The original C implementation this core is modeled on captures a `va_list` into a byte buffer
//! and later reconstructs a synthetic `va_list` pointing back into it so a platform `vsnprintf`
//! can read the arguments. Rust has no portable equivalent of a C variadic argument list, so this
//! crate replaces it with [`LogArg`]: a closed enum with one variant per row of the format
//! specifier's captured-type table. A log call site builds a `&[LogArg]` (the front-end macro
//! this crate's scope excludes would normally do this for the caller); the core analyzes, packs,
//! and later unpacks that array using the exact same byte widths the original's `sizeof` table
//! specifies.

/// The shape of a single captured argument, one variant per row of the specifier table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogArg {
    /// `%d`, `%i`, `%o`, `%u`, `%x`, `%X`, `%c` with no length modifier, or `h`/`hh`.
    Int(i32),
    /// `%d` et al. with the `l` length modifier.
    Long(i32),
    /// `%d` et al. with the `ll` length modifier.
    LongLong(i64),
    /// `%d` et al. with the `z` length modifier.
    Size(u32),
    /// `%d` et al. with the `t` length modifier.
    PtrDiff(i32),
    /// `%d` et al. with the `j` length modifier.
    IntMax(i64),
    /// `%f`, `%F`, `%e`, `%E`, `%g`, `%G`.
    Double(f64),
    /// `%s` — must point to `'static` storage, enforced by the argument's lifetime.
    Str(&'static str),
    /// `%p` or `%n` — an opaque address. `%n`'s target is captured for byte-accounting parity
    /// with the source table but is never dereferenced or written back; performing a raw pointer
    /// write from a deferred, possibly-long-since-returned call site is exactly the kind of
    /// unsoundness this design avoids.
    Ptr(usize),
}

/// The byte width a [`LogArg`] variant occupies in the capture buffer.
///
/// `Int`, `Long`, `Size`, and `PtrDiff` are fixed at 4 bytes and `LongLong`, `IntMax`, and
/// `Double` at 8 bytes regardless of host platform: these are properties of the *target* embedded
/// device (a 32-bit Cortex-M-class ABI, matching the source's default target family), not of the
/// machine running `cargo test`. `Str` and `Ptr` store a native in-process pointer (and, for
/// `Str`, a length, since Rust string slices are not NUL-terminated) rather than a
/// target-independent numeric value — these are only ever decoded within the same process that
/// captured them, so using the host's native pointer width is correct and simpler than fixing an
/// arbitrary cross-target pointer size.
pub(crate) const INT_BYTES: usize = 4;
pub(crate) const LONG_BYTES: usize = 4;
pub(crate) const LONG_LONG_BYTES: usize = 8;
pub(crate) const SIZE_BYTES: usize = 4;
pub(crate) const PTRDIFF_BYTES: usize = 4;
pub(crate) const INTMAX_BYTES: usize = 8;
pub(crate) const DOUBLE_BYTES: usize = 8;
pub(crate) const PTR_BYTES: usize = core::mem::size_of::<usize>();
pub(crate) const STR_BYTES: usize = 2 * PTR_BYTES;

impl LogArg {
    /// Byte width this argument occupies in the capture buffer, per its variant.
    pub(crate) fn width(&self) -> usize {
        match self {
            LogArg::Int(_) => INT_BYTES,
            LogArg::Long(_) => LONG_BYTES,
            LogArg::LongLong(_) => LONG_LONG_BYTES,
            LogArg::Size(_) => SIZE_BYTES,
            LogArg::PtrDiff(_) => PTRDIFF_BYTES,
            LogArg::IntMax(_) => INTMAX_BYTES,
            LogArg::Double(_) => DOUBLE_BYTES,
            LogArg::Str(_) => STR_BYTES,
            LogArg::Ptr(_) => PTR_BYTES,
        }
    }

    /// Encodes this argument into `dst`, returning the number of bytes written, or `None` if
    /// `dst` is shorter than [`LogArg::width`].
    pub(crate) fn encode(&self, dst: &mut [u8]) -> Option<usize> {
        let width = self.width();
        if dst.len() < width {
            return None;
        }
        match *self {
            LogArg::Int(v) => dst[..width].copy_from_slice(&v.to_ne_bytes()),
            LogArg::Long(v) => dst[..width].copy_from_slice(&v.to_ne_bytes()),
            LogArg::LongLong(v) => dst[..width].copy_from_slice(&v.to_ne_bytes()),
            LogArg::Size(v) => dst[..width].copy_from_slice(&v.to_ne_bytes()),
            LogArg::PtrDiff(v) => dst[..width].copy_from_slice(&v.to_ne_bytes()),
            LogArg::IntMax(v) => dst[..width].copy_from_slice(&v.to_ne_bytes()),
            LogArg::Double(v) => dst[..width].copy_from_slice(&v.to_ne_bytes()),
            LogArg::Str(s) => {
                let ptr = s.as_ptr() as usize;
                let len = s.len();
                dst[..PTR_BYTES].copy_from_slice(&ptr.to_ne_bytes());
                dst[PTR_BYTES..width].copy_from_slice(&len.to_ne_bytes());
            }
            LogArg::Ptr(p) => dst[..width].copy_from_slice(&p.to_ne_bytes()),
        }
        Some(width)
    }
}

/// The conversion's captured-argument shape, independent of the concrete value — what
/// [`super::format`]'s scanner derives from flags/length-modifier/conversion-character, and what
/// both `size_of`/`capture` and the [`super::reconstruct`] formatter key their byte widths on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArgKind {
    Int,
    Long,
    LongLong,
    Size,
    PtrDiff,
    IntMax,
    Double,
    Str,
    Ptr,
}

impl ArgKind {
    pub(crate) fn width(self) -> usize {
        match self {
            ArgKind::Int => INT_BYTES,
            ArgKind::Long => LONG_BYTES,
            ArgKind::LongLong => LONG_LONG_BYTES,
            ArgKind::Size => SIZE_BYTES,
            ArgKind::PtrDiff => PTRDIFF_BYTES,
            ArgKind::IntMax => INTMAX_BYTES,
            ArgKind::Double => DOUBLE_BYTES,
            ArgKind::Str => STR_BYTES,
            ArgKind::Ptr => PTR_BYTES,
        }
    }

    /// Whether a [`LogArg`] value matches the shape this conversion expects.
    pub(crate) fn matches(self, arg: &LogArg) -> bool {
        matches!(
            (self, arg),
            (ArgKind::Int, LogArg::Int(_))
                | (ArgKind::Long, LogArg::Long(_))
                | (ArgKind::LongLong, LogArg::LongLong(_))
                | (ArgKind::Size, LogArg::Size(_))
                | (ArgKind::PtrDiff, LogArg::PtrDiff(_))
                | (ArgKind::IntMax, LogArg::IntMax(_))
                | (ArgKind::Double, LogArg::Double(_))
                | (ArgKind::Str, LogArg::Str(_))
                | (ArgKind::Ptr, LogArg::Ptr(_))
        )
    }
}
