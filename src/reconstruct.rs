//! The Formatter: turns a format string plus a captured-argument buffer back into text.
//!
//! The source reconstructs a synthetic `va_list` whose argument pointers alias into the captured
//! buffer, then hands it to the platform's `vsnprintf`. That trick only works because C's ABI lets
//! a `va_list` be forged out of raw memory; Rust has nothing analogous; and SPEC_FULL.md §9
//! suggests the cleaner alternative taken here: re-walk the format string with the exact same
//! [`crate::format::Scanner`] the Analyzer used, decoding the matching byte range out of the buffer
//! at each conversion instead of letting `vsnprintf` do it. This is what makes "the capture and the
//! reconstruction are driven by the same format string" load-bearing rather than aspirational: both
//! sides literally call the same scanner.

use ufmt::uWrite;

use crate::arg::{ArgKind, PTR_BYTES};
use crate::format::{ConversionSpec, Scanner, Token};

/// Formats `format_string` against the raw bytes `args` (as produced by
/// [`crate::format::capture`]) into `out`.
///
/// Conversions whose expected bytes run past the end of `args` stop formatting early and leave the
/// rest of the format string untouched, mirroring [`crate::format::capture`]'s own "stop at
/// capacity" behavior rather than panicking on a message that was itself truncated at capture time.
pub(crate) fn reconstruct<W: uWrite>(out: &mut W, format_string: &str, args: &[u8]) -> Result<(), W::Error> {
    let mut offset = 0usize;

    for token in Scanner::new(format_string) {
        match token {
            Token::Literal(lit) => out.write_str(lit)?,
            Token::Conversion(spec) => {
                let width = spec.kind.width();
                let Some(bytes) = args.get(offset..offset + width) else {
                    break;
                };
                offset += width;
                write_conversion(out, &spec, bytes)?;
            }
        }
    }

    Ok(())
}

fn write_conversion<W: uWrite>(out: &mut W, spec: &ConversionSpec, bytes: &[u8]) -> Result<(), W::Error> {
    match spec.kind {
        ArgKind::Int if spec.conv == 'c' => {
            let code = i32::from_ne_bytes(bytes.try_into().unwrap());
            write_char_arg(out, spec, code as u8 as char)
        }
        ArgKind::Int => write_int(out, spec, i32::from_ne_bytes(bytes.try_into().unwrap()) as i64),
        ArgKind::Long => write_int(out, spec, i32::from_ne_bytes(bytes.try_into().unwrap()) as i64),
        ArgKind::LongLong => write_int(out, spec, i64::from_ne_bytes(bytes.try_into().unwrap())),
        ArgKind::Size => write_uint(out, spec, u32::from_ne_bytes(bytes.try_into().unwrap()) as u64),
        ArgKind::PtrDiff => write_int(out, spec, i32::from_ne_bytes(bytes.try_into().unwrap()) as i64),
        ArgKind::IntMax => write_int(out, spec, i64::from_ne_bytes(bytes.try_into().unwrap())),
        ArgKind::Double => write_double(out, spec, f64::from_ne_bytes(bytes.try_into().unwrap())),
        ArgKind::Str => write_str_arg(out, spec, bytes),
        ArgKind::Ptr => write_ptr(out, spec, bytes),
    }
}

/// Decodes and writes a `%s` argument. `bytes` holds a native pointer followed by a native length,
/// the fat-pointer encoding [`crate::arg::LogArg::Str`] packs (see its doc comment).
///
/// # Safety
/// Sound only because the pointer was captured from a live `&'static str` (the only way a
/// [`crate::arg::LogArg::Str`] can be constructed) and this crate only ever decodes a buffer within
/// the same process that captured it.
fn write_str_arg<W: uWrite>(out: &mut W, spec: &ConversionSpec, bytes: &[u8]) -> Result<(), W::Error> {
    let ptr = usize::from_ne_bytes(bytes[..PTR_BYTES].try_into().unwrap());
    let len = usize::from_ne_bytes(bytes[PTR_BYTES..].try_into().unwrap());
    let s = unsafe {
        let slice = core::slice::from_raw_parts(ptr as *const u8, len);
        core::str::from_utf8_unchecked(slice)
    };
    let s = match spec.precision {
        // `p` counts characters, not bytes, and need not fall on a UTF-8 boundary (e.g. `%.2s`
        // on `"héllo"`): truncate after the `p`th character rather than at byte offset `p`.
        Some(p) => match s.char_indices().nth(p) {
            Some((i, _)) => &s[..i],
            None => s,
        },
        None => s,
    };
    write_padded(out, s, spec)
}

/// Writes a `%c` argument: the low byte of the captured int, as a single character.
fn write_char_arg<W: uWrite>(out: &mut W, spec: &ConversionSpec, c: char) -> Result<(), W::Error> {
    let mut tmp = [0u8; 4];
    write_padded(out, c.encode_utf8(&mut tmp), spec)
}

fn write_ptr<W: uWrite>(out: &mut W, spec: &ConversionSpec, bytes: &[u8]) -> Result<(), W::Error> {
    if spec.conv == 'n' {
        // `%n` ordinarily writes the output-so-far count back through the pointer. This core
        // never performs that write (see `LogArg::Ptr`'s doc comment), so `%n` is a no-op here:
        // the argument was captured only for byte-accounting parity with the source's table.
        return Ok(());
    }
    let addr = usize::from_ne_bytes(bytes.try_into().unwrap());
    let mut buf = [0u8; 2 * core::mem::size_of::<usize>()];
    let digits = format_uint(&mut buf, addr as u64, 16, false);
    let mut tmp: heapless::String<34> = heapless::String::new();
    let _ = tmp.push_str("0x");
    let _ = tmp.push_str(digits);
    write_padded(out, &tmp, spec)
}

fn write_int<W: uWrite>(out: &mut W, spec: &ConversionSpec, value: i64) -> Result<(), W::Error> {
    let negative = value < 0;
    let magnitude = value.unsigned_abs();
    let mut buf = [0u8; 24];
    let digits = format_uint(&mut buf, magnitude, radix_of(spec.conv), spec.conv == 'X');

    let mut tmp: heapless::String<40> = heapless::String::new();
    if negative {
        let _ = tmp.push('-');
    } else if spec.flags.plus {
        let _ = tmp.push('+');
    } else if spec.flags.space {
        let _ = tmp.push(' ');
    }
    push_digits_with_precision(&mut tmp, digits, magnitude == 0, spec.precision);
    write_padded(out, &tmp, spec)
}

fn write_uint<W: uWrite>(out: &mut W, spec: &ConversionSpec, value: u64) -> Result<(), W::Error> {
    let mut buf = [0u8; 24];
    let digits = format_uint(&mut buf, value, radix_of(spec.conv), spec.conv == 'X');
    let mut tmp: heapless::String<40> = heapless::String::new();
    push_digits_with_precision(&mut tmp, digits, value == 0, spec.precision);
    write_padded(out, &tmp, spec)
}

/// Appends `digits` to `tmp`, left-padded with zeros to printf's `.precision` minimum digit
/// count (independent of the `0` width-padding flag `write_padded` applies separately). Per
/// printf, `.0` on a zero value prints no digits at all rather than a bare `0`.
fn push_digits_with_precision(tmp: &mut heapless::String<40>, digits: &str, is_zero: bool, precision: Option<usize>) {
    match precision {
        Some(0) if is_zero => {}
        Some(p) => {
            for _ in 0..p.saturating_sub(digits.len()) {
                let _ = tmp.push('0');
            }
            let _ = tmp.push_str(digits);
        }
        None => {
            let _ = tmp.push_str(digits);
        }
    }
}

fn radix_of(conv: char) -> u32 {
    match conv {
        'o' => 8,
        'x' | 'X' => 16,
        _ => 10,
    }
}

/// Printf's `%f`/`%F` produce a fixed-decimal expansion; `%e`/`%E`/`%g`/`%G` (scientific and
/// shortest-form notation) collapse to the same fixed-decimal rendering here rather than
/// implementing a second number-formatting path, a deliberate simplification recorded in
/// `DESIGN.md` — this core cares about getting a value onto a sink readably, not about matching
/// libc's notation choice byte for byte.
fn write_double<W: uWrite>(out: &mut W, spec: &ConversionSpec, value: f64) -> Result<(), W::Error> {
    let precision = spec.precision.unwrap_or(6).min(9);

    if value.is_nan() {
        return write_padded(out, "nan", spec);
    }
    if value.is_infinite() {
        return write_padded(out, if value < 0.0 { "-inf" } else { "inf" }, spec);
    }

    let negative = value.is_sign_negative();
    let magnitude = libm::fabs(value);
    let scale = libm::pow(10.0, precision as f64);
    let scaled = libm::round(magnitude * scale) as u64;
    let int_part = scaled / scale as u64;
    let frac_part = scaled % scale as u64;

    let mut int_buf = [0u8; 24];
    let int_digits = format_uint(&mut int_buf, int_part, 10, false);

    let mut tmp: heapless::String<64> = heapless::String::new();
    if negative {
        let _ = tmp.push('-');
    } else if spec.flags.plus {
        let _ = tmp.push('+');
    }
    let _ = tmp.push_str(int_digits);
    if precision > 0 {
        let _ = tmp.push('.');
        let mut frac_buf = [0u8; 24];
        let frac_digits = format_uint(&mut frac_buf, frac_part, 10, false);
        for _ in 0..precision.saturating_sub(frac_digits.len()) {
            let _ = tmp.push('0');
        }
        let _ = tmp.push_str(frac_digits);
    }
    write_padded(out, &tmp, spec)
}

/// Renders `value` in `radix` into `buf`, returning the written digits as a `str` (no sign, no
/// padding — those are applied by the caller).
fn format_uint(buf: &mut [u8], mut value: u64, radix: u32, uppercase: bool) -> &str {
    const DIGITS_LOWER: &[u8; 16] = b"0123456789abcdef";
    const DIGITS_UPPER: &[u8; 16] = b"0123456789ABCDEF";
    let digits = if uppercase { DIGITS_UPPER } else { DIGITS_LOWER };

    if value == 0 {
        buf[0] = b'0';
        return core::str::from_utf8(&buf[..1]).unwrap();
    }

    let mut i = buf.len();
    while value > 0 {
        i -= 1;
        buf[i] = digits[(value % radix as u64) as usize];
        value /= radix as u64;
    }
    core::str::from_utf8(&buf[i..]).unwrap()
}

/// Applies the conversion's width and alignment flags to `text`, writing the padded result.
fn write_padded<W: uWrite>(out: &mut W, text: &str, spec: &ConversionSpec) -> Result<(), W::Error> {
    let width = spec.width.unwrap_or(0);
    let len = text.chars().count();
    let pad = width.saturating_sub(len);

    let pad_char = if spec.flags.zero_pad && !spec.flags.left_align {
        '0'
    } else {
        ' '
    };

    if !spec.flags.left_align {
        for _ in 0..pad {
            out.write_char(pad_char)?;
        }
    }
    out.write_str(text)?;
    if spec.flags.left_align {
        for _ in 0..pad {
            out.write_char(' ')?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::capture;
    use crate::arg::LogArg;

    struct StrSink(heapless::String<256>);

    impl uWrite for StrSink {
        type Error = core::convert::Infallible;
        fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
            let _ = self.0.push_str(s);
            Ok(())
        }
    }

    fn render(format: &str, args: &[LogArg]) -> heapless::String<256> {
        let mut buf = [0u8; 64];
        let n = capture(format, args, &mut buf);
        let mut sink = StrSink(heapless::String::new());
        reconstruct(&mut sink, format, &buf[..n]).unwrap();
        sink.0
    }

    #[test]
    fn renders_literal_text_unchanged() {
        assert_eq!(render("hello world\n", &[]), "hello world\n");
    }

    #[test]
    fn renders_mixed_int_and_str() {
        let s = render("x=%d y=%s", &[LogArg::Int(42), LogArg::Str("ok")]);
        assert_eq!(s, "x=42 y=ok");
    }

    #[test]
    fn renders_negative_numbers_with_sign() {
        assert_eq!(render("%d", &[LogArg::Int(-7)]), "-7");
    }

    #[test]
    fn renders_char_conversion_as_a_character_not_a_number() {
        assert_eq!(render("[%c]", &[LogArg::Int(b'!' as i32)]), "[!]");
    }

    #[test]
    fn renders_hex_and_octal() {
        assert_eq!(render("%x %X %o", &[LogArg::Int(255), LogArg::Int(255), LogArg::Int(8)]), "ff FF 10");
    }

    #[test]
    fn renders_width_and_zero_pad() {
        assert_eq!(render("%05d", &[LogArg::Int(42)]), "00042");
    }

    #[test]
    fn renders_integer_precision_as_minimum_digit_count() {
        assert_eq!(render("%.5d", &[LogArg::Int(42)]), "00042");
        assert_eq!(render("%.5d", &[LogArg::Int(-42)]), "-00042");
        assert_eq!(render("%.0d", &[LogArg::Int(0)]), "");
    }

    #[test]
    fn renders_str_precision_on_a_char_boundary_not_a_byte_offset() {
        // "héllo": 'é' is a 2-byte UTF-8 character, so byte offset 2 falls mid-character.
        // Precision counts characters, so `%.2s` must take "hé", not panic or split it.
        assert_eq!(render("%.2s", &[LogArg::Str("héllo")]), "h\u{e9}");
    }

    #[test]
    fn renders_long_long_values() {
        assert_eq!(render("%lld", &[LogArg::LongLong(1i64 << 40)]), "1099511627776");
    }

    #[test]
    fn renders_double_with_default_precision() {
        assert_eq!(render("%f", &[LogArg::Double(3.5)]), "3.500000");
    }

    #[test]
    fn percent_percent_renders_as_a_single_percent() {
        assert_eq!(render("100%% done", &[]), "100% done");
    }

    #[test]
    fn stops_early_if_args_were_truncated_at_capture() {
        // A 2-byte destination can't hold a 4-byte int at all, so `capture` writes nothing and
        // reconstruction should just emit the literal prefix.
        let mut buf = [0u8; 2];
        let n = capture("x=%d", &[LogArg::Int(42)], &mut buf);
        let mut sink = StrSink(heapless::String::new());
        reconstruct(&mut sink, "x=%d", &buf[..n]).unwrap();
        assert_eq!(sink.0, "x=");
    }
}
