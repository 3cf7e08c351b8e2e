//! Format-string analysis: the pure functions that size and pack a capture buffer.
//!
//! Both [`size_of`]/[`capture`] here and the [`crate::reconstruct`] formatter drive off the same
//! [`Scanner`], so the two are structurally incapable of disagreeing about where one conversion
//! ends and the next begins — the invariant the source's header calls out ("the capture and the
//! reconstruction must be driven by the same format string, or behavior is undefined") is upheld
//! by construction rather than by convention.

use crate::arg::{ArgKind, LogArg};

/// Printf-style flag characters (`-`, `+`, ` `, `#`, `0`) preceding width/precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Flags {
    pub left_align: bool,
    pub plus: bool,
    pub space: bool,
    pub alt: bool,
    pub zero_pad: bool,
}

/// A single parsed `%...` conversion specification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ConversionSpec {
    pub conv: char,
    pub flags: Flags,
    pub width: Option<usize>,
    pub precision: Option<usize>,
    pub kind: ArgKind,
}

/// One scanned unit of a format string: either a run of literal text to copy through verbatim, or
/// a conversion specification that consumes one captured argument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Token<'a> {
    Literal(&'a str),
    Conversion(ConversionSpec),
}

/// Scans a format string into [`Token`]s, one `%`-introduced specification (or literal run) at a
/// time. `%%` is collapsed into a single literal `%`. An unrecognized conversion character
/// contributes no captured bytes, mirroring the source parser's silent fallthrough for specifiers
/// outside its switch statement.
pub(crate) struct Scanner<'a> {
    rest: &'a str,
}

impl<'a> Scanner<'a> {
    pub(crate) fn new(format: &'a str) -> Self {
        Scanner { rest: format }
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        loop {
            if self.rest.is_empty() {
                return None;
            }

            let bytes = self.rest.as_bytes();

            if bytes[0] != b'%' {
                let end = bytes.iter().position(|&b| b == b'%').unwrap_or(bytes.len());
                let (lit, rest) = self.rest.split_at(end);
                self.rest = rest;
                return Some(Token::Literal(lit));
            }

            // `bytes[0] == b'%'`
            if bytes.len() >= 2 && bytes[1] == b'%' {
                self.rest = &self.rest[2..];
                return Some(Token::Literal("%"));
            }

            let mut j = 1usize;
            let mut flags = Flags::default();
            loop {
                match bytes.get(j) {
                    Some(b'-') => flags.left_align = true,
                    Some(b'+') => flags.plus = true,
                    Some(b' ') => flags.space = true,
                    Some(b'#') => flags.alt = true,
                    Some(b'0') => flags.zero_pad = true,
                    _ => break,
                }
                j += 1;
            }

            let width_start = j;
            while matches!(bytes.get(j), Some(b'0'..=b'9')) {
                j += 1;
            }
            let width = if j > width_start {
                self.rest[width_start..j].parse::<usize>().ok()
            } else {
                None
            };

            let mut precision = None;
            if bytes.get(j) == Some(&b'.') {
                j += 1;
                let prec_start = j;
                while matches!(bytes.get(j), Some(b'0'..=b'9')) {
                    j += 1;
                }
                precision = Some(self.rest[prec_start..j].parse::<usize>().unwrap_or(0));
            }

            let (length_kind, after_length) = match bytes.get(j) {
                Some(b'h') => (Some(ArgKind::Int), j + if bytes.get(j + 1) == Some(&b'h') { 2 } else { 1 }),
                Some(b'l') => {
                    if bytes.get(j + 1) == Some(&b'l') {
                        (Some(ArgKind::LongLong), j + 2)
                    } else {
                        (Some(ArgKind::Long), j + 1)
                    }
                }
                Some(b'z') => (Some(ArgKind::Size), j + 1),
                Some(b't') => (Some(ArgKind::PtrDiff), j + 1),
                Some(b'j') => (Some(ArgKind::IntMax), j + 1),
                _ => (None, j),
            };

            let conv = match self.rest[after_length..].chars().next() {
                Some(c) => c,
                None => {
                    // Truncated specifier (e.g. a trailing `%` or `%l` with nothing after it):
                    // there is no conversion character to act on, so the rest of the string is
                    // emitted as literal text and scanning stops.
                    let lit = self.rest;
                    self.rest = "";
                    return Some(Token::Literal(lit));
                }
            };
            let conv_end = after_length + conv.len_utf8();

            let kind = match conv {
                'd' | 'i' | 'o' | 'u' | 'x' | 'X' | 'c' => length_kind.unwrap_or(ArgKind::Int),
                'f' | 'F' | 'e' | 'E' | 'g' | 'G' => ArgKind::Double,
                's' => ArgKind::Str,
                'p' | 'n' => ArgKind::Ptr,
                _ => {
                    // Unknown conversion character: zero captured bytes, same as the source.
                    self.rest = &self.rest[conv_end..];
                    continue;
                }
            };

            self.rest = &self.rest[conv_end..];
            return Some(Token::Conversion(ConversionSpec {
                conv,
                flags,
                width,
                precision,
                kind,
            }));
        }
    }
}

/// Computes the number of bytes [`capture`] will need to pack every argument `format` describes.
pub fn size_of(format: &str) -> usize {
    Scanner::new(format)
        .filter_map(|t| match t {
            Token::Conversion(spec) => Some(spec.kind.width()),
            Token::Literal(_) => None,
        })
        .sum()
}

/// Packs `args` into `dst` in the layout `format`'s conversions describe, in order. Returns the
/// number of bytes written, stopping early if `dst` fills up or `args` runs out. Returns 0 if
/// `dst` is empty or `format` has no conversions to capture.
pub fn capture(format: &str, args: &[LogArg], dst: &mut [u8]) -> usize {
    if dst.is_empty() {
        return 0;
    }

    let mut written = 0;
    let mut arg_idx = 0;

    for token in Scanner::new(format) {
        let spec = match token {
            Token::Conversion(spec) => spec,
            Token::Literal(_) => continue,
        };

        let Some(arg) = args.get(arg_idx) else {
            break;
        };
        arg_idx += 1;

        if !spec.kind.matches(arg) {
            break;
        }

        match arg.encode(&mut dst[written..]) {
            Some(n) => written += n,
            None => break,
        }
    }

    written
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_of_counts_matches_the_specifier_table() {
        assert_eq!(size_of("hello\n"), 0);
        assert_eq!(size_of("x=%d y=%s"), 4 + crate::arg::STR_BYTES);
        assert_eq!(size_of("%lld"), 8);
        assert_eq!(size_of("100%% done"), 0);
        assert_eq!(size_of("%hhd %hd %ld %lld %zd %td %jd"), 4 + 4 + 4 + 8 + 4 + 4 + 8);
    }

    #[test]
    fn capture_matches_size_of_for_matching_args() {
        let fmt = "x=%d y=%s";
        let args = [LogArg::Int(42), LogArg::Str("ok")];
        let mut buf = [0u8; 64];
        let n = capture(fmt, &args, &mut buf);
        assert_eq!(n, size_of(fmt));
    }

    #[test]
    fn capture_stops_at_capacity() {
        let fmt = "%d%d%d";
        let args = [LogArg::Int(1), LogArg::Int(2), LogArg::Int(3)];
        let mut buf = [0u8; 6];
        let n = capture(fmt, &args, &mut buf);
        assert_eq!(n, 4); // two 4-byte ints don't fit in 6 bytes; only the first is written
    }

    #[test]
    fn capture_returns_zero_for_zero_capacity() {
        let mut buf: [u8; 0] = [];
        assert_eq!(capture("%d", &[LogArg::Int(1)], &mut buf), 0);
    }

    #[test]
    fn percent_percent_contributes_no_bytes_and_is_literal() {
        let tokens: Vec<_> = Scanner::new("100%% done").collect();
        assert_eq!(
            tokens,
            vec![
                Token::Literal("100"),
                Token::Literal("%"),
                Token::Literal(" done"),
            ]
        );
    }
}
