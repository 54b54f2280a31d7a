use crate::dialect::{Dialect, RowEnding};
use crate::needs_encode::NeedsEncodeScan;

/// When a value is wrapped in the escape-start/escape-end char on write.
///
/// Mirrors the teacher's `QuoteStyle`, generalized to a dialect that may not
/// configure an escape char at all (`Never` is then the only legal choice).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EscapeStyle {
    Always,
    Necessary,
    Never,
}

impl Default for EscapeStyle {
    fn default() -> EscapeStyle {
        EscapeStyle::Necessary
    }
}

/// Result of a single `FieldWriter::write` call against a caller buffer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WriteResult {
    /// The field (or as much of it as fits) was written; the `usize` is how
    /// many output chars were used.
    Written(usize),
    /// The output buffer is too small to hold even one escape/separator
    /// char; caller must grow the buffer and retry.
    OutputFull,
}

/// Writes a single already-formatted value into an output char buffer,
/// adding escaping/doubling and the trailing separator or terminator as
/// needed. Stateless across fields except for knowing whether it is at the
/// start of a record (no leading separator).
pub struct FieldWriter {
    dialect: Dialect,
    scan: NeedsEncodeScan,
    style: EscapeStyle,
    first_field_in_record: bool,
}

impl FieldWriter {
    pub fn new(dialect: Dialect, style: EscapeStyle) -> FieldWriter {
        FieldWriter {
            scan: NeedsEncodeScan::new(dialect),
            dialect,
            style,
            first_field_in_record: true,
        }
    }

    pub fn start_new_record(&mut self) {
        self.first_field_in_record = true;
    }

    /// Writes one value, including any leading separator, into `out`.
    /// Returns the number of chars used, or `OutputFull` if `out` could not
    /// hold the full encoded representation (caller should grow `out` and
    /// call again from scratch — this call makes no partial writes it
    /// doesn't report).
    pub fn write(&mut self, value: &str, out: &mut [char]) -> WriteResult {
        let escape = self.dialect.escaped_value_start_and_end;
        let must_escape = match self.style {
            EscapeStyle::Always => escape.is_some(),
            EscapeStyle::Never => false,
            EscapeStyle::Necessary => escape.is_some() && self.scan.needs_encode(value),
        };

        let mut n = 0;
        let mut push = |c: char, n: &mut usize, out: &mut [char]| -> bool {
            if *n >= out.len() {
                return false;
            }
            out[*n] = c;
            *n += 1;
            true
        };

        if !self.first_field_in_record {
            if !push(self.dialect.value_separator, &mut n, out) {
                return WriteResult::OutputFull;
            }
        }

        if must_escape {
            let quote = escape.expect("must_escape implies escape.is_some()");
            let escape_char = self.dialect.escaped_value_escape_character.unwrap_or(quote);
            if !push(quote, &mut n, out) {
                return WriteResult::OutputFull;
            }
            for c in value.chars() {
                if c == quote {
                    if !push(escape_char, &mut n, out) {
                        return WriteResult::OutputFull;
                    }
                }
                if !push(c, &mut n, out) {
                    return WriteResult::OutputFull;
                }
            }
            if !push(quote, &mut n, out) {
                return WriteResult::OutputFull;
            }
        } else {
            for c in value.chars() {
                if !push(c, &mut n, out) {
                    return WriteResult::OutputFull;
                }
            }
        }

        self.first_field_in_record = false;
        WriteResult::Written(n)
    }

    /// Writes the record terminator for the configured `RowEnding`,
    /// resolving `Detect` to `CrLf` (the conventional default when nothing
    /// has constrained the choice yet).
    pub fn write_terminator(&mut self, out: &mut [char]) -> WriteResult {
        let chars: &[char] = match self.dialect.row_ending {
            RowEnding::Cr => &['\r'],
            RowEnding::Lf => &['\n'],
            RowEnding::CrLf | RowEnding::Detect => &['\r', '\n'],
        };
        if out.len() < chars.len() {
            return WriteResult::OutputFull;
        }
        out[..chars.len()].copy_from_slice(chars);
        self.first_field_in_record = true;
        WriteResult::Written(chars.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dialect() -> Dialect {
        Dialect { row_ending: RowEnding::CrLf, ..Dialect::default() }
    }

    #[test]
    fn writes_plain_value_unquoted() {
        let mut w = FieldWriter::new(dialect(), EscapeStyle::Necessary);
        let mut buf = ['\0'; 16];
        let r = w.write("hello", &mut buf);
        assert_eq!(r, WriteResult::Written(5));
        assert_eq!(&buf[..5], &['h', 'e', 'l', 'l', 'o']);
    }

    #[test]
    fn quotes_value_containing_separator() {
        let mut w = FieldWriter::new(dialect(), EscapeStyle::Necessary);
        let mut buf = ['\0'; 16];
        let r = w.write("a,b", &mut buf);
        assert_eq!(r, WriteResult::Written(6));
        assert_eq!(&buf[..6], &['"', 'a', ',', 'b', '"']);
    }

    #[test]
    fn doubles_embedded_quote() {
        let mut w = FieldWriter::new(dialect(), EscapeStyle::Necessary);
        let mut buf = ['\0'; 16];
        let r = w.write("a\"b", &mut buf);
        assert_eq!(r, WriteResult::Written(6));
        assert_eq!(&buf[..6], &['"', 'a', '"', '"', 'b', '"']);
    }

    #[test]
    fn always_style_quotes_everything() {
        let mut w = FieldWriter::new(dialect(), EscapeStyle::Always);
        let mut buf = ['\0'; 16];
        let r = w.write("hi", &mut buf);
        assert_eq!(r, WriteResult::Written(4));
        assert_eq!(&buf[..4], &['"', 'h', 'i', '"']);
    }

    #[test]
    fn second_field_gets_leading_separator() {
        let mut w = FieldWriter::new(dialect(), EscapeStyle::Necessary);
        let mut buf = ['\0'; 16];
        w.write("a", &mut buf);
        let r = w.write("b", &mut buf);
        assert_eq!(r, WriteResult::Written(2));
        assert_eq!(&buf[..2], &[',', 'b']);
    }

    #[test]
    fn output_full_reports_without_partial_write_accounting() {
        let mut w = FieldWriter::new(dialect(), EscapeStyle::Necessary);
        let mut buf = ['\0'; 2];
        let r = w.write("abc", &mut buf);
        assert_eq!(r, WriteResult::OutputFull);
    }
}
