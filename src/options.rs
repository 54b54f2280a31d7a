use csvio_core::{Dialect as CoreDialect, DialectError, EscapeStyle};

use crate::detect::RowEnding;
use crate::error::{new_error, Error, ErrorKind, Result};

/// Controls whether a dynamic (untyped) row's backing map is reused across
/// records or reallocated fresh each time.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DynamicRowDisposal {
    /// Clear and reuse the same backing map for every record (fewer
    /// allocations; values from the previous record are not retained).
    Reuse,
    /// Allocate a fresh backing map per record.
    CreateNew,
}

impl Default for DynamicRowDisposal {
    fn default() -> DynamicRowDisposal {
        DynamicRowDisposal::Reuse
    }
}

/// Whether the writer emits a record terminator after the final record.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WriteTrailingRowEnding {
    /// Always terminate the last record too (the conventional default).
    Always,
    /// Suppress the terminator after the last record written.
    Never,
}

impl Default for WriteTrailingRowEnding {
    fn default() -> WriteTrailingRowEnding {
        WriteTrailingRowEnding::Always
    }
}

/// Post-scan whitespace trimming applied to a value already assembled by the
/// scanner, as distinct from `trim_before_values` (a scanner-level skip of
/// leading whitespace before a value even starts).
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct PostScanTrim {
    pub(crate) leading: bool,
    pub(crate) trailing: bool,
    pub(crate) after_unescaped_only: bool,
}

impl PostScanTrim {
    pub(crate) fn is_noop(&self) -> bool {
        !self.leading && !self.trailing && !self.after_unescaped_only
    }

    /// Applies the configured trimming to one assembled value. `escaped`
    /// marks whether the value came from an escaped (quoted) field — the
    /// `TrimAfterValues` policy only strips trailing whitespace from values
    /// that were never escaped, since whitespace deliberately quoted into a
    /// value is content, not padding.
    pub(crate) fn apply(&self, value: String, escaped: bool) -> String {
        let trailing = self.trailing || (self.after_unescaped_only && !escaped);
        if !self.leading && !trailing {
            return value;
        }
        let trimmed = match (self.leading, trailing) {
            (true, true) => value.trim(),
            (true, false) => value.trim_start(),
            (false, true) => value.trim_end(),
            (false, false) => value.as_str(),
        };
        if trimmed.len() == value.len() {
            value
        } else {
            trimmed.to_string()
        }
    }
}

/// Immutable, validated configuration shared by readers and writers.
///
/// Built via [`OptionsBuilder`], mirroring the teacher's
/// `ReaderBuilder`/`WriterBuilder` two-phase pattern: a mutable builder
/// collects settings with chained `&mut self -> &mut Self` calls, then
/// `build()` validates them once into an immutable, cheaply `Clone`able
/// value reused for the lifetime of a reader or writer.
#[derive(Clone, Copy, Debug)]
pub struct Options {
    pub(crate) dialect: CoreDialect,
    pub(crate) flexible: bool,
    pub(crate) escape_style: EscapeStyle,
    pub(crate) dynamic_row_disposal: DynamicRowDisposal,
    pub(crate) write_trailing_row_ending: WriteTrailingRowEnding,
    pub(crate) trim_after_values: bool,
    pub(crate) trim_leading_in_values: bool,
    pub(crate) trim_trailing_in_values: bool,
    pub(crate) read_buffer_size_hint: usize,
    pub(crate) write_buffer_size_hint: Option<usize>,
}

impl Options {
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder::new()
    }

    pub fn row_ending(&self) -> RowEnding {
        self.dialect.row_ending.into()
    }

    pub fn flexible(&self) -> bool {
        self.flexible
    }

    pub(crate) fn post_scan_trim(&self) -> PostScanTrim {
        PostScanTrim {
            leading: self.trim_leading_in_values,
            trailing: self.trim_trailing_in_values,
            after_unescaped_only: self.trim_after_values,
        }
    }

    /// Fill size, in chars, for the reader's `PushbackBuffer`/`AsyncStage`
    /// refill. `0` means "let the buffer pick its own default".
    pub(crate) fn read_fill_size(&self) -> usize {
        self.read_buffer_size_hint
    }

    /// Initial capacity, in chars, for the writer's staging buffer. `None`
    /// means "use the writer's own default"; `Some(0)` starts from an empty
    /// buffer that grows on its first `OutputFull` instead of pre-allocating.
    pub(crate) fn write_initial_capacity(&self, default: usize) -> usize {
        self.write_buffer_size_hint.unwrap_or(default)
    }
}

impl Default for Options {
    fn default() -> Options {
        OptionsBuilder::default().build().expect("default options are always valid")
    }
}

/// Mutable builder for [`Options`]. See the module docs for the rationale
/// behind the two-phase split.
#[derive(Clone, Copy, Debug)]
pub struct OptionsBuilder {
    value_separator: char,
    escape_start: Option<char>,
    escape_char: Option<char>,
    comment_character: Option<char>,
    row_ending: RowEnding,
    trim_before_values: bool,
    trim_after_values: bool,
    trim_leading_in_values: bool,
    trim_trailing_in_values: bool,
    flexible: bool,
    escape_style: EscapeStyle,
    dynamic_row_disposal: DynamicRowDisposal,
    write_trailing_row_ending: WriteTrailingRowEnding,
    read_buffer_size_hint: usize,
    write_buffer_size_hint: Option<usize>,
}

impl Default for OptionsBuilder {
    fn default() -> OptionsBuilder {
        OptionsBuilder {
            value_separator: ',',
            escape_start: Some('"'),
            escape_char: Some('"'),
            comment_character: None,
            row_ending: RowEnding::default(),
            trim_before_values: false,
            trim_after_values: false,
            trim_leading_in_values: false,
            trim_trailing_in_values: false,
            flexible: false,
            escape_style: EscapeStyle::default(),
            dynamic_row_disposal: DynamicRowDisposal::default(),
            write_trailing_row_ending: WriteTrailingRowEnding::default(),
            read_buffer_size_hint: 0,
            write_buffer_size_hint: None,
        }
    }
}

impl OptionsBuilder {
    pub fn new() -> OptionsBuilder {
        OptionsBuilder::default()
    }

    /// The field separator. Default `,`.
    pub fn value_separator(&mut self, c: char) -> &mut OptionsBuilder {
        self.value_separator = c;
        self
    }

    /// The character that both opens and closes an escaped value. `None`
    /// disables escaping entirely. Default `Some('"')`.
    pub fn escaped_value_start_and_end(&mut self, c: Option<char>) -> &mut OptionsBuilder {
        self.escape_start = c;
        self
    }

    /// The character used to double an embedded escape-start char inside an
    /// escaped value. Defaults to the same char as
    /// `escaped_value_start_and_end`.
    pub fn escaped_value_escape_character(&mut self, c: Option<char>) -> &mut OptionsBuilder {
        self.escape_char = c;
        self
    }

    /// A character that, appearing as the first character of a record,
    /// marks the rest of the line as a comment to be skipped. Default
    /// `None` (comments disabled).
    pub fn comment_character(&mut self, c: Option<char>) -> &mut OptionsBuilder {
        self.comment_character = c;
        self
    }

    /// How records are terminated. Default `RowEnding::CrLf` (permissive:
    /// accepts a bare CR, bare LF, or CRLF pair when explicitly set).
    pub fn row_ending(&mut self, r: RowEnding) -> &mut OptionsBuilder {
        self.row_ending = r;
        self
    }

    /// Collapse leading whitespace before a value starts, at the scanner
    /// level (a value never even begins accumulating it). Default `false`.
    pub fn trim_before_values(&mut self, yes: bool) -> &mut OptionsBuilder {
        self.trim_before_values = yes;
        self
    }

    /// Strip trailing whitespace from an already-assembled value, but only
    /// when that value was never escaped (quoted whitespace is content, not
    /// padding). Default `false`.
    pub fn trim_after_values(&mut self, yes: bool) -> &mut OptionsBuilder {
        self.trim_after_values = yes;
        self
    }

    /// Strip leading whitespace from an already-assembled value,
    /// unconditionally (escaped or not). Default `false`.
    pub fn trim_leading_in_values(&mut self, yes: bool) -> &mut OptionsBuilder {
        self.trim_leading_in_values = yes;
        self
    }

    /// Strip trailing whitespace from an already-assembled value,
    /// unconditionally (escaped or not). Default `false`.
    pub fn trim_trailing_in_values(&mut self, yes: bool) -> &mut OptionsBuilder {
        self.trim_trailing_in_values = yes;
        self
    }

    /// Allow records with a field count that disagrees with the header or
    /// first record. Default `false`.
    pub fn flexible(&mut self, yes: bool) -> &mut OptionsBuilder {
        self.flexible = yes;
        self
    }

    /// When values are escaped on write. Default `Necessary`.
    pub fn escape_style(&mut self, style: EscapeStyle) -> &mut OptionsBuilder {
        self.escape_style = style;
        self
    }

    /// Whether a dynamic row's backing map is reused or reallocated per
    /// record. Default `Reuse`.
    pub fn dynamic_row_disposal(&mut self, d: DynamicRowDisposal) -> &mut OptionsBuilder {
        self.dynamic_row_disposal = d;
        self
    }

    /// Whether the writer terminates the last record written. Default
    /// `Always`.
    pub fn write_trailing_row_ending(&mut self, w: WriteTrailingRowEnding) -> &mut OptionsBuilder {
        self.write_trailing_row_ending = w;
        self
    }

    /// A hint for the reader's internal refill size, in chars. `0` (the
    /// default) lets the reader pick its own default fill size.
    pub fn read_buffer_size_hint(&mut self, n: usize) -> &mut OptionsBuilder {
        self.read_buffer_size_hint = n;
        self
    }

    /// A hint for the writer's internal staging buffer size, in chars.
    /// `None` (the default) lets the writer pick its own default; `Some(0)`
    /// disables pre-allocation, so the buffer grows lazily from empty.
    pub fn write_buffer_size_hint(&mut self, n: Option<usize>) -> &mut OptionsBuilder {
        self.write_buffer_size_hint = n;
        self
    }

    pub fn build(&self) -> Result<Options> {
        let dialect = CoreDialect {
            value_separator: self.value_separator,
            escaped_value_start_and_end: self.escape_start,
            escaped_value_escape_character: self.escape_char,
            comment_character: self.comment_character,
            row_ending: self.row_ending.into(),
            trim_before_values: self.trim_before_values,
            from_detect: false,
        };
        dialect.validate().map_err(dialect_error)?;
        Ok(Options {
            dialect,
            flexible: self.flexible,
            escape_style: self.escape_style,
            dynamic_row_disposal: self.dynamic_row_disposal,
            write_trailing_row_ending: self.write_trailing_row_ending,
            trim_after_values: self.trim_after_values,
            trim_leading_in_values: self.trim_leading_in_values,
            trim_trailing_in_values: self.trim_trailing_in_values,
            read_buffer_size_hint: self.read_buffer_size_hint,
            write_buffer_size_hint: self.write_buffer_size_hint,
        })
    }
}

fn dialect_error(e: DialectError) -> Error {
    let msg = match e {
        DialectError::SeparatorEqualsEscapeStart => {
            "value_separator must differ from the escape-start character"
        }
        DialectError::SeparatorEqualsComment => {
            "value_separator must differ from the comment character"
        }
        DialectError::EscapeStartEqualsComment => {
            "escape-start character must differ from the comment character"
        }
        DialectError::EscapeCharWithoutEscapeStart => {
            "an escape character requires an escape-start character to be set"
        }
    };
    new_error(ErrorKind::ConfigInvalid(msg.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_are_valid() {
        let opts = OptionsBuilder::new().build().unwrap();
        assert_eq!(opts.row_ending(), RowEnding::CrLf);
        assert!(!opts.flexible());
    }

    #[test]
    fn separator_equal_to_escape_start_is_rejected() {
        let mut b = OptionsBuilder::new();
        b.value_separator('"');
        assert!(b.build().is_err());
    }

    #[test]
    fn escape_char_without_escape_start_is_rejected() {
        let mut b = OptionsBuilder::new();
        b.escaped_value_start_and_end(None);
        b.escaped_value_escape_character(Some('\\'));
        assert!(b.build().is_err());
    }

    #[test]
    fn trim_leading_strips_regardless_of_escaping() {
        let trim = PostScanTrim { leading: true, trailing: false, after_unescaped_only: false };
        assert_eq!(trim.apply("  hi".to_string(), false), "hi");
        assert_eq!(trim.apply("  hi".to_string(), true), "hi");
    }

    #[test]
    fn trim_after_values_skips_escaped_values() {
        let trim = PostScanTrim { leading: false, trailing: false, after_unescaped_only: true };
        assert_eq!(trim.apply("hi  ".to_string(), false), "hi");
        assert_eq!(trim.apply("hi  ".to_string(), true), "hi  ");
    }

    #[test]
    fn trim_trailing_in_values_strips_even_when_escaped() {
        let trim = PostScanTrim { leading: false, trailing: true, after_unescaped_only: false };
        assert_eq!(trim.apply("hi  ".to_string(), true), "hi");
    }
}
