use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::result;

use crate::adapter::Position;

/// A crate-private constructor for [`Error`].
pub(crate) fn new_error(kind: ErrorKind) -> Error {
    Error(Box::new(kind))
}

/// A type alias for `Result<T, csvio::Error>`.
pub type Result<T> = result::Result<T, Error>;

/// An error that can occur while reading or writing CSV data.
#[derive(Debug)]
pub struct Error(Box<ErrorKind>);

impl Error {
    /// Returns the specific type of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }

    /// Unwraps this error into its underlying kind.
    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    /// True if this is an I/O error (guarantees `kind()` is `ErrorKind::Io`).
    pub fn is_io_error(&self) -> bool {
        matches!(*self.0, ErrorKind::Io(_))
    }

    /// True if the reader/writer that produced this error is now poisoned
    /// and must not be used again.
    pub fn is_poisoning(&self) -> bool {
        !matches!(*self.0, ErrorKind::Poisoned)
    }
}

/// The specific type of an error.
#[derive(Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// An I/O error from the underlying reader, writer, or adapter.
    Io(io::Error),
    /// A `Dialect`/`Options` value failed validation before any scanner
    /// could be built (see `csvio_core::DialectError`).
    ConfigInvalid(String),
    /// A column's `Parser` could not convert the field text.
    ParseFailed {
        pos: Option<Position>,
        column: Option<String>,
        message: String,
    },
    /// A column's `Setter` rejected an otherwise-parsed value.
    SetterFailed {
        pos: Option<Position>,
        column: Option<String>,
        message: String,
    },
    /// A column marked required had no corresponding value in the record.
    RequiredColumnMissing {
        pos: Option<Position>,
        column: String,
    },
    /// Two records disagreed in field count and `flexible` was not set.
    UnequalLengths {
        pos: Option<Position>,
        expected_len: u64,
        len: u64,
    },
    /// A character appeared where only the escape-start char or a value
    /// terminator was legal while closing an escaped value.
    UnexpectedCharInEscape(Position),
    /// The input ended inside an escaped value that was never closed.
    UnexpectedEnd(Position),
    /// A row ending disagreed with the one already locked in (either
    /// configured explicitly or fixed by `RowEnding::Detect`).
    ExpectedEndOfRecordOrValue(Position),
    /// The caller-supplied buffer cannot hold even one character's worth of
    /// escaped output; growing it is the caller's responsibility.
    BufferTooSmall,
    /// The operation was cancelled cooperatively (async adapters only).
    Cancelled,
    /// A previous error (or cancellation) has poisoned this reader/writer;
    /// it must not be used again.
    Poisoned,
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        new_error(ErrorKind::Io(err))
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> io::Error {
        match err.into_kind() {
            ErrorKind::Io(err) => err,
            kind => io::Error::new(io::ErrorKind::Other, new_error(kind)),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match *self.0 {
            ErrorKind::Io(ref err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self.0 {
            ErrorKind::Io(ref err) => err.fmt(f),
            ErrorKind::ConfigInvalid(ref msg) => write!(f, "invalid csv configuration: {}", msg),
            ErrorKind::ParseFailed { pos: None, ref column, ref message } => {
                write!(f, "csv parse error in column {:?}: {}", column, message)
            }
            ErrorKind::ParseFailed { pos: Some(ref pos), ref column, ref message } => write!(
                f,
                "csv parse error at record {} (line {}), column {:?}: {}",
                pos.record(),
                pos.line(),
                column,
                message
            ),
            ErrorKind::SetterFailed { pos: None, ref column, ref message } => {
                write!(f, "csv setter error in column {:?}: {}", column, message)
            }
            ErrorKind::SetterFailed { pos: Some(ref pos), ref column, ref message } => write!(
                f,
                "csv setter error at record {} (line {}), column {:?}: {}",
                pos.record(),
                pos.line(),
                column,
                message
            ),
            ErrorKind::RequiredColumnMissing { pos: None, ref column } => {
                write!(f, "required column {:?} missing a value", column)
            }
            ErrorKind::RequiredColumnMissing { pos: Some(ref pos), ref column } => write!(
                f,
                "required column {:?} missing a value at record {} (line {})",
                column,
                pos.record(),
                pos.line()
            ),
            ErrorKind::UnequalLengths { pos: None, expected_len, len } => write!(
                f,
                "csv error: found record with {} fields, but the previous record has {}",
                len, expected_len
            ),
            ErrorKind::UnequalLengths { pos: Some(ref pos), expected_len, len } => write!(
                f,
                "csv error: record {} (line {}): found record with {} fields, but the previous record has {}",
                pos.record(),
                pos.line(),
                len,
                expected_len
            ),
            ErrorKind::UnexpectedCharInEscape(ref pos) => write!(
                f,
                "unexpected character inside escaped value at record {} (line {})",
                pos.record(),
                pos.line()
            ),
            ErrorKind::UnexpectedEnd(ref pos) => write!(
                f,
                "input ended inside an unclosed escaped value at record {} (line {})",
                pos.record(),
                pos.line()
            ),
            ErrorKind::ExpectedEndOfRecordOrValue(ref pos) => write!(
                f,
                "expected end of record or value at record {} (line {}); row ending disagreed with the configured or detected one",
                pos.record(),
                pos.line()
            ),
            ErrorKind::BufferTooSmall => write!(f, "output buffer too small to make progress"),
            ErrorKind::Cancelled => write!(f, "operation was cancelled"),
            ErrorKind::Poisoned => write!(f, "reader or writer is poisoned by a previous error"),
        }
    }
}
