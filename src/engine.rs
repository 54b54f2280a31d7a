use csvio_core::{Advance, ScanError, Scanner};

use crate::adapter::Position;
use crate::detect::Detected;
use crate::error::{new_error, Error, ErrorKind};
use crate::options::PostScanTrim;
use crate::pool::CharPool;
use crate::row::unequal_lengths_error;

/// A raw record or a comment line, as read by the comment-aware reading
/// methods (`Reader::read_record_or_comment`/`AsyncReader::read_record_or_comment`).
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RecordOrComment {
    Record(Vec<String>),
    Comment(String),
}

/// What happened after feeding one buffer's worth of input through the
/// scanner.
pub(crate) enum Outcome {
    /// The input slice was exhausted; caller must refill and call again.
    NeedsInput,
    /// A record finished.
    Record(Vec<String>),
    /// A comment line finished; its text (the comment-start character is
    /// not included). Caller should call again immediately (more input may
    /// already be buffered).
    Comment(String),
    /// The stream ended with no partial record pending.
    End,
    Err(Error),
}

/// The record-assembly state shared by the synchronous and asynchronous
/// reader pipelines: both drive this with their own I/O strategy (blocking
/// refill vs `.await`ed refill) but share the exact same stepping logic, so
/// tokenizing and row assembly are implemented once.
pub(crate) struct RecordAssembler {
    scanner: Scanner,
    pos: Position,
    field: Vec<char>,
    fields: Vec<String>,
    expected_len: Option<usize>,
    flexible: bool,
    trim: PostScanTrim,
    detected: Detected,
    pool: CharPool,
}

impl RecordAssembler {
    pub(crate) fn new(scanner: Scanner, flexible: bool, trim: PostScanTrim) -> RecordAssembler {
        RecordAssembler {
            scanner,
            pos: Position::new(),
            field: Vec::new(),
            fields: Vec::new(),
            expected_len: None,
            flexible,
            trim,
            detected: Detected::pending(),
            pool: CharPool::default(),
        }
    }

    pub(crate) fn position(&self) -> Position {
        self.pos
    }

    pub(crate) fn row_ending_detected(&self) -> Detected {
        self.detected
    }

    /// Feeds as much of `input` through the scanner as possible without
    /// blocking, consuming `input[..n]` on return (`n` is always reported
    /// even when the outcome needs more input).
    pub(crate) fn step(&mut self, input: &[char]) -> (Outcome, usize) {
        let mut out = self.pool.rent();
        if out.is_empty() {
            out.resize(4096, '\0');
        }
        let mut offset = 0;
        loop {
            let (event, nin, nout) = self.scanner.advance(&input[offset..], &mut out);
            for &c in &input[offset..offset + nin] {
                self.pos.advance(c, 0);
            }
            offset += nin;
            if nout > 0 {
                self.field.extend_from_slice(&out[..nout]);
            }

            match event {
                Advance::NeedsInput => {
                    self.pool.release(out);
                    return (Outcome::NeedsInput, offset);
                }
                Advance::OutputFull => continue,
                Advance::Value { escaped, record_end } => {
                    let value: String = self.field.drain(..).collect();
                    let value = if self.trim.is_noop() { value } else { self.trim.apply(value, escaped) };
                    self.fields.push(value);
                    if record_end {
                        self.pos.bump_line();
                        self.pos.advance_record();
                        self.detected.observe(self.scanner.row_ending());
                        self.pool.release(out);
                        return (self.finish_record(), offset);
                    }
                }
                Advance::Comment { record_end } => {
                    if record_end {
                        let text: String = self.field.drain(..).collect();
                        self.pos.bump_line();
                        self.pool.release(out);
                        return (Outcome::Comment(text), offset);
                    }
                }
                Advance::End => {
                    self.pool.release(out);
                    if self.fields.is_empty() {
                        return (Outcome::End, offset);
                    }
                    return (self.finish_record(), offset);
                }
                Advance::Err(e) => {
                    self.pool.release(out);
                    return (Outcome::Err(self.scan_error(e)), offset);
                }
            }
        }
    }

    /// Drives `finalize_at_eof` (an empty-input `step` call) once the
    /// source is fully drained.
    pub(crate) fn finish(&mut self) -> Outcome {
        let (outcome, _) = self.step(&[]);
        outcome
    }

    fn finish_record(&mut self) -> Outcome {
        let len = self.fields.len();
        match self.expected_len {
            None => self.expected_len = Some(len),
            Some(expected) if expected != len && !self.flexible => {
                return Outcome::Err(unequal_lengths_error(expected as u64, len as u64));
            }
            _ => {}
        }
        Outcome::Record(std::mem::take(&mut self.fields))
    }

    fn scan_error(&self, e: ScanError) -> Error {
        let pos = self.pos;
        match e {
            ScanError::UnexpectedCharacterInEscapeSequence => new_error(ErrorKind::UnexpectedCharInEscape(pos)),
            ScanError::UnexpectedEnd => new_error(ErrorKind::UnexpectedEnd(pos)),
            ScanError::ExpectedEndOfRecordOrValue => new_error(ErrorKind::ExpectedEndOfRecordOrValue(pos)),
        }
    }
}
