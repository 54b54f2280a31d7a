use crate::classifier::Role;
use crate::dialect::{Dialect, RowEnding};

/// Where the scanner currently sits in a record.
///
/// `Poisoned` is a terminal sink entered after any `Err` result; the scanner
/// will not advance further once there. `RecordStart` doubles as "blank
/// line" detector (a lone terminator there is simply skipped) and otherwise
/// falls through to `ValueStart` without consuming the character, the same
/// epsilon-move the teacher's `StartRecord` uses for `StartField`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum State {
    RecordStart,
    ValueStart,
    InValue,
    InEscapedValue,
    InEscapeEscape,
    ExpectingLf { escaped: bool },
    InComment,
    CommentExpectingLf,
    Poisoned,
}

/// One token surfaced by [`Scanner::advance`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Advance {
    /// No event this call; more input is needed (input slice was exhausted
    /// mid-scan with no terminal event produced).
    NeedsInput,
    /// Output buffer filled before a value finished; caller should drain it.
    OutputFull,
    /// A value finished. `record_end` marks it as the record's last value.
    Value { escaped: bool, record_end: bool },
    /// A comment line finished (only produced when the dialect configures a
    /// comment character).
    Comment { record_end: bool },
    /// No more input and nothing pending; the stream is fully drained.
    End,
    Err(ScanError),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScanError {
    UnexpectedCharacterInEscapeSequence,
    UnexpectedEnd,
    ExpectedEndOfRecordOrValue,
}

enum Emit {
    None,
    Char(char),
}

struct Step {
    next: State,
    consume: bool,
    emit: Emit,
    event: Option<Advance>,
}

fn step(next: State) -> Step {
    Step { next, consume: true, emit: Emit::None, event: None }
}

/// The table-driven tokenizer: `(State, Role) -> (State, Action)` for a
/// fixed [`Dialect`], generalized from the teacher's byte-oriented
/// NFA/DFA reader to operate over `char`.
pub struct Scanner {
    classifier: crate::classifier::Classifier,
    dialect: Dialect,
    state: State,
    lines: u64,
    comments_enabled: bool,
    escaping_enabled: bool,
    distinct_escape_char: bool,
}

impl Scanner {
    pub fn new(dialect: Dialect) -> Scanner {
        let comments_enabled = dialect.comment_character.is_some();
        let escaping_enabled = dialect.escaped_value_start_and_end.is_some();
        let distinct_escape_char = match (
            dialect.escaped_value_escape_character,
            dialect.escaped_value_start_and_end,
        ) {
            (Some(ec), Some(es)) => ec != es,
            _ => false,
        };
        Scanner {
            classifier: crate::classifier::Classifier::new(dialect),
            dialect,
            state: State::RecordStart,
            lines: 0,
            comments_enabled,
            escaping_enabled,
            distinct_escape_char,
        }
    }

    pub fn line(&self) -> u64 {
        self.lines
    }

    pub fn row_ending(&self) -> RowEnding {
        self.dialect.row_ending
    }

    pub fn is_poisoned(&self) -> bool {
        self.state == State::Poisoned
    }

    /// Drives the scanner over `input`, copying literal value content into
    /// `output`, until a token is produced or one of the buffers is
    /// exhausted. Returns `(Advance, chars_consumed, chars_written)`.
    pub fn advance(&mut self, input: &[char], output: &mut [char]) -> (Advance, usize, usize) {
        if self.state == State::Poisoned {
            return (Advance::Err(ScanError::UnexpectedEnd), 0, 0);
        }
        if input.is_empty() {
            let (ev, lines) = self.finalize_at_eof();
            self.lines += lines;
            return (ev, 0, 0);
        }

        let mut nin = 0;
        let mut nout = 0;
        loop {
            if nin >= input.len() {
                return (Advance::NeedsInput, nin, nout);
            }
            let c = input[nin];
            let role = self.classifier.classify(c);
            let s = self.dispatch(self.state, role, c);

            match s.emit {
                Emit::None => {}
                Emit::Char(ch) => {
                    if nout >= output.len() {
                        return (Advance::OutputFull, nin, nout);
                    }
                    output[nout] = ch;
                    nout += 1;
                }
            }
            if s.consume {
                nin += 1;
            }
            self.state = s.next;
            if let Some(ev) = s.event {
                if let Advance::Err(_) = ev {
                    self.state = State::Poisoned;
                }
                if matches!(ev, Advance::Value { record_end: true, .. } | Advance::Comment { record_end: true }) {
                    self.lines += 1;
                }
                return (ev, nin, nout);
            }
        }
    }

    fn finalize_at_eof(&mut self) -> (Advance, u64) {
        match self.state {
            State::RecordStart => (Advance::End, 0),
            State::ValueStart | State::InValue => {
                self.state = State::RecordStart;
                (Advance::Value { escaped: false, record_end: true }, 1)
            }
            State::InEscapeEscape => {
                self.state = State::RecordStart;
                (Advance::Value { escaped: true, record_end: true }, 1)
            }
            State::InEscapedValue => {
                self.state = State::Poisoned;
                (Advance::Err(ScanError::UnexpectedEnd), 0)
            }
            State::ExpectingLf { escaped } => {
                self.state = State::RecordStart;
                if self.dialect.row_ending == RowEnding::Detect {
                    self.dialect.row_ending = RowEnding::Cr;
                    self.dialect.from_detect = true;
                }
                (Advance::Value { escaped, record_end: true }, 1)
            }
            State::InComment | State::CommentExpectingLf => {
                self.state = State::RecordStart;
                (Advance::Comment { record_end: true }, 1)
            }
            State::Poisoned => (Advance::Err(ScanError::UnexpectedEnd), 0),
        }
    }

    fn dispatch(&mut self, state: State, role: Role, c: char) -> Step {
        match state {
            State::RecordStart => self.on_record_start(role),
            State::ValueStart => self.on_value_start(role, c),
            State::InValue => self.on_in_value(role, c),
            State::InEscapedValue => self.on_in_escaped_value(role, c),
            State::InEscapeEscape => self.on_in_escape_escape(role, c),
            State::ExpectingLf { escaped } => self.on_expecting_lf(role, escaped),
            State::InComment => self.on_in_comment(role, c),
            State::CommentExpectingLf => self.on_comment_expecting_lf(role),
            State::Poisoned => Step {
                next: State::Poisoned,
                consume: false,
                emit: Emit::None,
                event: Some(Advance::Err(ScanError::UnexpectedEnd)),
            },
        }
    }

    fn on_record_start(&mut self, role: Role) -> Step {
        match role {
            Role::CommentStart if self.comments_enabled => step(State::InComment),
            Role::Cr => self.terminator_at_record_start(true),
            Role::Lf => self.terminator_at_record_start(false),
            _ => Step { next: State::ValueStart, consume: false, emit: Emit::None, event: None },
        }
    }

    /// Shared by `RecordStart`'s CR/LF handling: a lone terminator before
    /// any field has started is a blank line, not an empty record.
    fn terminator_at_record_start(&mut self, is_cr: bool) -> Step {
        match self.dialect.row_ending {
            RowEnding::Cr if is_cr => step(State::RecordStart),
            RowEnding::Lf if !is_cr => step(State::RecordStart),
            RowEnding::Cr if !is_cr => self.other_terminator_outside_value(),
            RowEnding::Lf if is_cr => Step {
                next: State::Poisoned,
                consume: true,
                emit: Emit::None,
                event: Some(Advance::Err(ScanError::ExpectedEndOfRecordOrValue)),
            },
            RowEnding::CrLf if is_cr => step(State::ExpectingLf { escaped: false }),
            RowEnding::CrLf if !is_cr => self.other_terminator_outside_value(),
            RowEnding::Detect if is_cr => step(State::ExpectingLf { escaped: false }),
            RowEnding::Detect if !is_cr => {
                self.dialect.row_ending = RowEnding::Lf;
                self.dialect.from_detect = true;
                step(State::RecordStart)
            }
            _ => unreachable!(),
        }
    }

    /// `CrLf`/`Cr` dialects seeing the "other" char outside a value: a
    /// detect-locked dialect treats this as disagreement and errors; an
    /// explicitly-chosen dialect treats the stray char as literal content
    /// of a (possibly empty) value.
    fn other_terminator_outside_value(&mut self) -> Step {
        if self.dialect.from_detect {
            return Step {
                next: State::Poisoned,
                consume: true,
                emit: Emit::None,
                event: Some(Advance::Err(ScanError::ExpectedEndOfRecordOrValue)),
            };
        }
        // Treat literally: re-dispatch the same character from InValue.
        Step { next: State::InValue, consume: false, emit: Emit::None, event: None }
    }

    fn on_value_start(&mut self, role: Role, c: char) -> Step {
        match role {
            Role::Cr => self.terminator_in_value(true, false),
            Role::Lf => self.terminator_in_value(false, false),
            Role::Separator => step(State::ValueStart).with_event(Advance::Value {
                escaped: false,
                record_end: false,
            }),
            Role::EscapeStart if self.escaping_enabled => step(State::InEscapedValue),
            Role::Whitespace if self.dialect.trim_before_values => step(State::ValueStart),
            _ => Step { next: State::InValue, consume: true, emit: Emit::Char(c), event: None },
        }
    }

    fn on_in_value(&mut self, role: Role, c: char) -> Step {
        match role {
            Role::Cr => self.terminator_in_value(true, false),
            Role::Lf => self.terminator_in_value(false, false),
            Role::Separator => {
                step(State::ValueStart).with_event(Advance::Value { escaped: false, record_end: false })
            }
            _ => Step { next: State::InValue, consume: true, emit: Emit::Char(c), event: None },
        }
    }

    /// `escaped` marks whether the value being closed came from an escaped
    /// (quoted) field, carried through to the `Value`/`ExpectingLf` event.
    fn terminator_in_value(&mut self, is_cr: bool, escaped: bool) -> Step {
        match self.dialect.row_ending {
            RowEnding::Cr if is_cr => self.finish_value(escaped),
            RowEnding::Lf if !is_cr => self.finish_value(escaped),
            RowEnding::Cr if !is_cr => {
                if self.dialect.from_detect {
                    return Step {
                        next: State::Poisoned,
                        consume: true,
                        emit: Emit::None,
                        event: Some(Advance::Err(ScanError::ExpectedEndOfRecordOrValue)),
                    };
                }
                Step { next: State::InValue, consume: true, emit: Emit::Char('\n'), event: None }
            }
            RowEnding::Lf if is_cr => Step {
                next: State::Poisoned,
                consume: true,
                emit: Emit::None,
                event: Some(Advance::Err(ScanError::ExpectedEndOfRecordOrValue)),
            },
            RowEnding::CrLf if is_cr => step(State::ExpectingLf { escaped }),
            RowEnding::CrLf if !is_cr => {
                if self.dialect.from_detect {
                    return Step {
                        next: State::Poisoned,
                        consume: true,
                        emit: Emit::None,
                        event: Some(Advance::Err(ScanError::ExpectedEndOfRecordOrValue)),
                    };
                }
                Step { next: State::InValue, consume: true, emit: Emit::Char('\n'), event: None }
            }
            RowEnding::Detect if is_cr => step(State::ExpectingLf { escaped }),
            RowEnding::Detect if !is_cr => {
                self.dialect.row_ending = RowEnding::Lf;
                self.dialect.from_detect = true;
                self.finish_value(escaped)
            }
            _ => unreachable!(),
        }
    }

    fn finish_value(&mut self, escaped: bool) -> Step {
        Step {
            next: State::RecordStart,
            consume: true,
            emit: Emit::None,
            event: Some(Advance::Value { escaped, record_end: true }),
        }
    }

    fn with_event(self, ev: Advance) -> Step {
        Step { event: Some(ev), ..self }
    }

    fn on_in_escaped_value(&mut self, role: Role, c: char) -> Step {
        match role {
            Role::EscapeStart => step(State::InEscapeEscape),
            Role::EscapeChar if self.distinct_escape_char => step(State::InEscapeEscape),
            _ => Step { next: State::InEscapedValue, consume: true, emit: Emit::Char(c), event: None },
        }
    }

    fn on_in_escape_escape(&mut self, role: Role, c: char) -> Step {
        match role {
            // A doubled escape-start char (or distinct escape char followed
            // by the escape-start char) closes to a single literal char.
            Role::EscapeStart => {
                Step { next: State::InEscapedValue, consume: true, emit: Emit::Char(c), event: None }
            }
            Role::Separator => {
                step(State::ValueStart).with_event(Advance::Value { escaped: true, record_end: false })
            }
            Role::Cr => self.terminator_in_value(true, true),
            Role::Lf => self.terminator_in_value(false, true),
            _ => Step {
                next: State::Poisoned,
                consume: true,
                emit: Emit::None,
                event: Some(Advance::Err(ScanError::UnexpectedCharacterInEscapeSequence)),
            },
        }
    }

    fn on_expecting_lf(&mut self, role: Role, escaped: bool) -> Step {
        match role {
            Role::Lf => {
                if self.dialect.row_ending == RowEnding::Detect {
                    self.dialect.row_ending = RowEnding::CrLf;
                    self.dialect.from_detect = true;
                }
                self.finish_value(escaped)
            }
            _ => {
                if self.dialect.row_ending == RowEnding::Detect {
                    self.dialect.row_ending = RowEnding::Cr;
                    self.dialect.from_detect = true;
                    return Step {
                        next: State::RecordStart,
                        consume: false,
                        emit: Emit::None,
                        event: Some(Advance::Value { escaped, record_end: true }),
                    };
                }
                if self.dialect.from_detect {
                    return Step {
                        next: State::Poisoned,
                        consume: false,
                        emit: Emit::None,
                        event: Some(Advance::Err(ScanError::ExpectedEndOfRecordOrValue)),
                    };
                }
                // Explicit CrLf: the held CR was not part of a pair, so it
                // becomes literal content and the same char is re-examined
                // from InValue on the next step.
                Step { next: State::InValue, consume: false, emit: Emit::Char('\r'), event: None }
            }
        }
    }

    fn on_in_comment(&mut self, role: Role, c: char) -> Step {
        match role {
            Role::Cr => match self.dialect.row_ending {
                RowEnding::Cr => self.finish_comment(),
                _ => step(State::CommentExpectingLf),
            },
            Role::Lf => self.finish_comment(),
            _ => Step { next: State::InComment, consume: true, emit: Emit::Char(c), event: None },
        }
    }

    fn on_comment_expecting_lf(&mut self, role: Role) -> Step {
        match role {
            Role::Lf => self.finish_comment(),
            _ => Step {
                next: State::RecordStart,
                consume: false,
                emit: Emit::None,
                event: Some(Advance::Comment { record_end: true }),
            },
        }
    }

    fn finish_comment(&mut self) -> Step {
        Step {
            next: State::RecordStart,
            consume: true,
            emit: Emit::None,
            event: Some(Advance::Comment { record_end: true }),
        }
    }
}
