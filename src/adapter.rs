use std::io;

/// A snapshot of where a reader or writer is in the stream, used in error
/// messages and available to callers for diagnostics.
///
/// Extends the teacher's byte/line/record triple with a `char` offset,
/// since this crate counts Unicode scalar values rather than bytes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Position {
    byte: u64,
    ch: u64,
    line: u64,
    record: u64,
}

impl Position {
    pub(crate) fn new() -> Position {
        Position { byte: 0, ch: 0, line: 1, record: 0 }
    }

    /// The byte offset, starting at `0`, of this position.
    pub fn byte(&self) -> u64 {
        self.byte
    }

    /// The code-point offset, starting at `0`, of this position.
    pub fn char_offset(&self) -> u64 {
        self.ch
    }

    /// The line number, starting at `1`, of this position.
    pub fn line(&self) -> u64 {
        self.line
    }

    /// The record index, starting at `0`, of this position.
    pub fn record(&self) -> u64 {
        self.record
    }

    pub(crate) fn advance(&mut self, c: char, lines: u64) {
        self.byte += c.len_utf8() as u64;
        self.ch += 1;
        self.line += lines;
    }

    pub(crate) fn advance_record(&mut self) {
        self.record += 1;
    }

    /// Bumps the line count on its own, for the record/comment terminators
    /// the scanner consumes as a unit (CR, LF, or CRLF) rather than per
    /// character.
    pub(crate) fn bump_line(&mut self) {
        self.line += 1;
    }
}

impl Default for Position {
    fn default() -> Position {
        Position::new()
    }
}

/// A source of `char`s for a reader pipeline. Implemented for any
/// `io::Read` by [`Utf8Reader`] so callers can feed the scanner from a
/// file, socket, or in-memory buffer without hand-rolling UTF-8 decoding;
/// callers who already have `char`s (e.g. from a `String`) can implement
/// this directly for a trivial slice-backed source.
pub trait CharSource {
    /// Fills as much of `buf` as possible with decoded chars, returning how
    /// many were written. Returns `0` only at end of input.
    fn fill(&mut self, buf: &mut [char]) -> io::Result<usize>;
}

/// Decodes UTF-8 bytes from an `io::Read` into `char`s on demand.
///
/// Grounded in the teacher's `Reader<R>` wrapping an `io::BufReader` (see
/// `src/reader.rs`): a small byte staging buffer is refilled from the inner
/// reader, then decoded incrementally, carrying any trailing partial
/// multi-byte sequence across calls.
pub struct Utf8Reader<R> {
    inner: R,
    raw: Vec<u8>,
    raw_len: usize,
    raw_pos: usize,
}

const RAW_BUF_SIZE: usize = 8 * 1024;

impl<R: io::Read> Utf8Reader<R> {
    pub fn new(inner: R) -> Utf8Reader<R> {
        Utf8Reader { inner, raw: vec![0u8; RAW_BUF_SIZE], raw_len: 0, raw_pos: 0 }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn refill(&mut self) -> io::Result<bool> {
        if self.raw_pos > 0 {
            self.raw.copy_within(self.raw_pos..self.raw_len, 0);
            self.raw_len -= self.raw_pos;
            self.raw_pos = 0;
        }
        if self.raw_len == self.raw.len() {
            return Ok(true);
        }
        let n = self.inner.read(&mut self.raw[self.raw_len..])?;
        self.raw_len += n;
        Ok(n > 0 || self.raw_len > 0)
    }
}

impl<R: io::Read> CharSource for Utf8Reader<R> {
    fn fill(&mut self, buf: &mut [char]) -> io::Result<usize> {
        let mut written = 0;
        loop {
            if written >= buf.len() {
                return Ok(written);
            }
            if self.raw_pos >= self.raw_len {
                let had_data = self.refill()?;
                if self.raw_pos >= self.raw_len {
                    if !had_data {
                        return Ok(written);
                    }
                    continue;
                }
            }
            let bytes = &self.raw[self.raw_pos..self.raw_len];
            match std::str::from_utf8(bytes) {
                Ok(s) => {
                    for c in s.chars() {
                        if written >= buf.len() {
                            return Ok(written);
                        }
                        buf[written] = c;
                        written += 1;
                        self.raw_pos += c.len_utf8();
                    }
                    if self.raw_pos >= self.raw_len {
                        continue;
                    }
                    return Ok(written);
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    if valid > 0 {
                        let s = std::str::from_utf8(&bytes[..valid]).expect("validated above");
                        for c in s.chars() {
                            if written >= buf.len() {
                                return Ok(written);
                            }
                            buf[written] = c;
                            written += 1;
                            self.raw_pos += c.len_utf8();
                        }
                        continue;
                    }
                    match e.error_len() {
                        Some(bad) => {
                            return Err(io::Error::new(
                                io::ErrorKind::InvalidData,
                                format!("invalid utf-8 sequence of {} bytes", bad),
                            ));
                        }
                        None => {
                            // Incomplete sequence at the end of the staging
                            // buffer; refill and retry.
                            let had_data = self.refill()?;
                            if !had_data && self.raw_pos >= self.raw_len {
                                return Err(io::Error::new(
                                    io::ErrorKind::UnexpectedEof,
                                    "truncated utf-8 sequence at end of input",
                                ));
                            }
                        }
                    }
                }
            }
        }
    }
}

/// A sink for `char`s written by a writer pipeline, encoding to UTF-8 bytes
/// on an inner `io::Write`.
pub struct Utf8Writer<W> {
    inner: W,
    raw: Vec<u8>,
}

impl<W: io::Write> Utf8Writer<W> {
    pub fn new(inner: W) -> Utf8Writer<W> {
        Utf8Writer { inner, raw: Vec::with_capacity(RAW_BUF_SIZE) }
    }

    pub fn write_chars(&mut self, chars: &[char]) -> io::Result<()> {
        self.raw.clear();
        let mut tmp = [0u8; 4];
        for &c in chars {
            self.raw.extend_from_slice(c.encode_utf8(&mut tmp).as_bytes());
        }
        self.inner.write_all(&self.raw)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_ascii() {
        let mut r = Utf8Reader::new(io::Cursor::new(b"hello".to_vec()));
        let mut buf = ['\0'; 8];
        let n = r.fill(&mut buf).unwrap();
        assert_eq!(n, 5);
        assert_eq!(&buf[..5], &['h', 'e', 'l', 'l', 'o']);
    }

    #[test]
    fn decodes_multibyte_across_refills() {
        let mut r = Utf8Reader::new(io::Cursor::new("héllo".as_bytes().to_vec()));
        let mut buf = ['\0'; 8];
        let n = r.fill(&mut buf).unwrap();
        let got: String = buf[..n].iter().collect();
        assert_eq!(got, "héllo");
    }

    #[test]
    fn position_advances_line_on_terminator() {
        let mut pos = Position::new();
        pos.advance('a', 0);
        pos.advance('\n', 1);
        assert_eq!(pos.line(), 2);
        assert_eq!(pos.char_offset(), 2);
    }
}
