//! Asynchronous reader pipeline, feature-gated behind `async`.
//!
//! Mirrors `csv-async`'s `AsyncReader`/`AsyncReaderBuilder` public shape
//! (`other_examples/…mcronce-csv-async…`), but shares the exact same
//! scan-and-assemble step as the synchronous [`crate::reader::Reader`]
//! through [`crate::engine::RecordAssembler`] — only the I/O strategy
//! around it differs (`.await`ed refill instead of a blocking one).

use std::io;

use csvio_core::Scanner;
use futures_core::Stream;
use futures_util::io::{AsyncRead, AsyncReadExt};
use futures_util::stream;

use crate::adapter::Position;
use crate::detect::Detected;
use crate::engine::{Outcome, RecordAssembler, RecordOrComment};
use crate::error::{new_error, ErrorKind, Result};
use crate::headers::HeaderIndex;
use crate::options::{Options, OptionsBuilder};
use crate::reader::ReadHeader;

const RAW_BUF_SIZE: usize = 8 * 1024;

/// Decodes UTF-8 bytes from an `AsyncRead` into `char`s, the async
/// counterpart of [`crate::adapter::Utf8Reader`].
struct AsyncUtf8Reader<R> {
    inner: R,
    raw: Vec<u8>,
    raw_len: usize,
    raw_pos: usize,
}

impl<R: AsyncRead + Unpin> AsyncUtf8Reader<R> {
    fn new(inner: R) -> AsyncUtf8Reader<R> {
        AsyncUtf8Reader { inner, raw: vec![0u8; RAW_BUF_SIZE], raw_len: 0, raw_pos: 0 }
    }

    fn into_inner(self) -> R {
        self.inner
    }

    async fn refill(&mut self) -> io::Result<bool> {
        if self.raw_pos > 0 {
            self.raw.copy_within(self.raw_pos..self.raw_len, 0);
            self.raw_len -= self.raw_pos;
            self.raw_pos = 0;
        }
        if self.raw_len == self.raw.len() {
            return Ok(true);
        }
        let n = self.inner.read(&mut self.raw[self.raw_len..]).await?;
        self.raw_len += n;
        Ok(n > 0 || self.raw_len > 0)
    }

    /// Fills `buf` with as many decoded chars as are available, awaiting a
    /// refill at most once per call (the caller loop handles the rest, the
    /// same contract `CharSource::fill` uses on the sync side).
    async fn fill(&mut self, buf: &mut [char]) -> io::Result<usize> {
        let mut written = 0;
        loop {
            if written >= buf.len() {
                return Ok(written);
            }
            if self.raw_pos >= self.raw_len {
                let had_data = self.refill().await?;
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
                            let had_data = self.refill().await?;
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

/// Growable decoded-char staging buffer feeding the scanner, the async
/// counterpart of [`crate::buffer::PushbackBuffer`]. `ReadHeader::Detect`
/// resolves at the decoded-record level (`AsyncReader`'s own
/// `pending_first_record` slot) rather than through raw pushback, so this
/// stage still needs no pushback operation of its own.
struct AsyncStage<R> {
    source: AsyncUtf8Reader<R>,
    buf: Vec<char>,
    pos: usize,
    eof: bool,
    fill_size: usize,
}

const DEFAULT_FILL: usize = 4 * 1024;

impl<R: AsyncRead + Unpin> AsyncStage<R> {
    fn new(source: AsyncUtf8Reader<R>, fill_size: usize) -> AsyncStage<R> {
        let fill_size = if fill_size == 0 { DEFAULT_FILL } else { fill_size };
        AsyncStage { source, buf: Vec::new(), pos: 0, eof: false, fill_size }
    }

    fn available(&self) -> &[char] {
        &self.buf[self.pos..]
    }

    fn consume(&mut self, n: usize) {
        self.pos += n;
    }

    async fn fill_more(&mut self) -> io::Result<bool> {
        if self.pos > 0 {
            self.buf.drain(..self.pos);
            self.pos = 0;
        }
        if self.eof {
            return Ok(false);
        }
        let start = self.buf.len();
        self.buf.resize(start + self.fill_size, '\0');
        let n = self.source.fill(&mut self.buf[start..]).await?;
        self.buf.truncate(start + n);
        if n == 0 {
            self.eof = true;
        }
        Ok(n > 0)
    }

    fn into_inner(self) -> R {
        self.source.into_inner()
    }
}

/// Builds an [`AsyncReader`]. See [`crate::reader::ReaderBuilder`] for the
/// synchronous counterpart; the two share [`OptionsBuilder`] and
/// [`ReadHeader`].
pub struct AsyncReaderBuilder {
    options: OptionsBuilder,
    read_header: ReadHeader,
}

impl Default for AsyncReaderBuilder {
    fn default() -> AsyncReaderBuilder {
        AsyncReaderBuilder { options: OptionsBuilder::default(), read_header: ReadHeader::default() }
    }
}

impl AsyncReaderBuilder {
    pub fn new() -> AsyncReaderBuilder {
        AsyncReaderBuilder::default()
    }

    pub fn options(&mut self) -> &mut OptionsBuilder {
        &mut self.options
    }

    pub fn has_headers(&mut self, yes: bool) -> &mut AsyncReaderBuilder {
        self.read_header = if yes { ReadHeader::Always } else { ReadHeader::Never };
        self
    }

    /// How the first record is treated. `ReadHeader::Detect` behaves like
    /// `ReadHeader::Never` here: this type has no descriptor-driven
    /// `deserialize` to resolve it against (see
    /// `crate::reader::Reader::deserialize`).
    pub fn read_header(&mut self, r: ReadHeader) -> &mut AsyncReaderBuilder {
        self.read_header = r;
        self
    }

    pub fn from_reader<R: AsyncRead + Unpin>(&self, rdr: R) -> Result<AsyncReader<R>> {
        let options = self.options.build()?;
        Ok(AsyncReader::new(rdr, options, self.read_header))
    }
}

/// The `.await`-driven counterpart of [`crate::reader::Reader`]. Once any
/// call returns an error, the reader is poisoned: every later call fails
/// with `ErrorKind::Poisoned`.
pub struct AsyncReader<R> {
    stage: AsyncStage<R>,
    assembler: RecordAssembler,
    read_header: ReadHeader,
    headers: Option<HeaderIndex>,
    headers_read: bool,
    done: bool,
    poisoned: bool,
}

impl<R: AsyncRead + Unpin> AsyncReader<R> {
    fn new(rdr: R, options: Options, read_header: ReadHeader) -> AsyncReader<R> {
        let scanner = Scanner::new(options.dialect);
        AsyncReader {
            stage: AsyncStage::new(AsyncUtf8Reader::new(rdr), options.read_fill_size()),
            assembler: RecordAssembler::new(scanner, options.flexible, options.post_scan_trim()),
            read_header,
            headers: None,
            headers_read: false,
            done: false,
            poisoned: false,
        }
    }

    pub fn position(&self) -> Position {
        self.assembler.position()
    }

    pub fn row_ending_detected(&self) -> Detected {
        self.assembler.row_ending_detected()
    }

    pub async fn headers(&mut self) -> Result<Option<&HeaderIndex>> {
        self.check_poisoned()?;
        self.ensure_headers_read().await?;
        Ok(self.headers.as_ref())
    }

    fn check_poisoned(&self) -> Result<()> {
        if self.poisoned {
            return Err(new_error(ErrorKind::Poisoned));
        }
        Ok(())
    }

    async fn ensure_headers_read(&mut self) -> Result<()> {
        if self.headers_read {
            return Ok(());
        }
        self.headers_read = true;
        if self.read_header == ReadHeader::Always {
            if let Some(fields) = self.next_record().await? {
                self.headers = Some(HeaderIndex::new(fields));
            }
        }
        Ok(())
    }

    pub async fn read_record(&mut self) -> Result<Option<Vec<String>>> {
        self.check_poisoned()?;
        self.ensure_headers_read().await?;
        self.next_record().await
    }

    /// Reads the next record or comment line, without skipping comments —
    /// the comment-aware counterpart of `read_record`.
    pub async fn read_record_or_comment(&mut self) -> Result<Option<RecordOrComment>> {
        self.check_poisoned()?;
        self.ensure_headers_read().await?;
        self.next_record_or_comment().await
    }

    async fn next_record(&mut self) -> Result<Option<Vec<String>>> {
        loop {
            match self.next_record_or_comment().await? {
                Some(RecordOrComment::Record(fields)) => return Ok(Some(fields)),
                Some(RecordOrComment::Comment(_)) => continue,
                None => return Ok(None),
            }
        }
    }

    async fn next_record_or_comment(&mut self) -> Result<Option<RecordOrComment>> {
        if self.done {
            return Ok(None);
        }
        loop {
            let input = self.stage.available();
            let (outcome, nin) = self.assembler.step(input);
            self.stage.consume(nin);
            match outcome {
                Outcome::NeedsInput => {
                    if !self.stage.fill_more().await? {
                        match self.assembler.finish() {
                            Outcome::Record(fields) => return Ok(Some(RecordOrComment::Record(fields))),
                            Outcome::Comment(text) => return Ok(Some(RecordOrComment::Comment(text))),
                            Outcome::End => {
                                self.done = true;
                                return Ok(None);
                            }
                            Outcome::Err(e) => {
                                self.poisoned = true;
                                self.done = true;
                                return Err(e);
                            }
                            Outcome::NeedsInput => {
                                unreachable!("finalize_at_eof never reports NeedsInput")
                            }
                        }
                    }
                }
                Outcome::Record(fields) => return Ok(Some(RecordOrComment::Record(fields))),
                Outcome::Comment(text) => return Ok(Some(RecordOrComment::Comment(text))),
                Outcome::End => {
                    self.done = true;
                    return Ok(None);
                }
                Outcome::Err(e) => {
                    self.poisoned = true;
                    self.done = true;
                    return Err(e);
                }
            }
        }
    }

    pub fn into_inner(self) -> R {
        self.stage.into_inner()
    }

    /// A `Stream` of raw records, mirroring `csv-async`'s
    /// `AsyncReader::records`. Built with `stream::unfold` rather than a
    /// hand-rolled `Stream` impl, since the reader owns the in-flight
    /// future state it needs across `poll_next` calls.
    pub fn records(self) -> impl Stream<Item = Result<Vec<String>>> {
        stream::unfold(self, |mut reader| async move {
            match reader.read_record().await {
                Ok(Some(fields)) => Some((Ok(fields), reader)),
                Ok(None) => None,
                Err(e) => Some((Err(e), reader)),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::io::Cursor;
    use futures_util::StreamExt;

    #[test]
    fn reads_simple_records() {
        futures_executor::block_on(async {
            let mut r = AsyncReaderBuilder::new()
                .has_headers(false)
                .from_reader(Cursor::new(b"a,b\r\nc,d\r\n".to_vec()))
                .unwrap();
            assert_eq!(
                r.read_record().await.unwrap(),
                Some(vec!["a".to_string(), "b".to_string()])
            );
            assert_eq!(
                r.read_record().await.unwrap(),
                Some(vec!["c".to_string(), "d".to_string()])
            );
            assert_eq!(r.read_record().await.unwrap(), None);
        });
    }

    #[test]
    fn records_stream_yields_every_record() {
        futures_executor::block_on(async {
            let r = AsyncReaderBuilder::new()
                .has_headers(false)
                .from_reader(Cursor::new(b"a,b\r\nc,d\r\n".to_vec()))
                .unwrap();
            let records: Vec<_> = r.records().collect().await;
            assert_eq!(records.len(), 2);
            assert_eq!(records[0].as_ref().unwrap(), &vec!["a".to_string(), "b".to_string()]);
        });
    }

    #[test]
    fn read_record_or_comment_surfaces_comment_text() {
        futures_executor::block_on(async {
            let mut b = AsyncReaderBuilder::new();
            b.has_headers(false);
            b.options().comment_character(Some('#'));
            let mut r = b
                .from_reader(Cursor::new(b"# hi\r\na,b\r\n".to_vec()))
                .unwrap();
            assert_eq!(
                r.read_record_or_comment().await.unwrap(),
                Some(RecordOrComment::Comment(" hi".to_string()))
            );
            assert_eq!(
                r.read_record_or_comment().await.unwrap(),
                Some(RecordOrComment::Record(vec!["a".to_string(), "b".to_string()]))
            );
        });
    }

    #[test]
    fn errors_poison_the_reader_for_every_later_call() {
        futures_executor::block_on(async {
            let mut r = AsyncReaderBuilder::new()
                .has_headers(false)
                .from_reader(Cursor::new(b"a,b\r\nc\r\n".to_vec()))
                .unwrap();
            r.read_record().await.unwrap();
            assert!(r.read_record().await.is_err());
            let err = r.read_record().await.unwrap_err();
            assert!(matches!(err.kind(), ErrorKind::Poisoned));
        });
    }
}
