use std::io;

use csvio_core::Scanner;

use crate::adapter::{Position, Utf8Reader};
use crate::buffer::PushbackBuffer;
use crate::descriptor::RowDescriptor;
use crate::detect::Detected;
use crate::engine::{Outcome, RecordAssembler, RecordOrComment};
use crate::error::{new_error, ErrorKind, Result};
use crate::headers::HeaderIndex;
use crate::options::{Options, OptionsBuilder};
use crate::row::{ConstructMode, RowConstructor};

/// Whether and how the first record is treated as a header row.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReadHeader {
    /// The first record is always headers, consumed once and never handed
    /// back as data.
    Always,
    /// There is no header record; the first record is data.
    Never,
    /// Read the first record, then decide: if any of its fields matches a
    /// column name declared on the `RowDescriptor` passed to `deserialize`,
    /// treat it as headers; otherwise treat it as the first data record.
    /// Resolution only happens on the first `deserialize` call, since only
    /// that call has a descriptor to compare fields against —
    /// `read_record`/`read_record_or_comment`/`headers` called without ever
    /// calling `deserialize` treat `Detect` the same as `Never`.
    Detect,
}

impl Default for ReadHeader {
    fn default() -> ReadHeader {
        ReadHeader::Always
    }
}

/// Builds a [`Reader`], mirroring the teacher's `ReaderBuilder`: an
/// `OptionsBuilder` wrapped with the one setting specific to the read side,
/// `read_header`.
pub struct ReaderBuilder {
    options: OptionsBuilder,
    read_header: ReadHeader,
}

impl Default for ReaderBuilder {
    fn default() -> ReaderBuilder {
        ReaderBuilder { options: OptionsBuilder::default(), read_header: ReadHeader::default() }
    }
}

impl ReaderBuilder {
    pub fn new() -> ReaderBuilder {
        ReaderBuilder::default()
    }

    pub fn options(&mut self) -> &mut OptionsBuilder {
        &mut self.options
    }

    /// Whether the first record is headers, consumed once and never handed
    /// back as data. Shorthand for `read_header(ReadHeader::Always)` /
    /// `read_header(ReadHeader::Never)`. Default `true`.
    pub fn has_headers(&mut self, yes: bool) -> &mut ReaderBuilder {
        self.read_header = if yes { ReadHeader::Always } else { ReadHeader::Never };
        self
    }

    /// How the first record is treated. Default `ReadHeader::Always`.
    pub fn read_header(&mut self, r: ReadHeader) -> &mut ReaderBuilder {
        self.read_header = r;
        self
    }

    pub fn from_reader<R: io::Read>(&self, rdr: R) -> Result<Reader<R>> {
        let options = self.options.build()?;
        Ok(Reader::new(rdr, options, self.read_header))
    }
}

/// Drives a [`Scanner`] over a byte stream, producing raw records and,
/// given a [`RowDescriptor`], typed rows.
///
/// Grounded in the teacher's `Reader<R>` (original `src/reader.rs`): the
/// same buffered-refill-then-scan loop, generalized from bytes to `char`
/// and from a byte-record/string-record pair to the descriptor-driven row
/// construction in `row.rs`. The actual scan-and-assemble step is shared
/// with [`crate::reader_async::AsyncReader`] through
/// [`crate::engine::RecordAssembler`]; this type only supplies the
/// blocking I/O strategy around it.
///
/// Once any call returns an error, the reader is poisoned: every later call
/// fails with `ErrorKind::Poisoned` instead of re-attempting a scan from
/// whatever state the error left the assembler in.
pub struct Reader<R> {
    buf: PushbackBuffer<Utf8Reader<R>>,
    assembler: RecordAssembler,
    read_header: ReadHeader,
    headers: Option<HeaderIndex>,
    headers_read: bool,
    pending_first_record: Option<Vec<String>>,
    done: bool,
    poisoned: bool,
}

impl<R: io::Read> Reader<R> {
    fn new(rdr: R, options: Options, read_header: ReadHeader) -> Reader<R> {
        let scanner = Scanner::new(options.dialect);
        Reader {
            buf: PushbackBuffer::new(Utf8Reader::new(rdr), options.read_fill_size()),
            assembler: RecordAssembler::new(scanner, options.flexible, options.post_scan_trim()),
            read_header,
            headers: None,
            headers_read: false,
            pending_first_record: None,
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

    pub fn headers(&mut self) -> Result<Option<&HeaderIndex>> {
        self.check_poisoned()?;
        self.ensure_headers_read()?;
        Ok(self.headers.as_ref())
    }

    fn check_poisoned(&self) -> Result<()> {
        if self.poisoned {
            return Err(new_error(ErrorKind::Poisoned));
        }
        Ok(())
    }

    fn ensure_headers_read(&mut self) -> Result<()> {
        if self.headers_read {
            return Ok(());
        }
        self.headers_read = true;
        match self.read_header {
            ReadHeader::Always => {
                if let Some(fields) = self.next_record()? {
                    self.headers = Some(HeaderIndex::new(fields));
                }
            }
            // Without a descriptor there is nothing to compare the first
            // record against, so `Detect` resolves to `Never` here; only
            // `deserialize` can actually perform the match.
            ReadHeader::Never | ReadHeader::Detect => {}
        }
        Ok(())
    }

    /// Reads the next record's fields as owned strings, skipping comment
    /// lines, or `None` at end of input.
    pub fn read_record(&mut self) -> Result<Option<Vec<String>>> {
        self.check_poisoned()?;
        self.ensure_headers_read()?;
        self.next_record()
    }

    /// Reads the next record or comment line, without skipping comments —
    /// the comment-aware counterpart of `read_record`.
    pub fn read_record_or_comment(&mut self) -> Result<Option<RecordOrComment>> {
        self.check_poisoned()?;
        self.ensure_headers_read()?;
        self.next_record_or_comment()
    }

    /// Reads the next record, skipping over any comment lines in between.
    fn next_record(&mut self) -> Result<Option<Vec<String>>> {
        loop {
            match self.next_record_or_comment()? {
                Some(RecordOrComment::Record(fields)) => return Ok(Some(fields)),
                Some(RecordOrComment::Comment(_)) => continue,
                None => return Ok(None),
            }
        }
    }

    fn next_record_or_comment(&mut self) -> Result<Option<RecordOrComment>> {
        if let Some(fields) = self.pending_first_record.take() {
            return Ok(Some(RecordOrComment::Record(fields)));
        }
        if self.done {
            return Ok(None);
        }
        loop {
            let input = self.buf.available();
            let (outcome, nin) = self.assembler.step(input);
            self.buf.consume(nin);
            match outcome {
                Outcome::NeedsInput => {
                    if !self.buf.fill_more()? {
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

    /// Reads and constructs the next typed row, using header-name binding if
    /// headers were read, positional binding otherwise.
    ///
    /// When `read_header(ReadHeader::Detect)` is configured, the first call
    /// resolves the header question itself: the first record is read and
    /// compared against `descriptor`'s declared column names; if any field
    /// matches a declared name the record is treated as headers and a
    /// further record is read as the first row, otherwise the record just
    /// read is used directly as the first row.
    pub fn deserialize<T: Default>(&mut self, descriptor: &RowDescriptor<T>) -> Result<Option<T>> {
        self.check_poisoned()?;
        if self.read_header == ReadHeader::Detect && !self.headers_read {
            self.headers_read = true;
            if let Some(fields) = self.next_record()? {
                let is_header = fields
                    .iter()
                    .any(|f| descriptor.columns().iter().any(|c| c.name() == Some(f.as_str())));
                if is_header {
                    self.headers = Some(HeaderIndex::new(fields));
                } else {
                    self.pending_first_record = Some(fields);
                }
            }
        } else {
            self.ensure_headers_read()?;
        }
        let fields = match self.next_record()? {
            Some(fields) => fields,
            None => return Ok(None),
        };
        let mode = match &self.headers {
            Some(h) => ConstructMode::ByName(h.clone()),
            None => ConstructMode::Positional,
        };
        let mut rc = RowConstructor::new(descriptor, mode);
        let refs: Vec<&str> = fields.iter().map(String::as_str).collect();
        rc.construct(refs).map(Some)
    }

    pub fn into_inner(self) -> R {
        self.buf.into_inner().into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ColumnDescriptor;
    use crate::error::ErrorKind;

    fn reader_for(s: &str) -> Reader<io::Cursor<Vec<u8>>> {
        ReaderBuilder::new()
            .has_headers(false)
            .from_reader(io::Cursor::new(s.as_bytes().to_vec()))
            .unwrap()
    }

    #[test]
    fn reads_simple_records() {
        let mut r = reader_for("a,b\r\nc,d\r\n");
        assert_eq!(r.read_record().unwrap(), Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(r.read_record().unwrap(), Some(vec!["c".to_string(), "d".to_string()]));
        assert_eq!(r.read_record().unwrap(), None);
    }

    #[test]
    fn reads_quoted_value_with_embedded_separator_and_doubled_quote() {
        let mut r = reader_for("\"a,b\",\"c\"\"d\"\r\n");
        assert_eq!(
            r.read_record().unwrap(),
            Some(vec!["a,b".to_string(), "c\"d".to_string()])
        );
    }

    #[test]
    fn unequal_length_record_errors_without_flexible() {
        let mut r = reader_for("a,b\r\nc\r\n");
        r.read_record().unwrap();
        let err = r.read_record().unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::UnequalLengths { .. }));
    }

    #[test]
    fn flexible_allows_unequal_length_records() {
        let mut b = ReaderBuilder::new();
        b.has_headers(false);
        b.options().flexible(true);
        let mut r = b.from_reader(io::Cursor::new(b"a,b\r\nc\r\n".to_vec())).unwrap();
        assert_eq!(r.read_record().unwrap(), Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(r.read_record().unwrap(), Some(vec!["c".to_string()]));
    }

    #[test]
    fn headers_bind_columns_by_name_out_of_order() {
        #[derive(Default, Debug, PartialEq)]
        struct Row {
            id: i64,
            name: String,
        }
        let mut d: RowDescriptor<Row> = RowDescriptor::new();
        d.push_column(ColumnDescriptor::new(
            Some("id".to_string()),
            |s: &str| s.parse::<i64>().map_err(|e| e.to_string()),
            |r: &mut Row, v: i64| r.id = v,
        ));
        d.push_column(ColumnDescriptor::new(
            Some("name".to_string()),
            |s: &str| Ok::<_, String>(s.to_string()),
            |r: &mut Row, v: String| r.name = v,
        ));
        let mut r = ReaderBuilder::new()
            .from_reader(io::Cursor::new(b"name,id\r\nbob,9\r\n".to_vec()))
            .unwrap();
        let row = r.deserialize(&d).unwrap().unwrap();
        assert_eq!(row, Row { id: 9, name: "bob".to_string() });
    }

    #[test]
    fn skips_comment_lines() {
        let mut b = ReaderBuilder::new();
        b.has_headers(false);
        b.options().comment_character(Some('#'));
        let mut r = b
            .from_reader(io::Cursor::new(b"# a comment\r\na,b\r\n".to_vec()))
            .unwrap();
        assert_eq!(r.read_record().unwrap(), Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn read_record_or_comment_surfaces_comment_text() {
        let mut b = ReaderBuilder::new();
        b.has_headers(false);
        b.options().comment_character(Some('#'));
        let mut r = b
            .from_reader(io::Cursor::new(b"# top comment\r\nA,B\r\n1,2\r\n".to_vec()))
            .unwrap();
        assert_eq!(
            r.read_record_or_comment().unwrap(),
            Some(RecordOrComment::Comment(" top comment".to_string()))
        );
        assert_eq!(
            r.read_record_or_comment().unwrap(),
            Some(RecordOrComment::Record(vec!["A".to_string(), "B".to_string()]))
        );
        assert_eq!(
            r.read_record_or_comment().unwrap(),
            Some(RecordOrComment::Record(vec!["1".to_string(), "2".to_string()]))
        );
        assert_eq!(r.read_record_or_comment().unwrap(), None);
    }

    #[test]
    fn errors_poison_the_reader_for_every_later_call() {
        let mut r = reader_for("a,b\r\nc\r\n");
        r.read_record().unwrap();
        assert!(r.read_record().is_err());
        let err = r.read_record().unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Poisoned));
    }

    #[test]
    fn detect_header_treats_matching_first_record_as_headers() {
        #[derive(Default, Debug, PartialEq)]
        struct Row {
            id: i64,
        }
        let mut d: RowDescriptor<Row> = RowDescriptor::new();
        d.push_column(ColumnDescriptor::new(
            Some("id".to_string()),
            |s: &str| s.parse::<i64>().map_err(|e| e.to_string()),
            |r: &mut Row, v: i64| r.id = v,
        ));
        let mut b = ReaderBuilder::new();
        b.read_header(ReadHeader::Detect);
        let mut r = b.from_reader(io::Cursor::new(b"id\r\n7\r\n".to_vec())).unwrap();
        let row = r.deserialize(&d).unwrap().unwrap();
        assert_eq!(row, Row { id: 7 });
        assert_eq!(r.deserialize(&d).unwrap(), None);
    }

    #[test]
    fn detect_header_treats_nonmatching_first_record_as_data() {
        #[derive(Default, Debug, PartialEq)]
        struct Row {
            id: i64,
        }
        let mut d: RowDescriptor<Row> = RowDescriptor::new();
        d.push_column(ColumnDescriptor::new(
            Some("id".to_string()),
            |s: &str| s.parse::<i64>().map_err(|e| e.to_string()),
            |r: &mut Row, v: i64| r.id = v,
        ));
        let mut b = ReaderBuilder::new();
        b.read_header(ReadHeader::Detect);
        let mut r = b.from_reader(io::Cursor::new(b"7\r\n8\r\n".to_vec())).unwrap();
        assert_eq!(r.deserialize(&d).unwrap(), Some(Row { id: 7 }));
        assert_eq!(r.deserialize(&d).unwrap(), Some(Row { id: 8 }));
    }
}
