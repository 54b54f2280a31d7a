use std::error::Error as StdError;
use std::fmt;
use std::io;

use csvio_core::{FieldWriter, WriteResult};

use crate::adapter::Utf8Writer;
use crate::descriptor::RowDescriptor;
use crate::error::{Error, Result};
use crate::options::{Options, OptionsBuilder, WriteTrailingRowEnding};
use crate::row::format_row;

const DEFAULT_OUT_CAPACITY: usize = 1024;

/// Builds a [`Writer`], mirroring the teacher's `WriterBuilder`: an
/// `OptionsBuilder` wrapped with the one setting specific to the write
/// side, `has_headers`.
pub struct WriterBuilder {
    options: OptionsBuilder,
    has_headers: bool,
}

impl Default for WriterBuilder {
    fn default() -> WriterBuilder {
        WriterBuilder { options: OptionsBuilder::default(), has_headers: true }
    }
}

impl WriterBuilder {
    pub fn new() -> WriterBuilder {
        WriterBuilder::default()
    }

    pub fn options(&mut self) -> &mut OptionsBuilder {
        &mut self.options
    }

    /// Whether a header record (the write-descriptor's column names) is
    /// written before the first row. Default `true`.
    pub fn has_headers(&mut self, yes: bool) -> &mut WriterBuilder {
        self.has_headers = yes;
        self
    }

    pub fn from_writer<W: io::Write>(&self, wtr: W) -> Result<Writer<W>> {
        let options = self.options.build()?;
        Ok(Writer::new(wtr, options, self.has_headers))
    }
}

/// Drives a [`csvio_core::FieldWriter`] over a byte sink, formatting rows
/// via a [`RowDescriptor`].
///
/// Grounded in the teacher's `Writer<W>` (original `src/writer.rs`): field
/// writing, quoting and the trailing terminator are delegated to
/// `csvio_core::FieldWriter`, generalized here to the descriptor-driven
/// value formatting from `row.rs` instead of `Encodable`.
pub struct Writer<W: io::Write> {
    sink: Option<Utf8Writer<W>>,
    field_writer: FieldWriter,
    headers_written: bool,
    write_trailing_row_ending: WriteTrailingRowEnding,
    /// A terminator owed from the previous `write_record` call, written at
    /// the start of the next one (or at `flush`/`into_inner` time if
    /// `write_trailing_row_ending` is `Always`) — this is what lets the
    /// writer withhold the terminator after the very last record.
    pending_terminator: bool,
    out: Vec<char>,
}

impl<W: io::Write> Writer<W> {
    fn new(wtr: W, options: Options, has_headers: bool) -> Writer<W> {
        Writer {
            sink: Some(Utf8Writer::new(wtr)),
            field_writer: FieldWriter::new(options.dialect, options.escape_style),
            headers_written: !has_headers,
            write_trailing_row_ending: options.write_trailing_row_ending,
            pending_terminator: false,
            out: vec!['\0'; options.write_initial_capacity(DEFAULT_OUT_CAPACITY)],
        }
    }

    /// Writes a raw record's fields, each already formatted to text.
    pub fn write_record<I, T>(&mut self, fields: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        if self.pending_terminator {
            self.write_terminator()?;
            self.pending_terminator = false;
        }
        self.field_writer.start_new_record();
        for field in fields {
            self.write_field(field.as_ref())?;
        }
        self.pending_terminator = true;
        Ok(())
    }

    /// Writes one row, emitting a header record first if configured and not
    /// yet written.
    pub fn serialize<T>(&mut self, descriptor: &RowDescriptor<T>, row: &T) -> Result<()> {
        if !self.headers_written {
            self.headers_written = true;
            let names: Vec<String> = descriptor
                .write_columns()
                .iter()
                .map(|c| c.name().unwrap_or("").to_string())
                .collect();
            self.write_record(&names)?;
        }
        let values = format_row(descriptor, row);
        self.write_record(&values)
    }

    fn write_field(&mut self, value: &str) -> Result<()> {
        loop {
            match self.field_writer.write(value, &mut self.out) {
                WriteResult::Written(n) => {
                    self.sink_mut().write_chars(&self.out[..n])?;
                    return Ok(());
                }
                WriteResult::OutputFull => {
                    let new_len = self.out.len() * 2;
                    self.out.resize(new_len, '\0');
                }
            }
        }
    }

    fn write_terminator(&mut self) -> Result<()> {
        loop {
            match self.field_writer.write_terminator(&mut self.out) {
                WriteResult::Written(n) => {
                    self.sink_mut().write_chars(&self.out[..n])?;
                    return Ok(());
                }
                WriteResult::OutputFull => {
                    let new_len = self.out.len() * 2;
                    self.out.resize(new_len, '\0');
                }
            }
        }
    }

    fn sink_mut(&mut self) -> &mut Utf8Writer<W> {
        self.sink.as_mut().expect("writer used after into_inner")
    }

    pub fn flush(&mut self) -> Result<()> {
        if self.pending_terminator && self.write_trailing_row_ending == WriteTrailingRowEnding::Always {
            self.write_terminator()?;
            self.pending_terminator = false;
        }
        self.sink_mut().flush()?;
        Ok(())
    }

    /// Flushes and returns the underlying writer, or an [`IntoInnerError`]
    /// carrying both the flush error and the writer if flushing failed.
    pub fn into_inner(mut self) -> std::result::Result<W, IntoInnerError<W>> {
        match self.flush() {
            Ok(()) => Ok(self.sink.take().expect("sink present").into_inner()),
            Err(err) => {
                let sink = self.sink.take().expect("sink present");
                Err(IntoInnerError { writer: sink.into_inner(), error: err })
            }
        }
    }
}

impl<W: io::Write> Drop for Writer<W> {
    fn drop(&mut self) {
        if self.sink.is_some() {
            let _ = self.flush();
        }
    }
}

/// Returned by [`Writer::into_inner`] when the final flush fails, carrying
/// both the error and the writer so the caller can decide what to do with
/// unflushed state instead of losing it.
pub struct IntoInnerError<W> {
    writer: W,
    error: Error,
}

impl<W> IntoInnerError<W> {
    pub fn error(&self) -> &Error {
        &self.error
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    pub fn into_error(self) -> Error {
        self.error
    }
}

impl<W> fmt::Debug for IntoInnerError<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.error.fmt(f)
    }
}

impl<W> fmt::Display for IntoInnerError<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to flush writer while consuming it: {}", self.error)
    }
}

impl<W> StdError for IntoInnerError<W> {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::WriteColumnDescriptor;

    #[test]
    fn writes_plain_record_with_crlf_terminator() {
        let mut w = WriterBuilder::new()
            .from_writer(Vec::new())
            .unwrap();
        w.write_record(&["a", "b"]).unwrap();
        let out = w.into_inner().unwrap();
        assert_eq!(out, b"a,b\r\n");
    }

    #[test]
    fn quotes_value_with_embedded_separator() {
        let mut w = WriterBuilder::new().from_writer(Vec::new()).unwrap();
        w.write_record(&["a,b", "c"]).unwrap();
        let out = w.into_inner().unwrap();
        assert_eq!(out, b"\"a,b\",c\r\n");
    }

    #[test]
    fn suppresses_trailing_terminator_when_never() {
        let mut b = WriterBuilder::new();
        b.options().write_trailing_row_ending(WriteTrailingRowEnding::Never);
        let mut w = b.from_writer(Vec::new()).unwrap();
        w.write_record(&["a", "b"]).unwrap();
        w.write_record(&["c", "d"]).unwrap();
        let out = w.into_inner().unwrap();
        assert_eq!(out, b"a,b\r\nc,d");
    }

    #[test]
    fn serialize_writes_header_then_row_once() {
        #[derive(Default)]
        struct Row {
            id: i64,
            name: String,
        }
        let mut d: RowDescriptor<Row> = RowDescriptor::new();
        d.push_write_column(WriteColumnDescriptor::new("id", |r: &Row| r.id, |v: &i64| v.to_string()));
        d.push_write_column(WriteColumnDescriptor::new("name", |r: &Row| r.name.clone(), |v: &String| v.clone()));

        let mut w = WriterBuilder::new().from_writer(Vec::new()).unwrap();
        w.serialize(&d, &Row { id: 1, name: "a".to_string() }).unwrap();
        w.serialize(&d, &Row { id: 2, name: "b".to_string() }).unwrap();
        let out = w.into_inner().unwrap();
        assert_eq!(out, b"id,name\r\n1,a\r\n2,b\r\n");
    }
}
