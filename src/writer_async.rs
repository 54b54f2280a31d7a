//! Asynchronous writer pipeline, feature-gated behind `async`. Mirrors
//! `csv-async`'s `AsyncWriter`/`AsyncWriterBuilder`, delegating field
//! formatting to the same `csvio_core::FieldWriter` the synchronous
//! [`crate::writer::Writer`] uses.

use std::io;

use csvio_core::{FieldWriter, WriteResult};
use futures_util::io::{AsyncWrite, AsyncWriteExt};

use crate::options::{Options, OptionsBuilder, WriteTrailingRowEnding};
use crate::error::Result;

const DEFAULT_OUT_CAPACITY: usize = 1024;

/// Builds an [`AsyncWriter`]. See [`crate::writer::WriterBuilder`] for the
/// synchronous counterpart; the two share [`OptionsBuilder`].
pub struct AsyncWriterBuilder {
    options: OptionsBuilder,
}

impl Default for AsyncWriterBuilder {
    fn default() -> AsyncWriterBuilder {
        AsyncWriterBuilder { options: OptionsBuilder::default() }
    }
}

impl AsyncWriterBuilder {
    pub fn new() -> AsyncWriterBuilder {
        AsyncWriterBuilder::default()
    }

    pub fn options(&mut self) -> &mut OptionsBuilder {
        &mut self.options
    }

    pub fn from_writer<W: AsyncWrite + Unpin>(&self, wtr: W) -> Result<AsyncWriter<W>> {
        let options = self.options.build()?;
        Ok(AsyncWriter::new(wtr, options))
    }
}

/// The `.await`-driven counterpart of [`crate::writer::Writer`].
pub struct AsyncWriter<W> {
    inner: W,
    field_writer: FieldWriter,
    write_trailing_row_ending: WriteTrailingRowEnding,
    /// A terminator owed from the previous `write_record` call; see
    /// `crate::writer::Writer`'s field of the same name.
    pending_terminator: bool,
    out: Vec<char>,
    raw: Vec<u8>,
}

impl<W: AsyncWrite + Unpin> AsyncWriter<W> {
    fn new(wtr: W, options: Options) -> AsyncWriter<W> {
        AsyncWriter {
            inner: wtr,
            field_writer: FieldWriter::new(options.dialect, options.escape_style),
            write_trailing_row_ending: options.write_trailing_row_ending,
            pending_terminator: false,
            out: vec!['\0'; options.write_initial_capacity(DEFAULT_OUT_CAPACITY)],
            raw: Vec::with_capacity(4 * 1024),
        }
    }

    pub async fn write_record<I, T>(&mut self, fields: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        if self.pending_terminator {
            self.write_terminator().await?;
            self.pending_terminator = false;
        }
        self.field_writer.start_new_record();
        for field in fields {
            self.write_field(field.as_ref()).await?;
        }
        self.pending_terminator = true;
        Ok(())
    }

    async fn write_field(&mut self, value: &str) -> Result<()> {
        loop {
            match self.field_writer.write(value, &mut self.out) {
                WriteResult::Written(n) => {
                    self.write_chars(n).await?;
                    return Ok(());
                }
                WriteResult::OutputFull => {
                    let new_len = self.out.len() * 2;
                    self.out.resize(new_len, '\0');
                }
            }
        }
    }

    async fn write_terminator(&mut self) -> Result<()> {
        loop {
            match self.field_writer.write_terminator(&mut self.out) {
                WriteResult::Written(n) => {
                    self.write_chars(n).await?;
                    return Ok(());
                }
                WriteResult::OutputFull => {
                    let new_len = self.out.len() * 2;
                    self.out.resize(new_len, '\0');
                }
            }
        }
    }

    async fn write_chars(&mut self, n: usize) -> io::Result<()> {
        self.raw.clear();
        let mut tmp = [0u8; 4];
        for &c in &self.out[..n] {
            self.raw.extend_from_slice(c.encode_utf8(&mut tmp).as_bytes());
        }
        self.inner.write_all(&self.raw).await
    }

    pub async fn flush(&mut self) -> Result<()> {
        if self.pending_terminator && self.write_trailing_row_ending == WriteTrailingRowEnding::Always {
            self.write_terminator().await?;
            self.pending_terminator = false;
        }
        self.inner.flush().await?;
        Ok(())
    }

    pub async fn into_inner(mut self) -> std::result::Result<W, (io::Error, W)> {
        match self.flush().await {
            Ok(()) => Ok(self.inner),
            Err(e) => Err((e.into(), self.inner)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::io::Cursor;

    #[test]
    fn writes_plain_record_with_crlf_terminator() {
        futures_executor::block_on(async {
            let mut w = AsyncWriterBuilder::new().from_writer(Cursor::new(Vec::new())).unwrap();
            w.write_record(&["a", "b"]).await.unwrap();
            let out = w.into_inner().await.unwrap().into_inner();
            assert_eq!(out, b"a,b\r\n");
        });
    }

    #[test]
    fn suppresses_trailing_terminator_when_never() {
        futures_executor::block_on(async {
            let mut b = AsyncWriterBuilder::new();
            b.options().write_trailing_row_ending(WriteTrailingRowEnding::Never);
            let mut w = b.from_writer(Cursor::new(Vec::new())).unwrap();
            w.write_record(&["a", "b"]).await.unwrap();
            w.write_record(&["c", "d"]).await.unwrap();
            let out = w.into_inner().await.unwrap().into_inner();
            assert_eq!(out, b"a,b\r\nc,d");
        });
    }
}
