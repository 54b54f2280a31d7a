//! Streaming CSV (de)serialization with a table-driven tokenizer and
//! pluggable row binding.
//!
//! The tokenizer and low-level field writer live in `csvio-core`, shared
//! between the synchronous pipeline here and the optional asynchronous one
//! behind the `async` feature. Row construction has no reflection to lean
//! on, so callers bind columns explicitly through [`descriptor`]'s
//! `ColumnDescriptor`/`WriteColumnDescriptor`, or read untyped rows via
//! [`dynamic::DynamicRow`].
//!
//! ```no_run
//! use csvio::{ReaderBuilder, WriterBuilder};
//!
//! # fn run() -> csvio::Result<()> {
//! let mut rdr = ReaderBuilder::new().from_reader(std::io::stdin())?;
//! let mut wtr = WriterBuilder::new().from_writer(std::io::stdout())?;
//! while let Some(record) = rdr.read_record()? {
//!     wtr.write_record(&record)?;
//! }
//! # Ok(())
//! # }
//! ```

mod adapter;
mod buffer;
mod descriptor;
mod detect;
mod dynamic;
mod engine;
mod error;
mod headers;
mod options;
mod pool;
mod reader;
mod row;
mod writer;

#[cfg(feature = "async")]
mod reader_async;
#[cfg(feature = "async")]
mod writer_async;

pub use adapter::{CharSource, Position, Utf8Reader, Utf8Writer};
pub use csvio_core::{Dialect, EscapeStyle, RowEnding as CoreRowEnding};
pub use descriptor::{ColumnDescriptor, HoldSlots, InstanceProvider, RowDescriptor, WriteColumnDescriptor};
pub use detect::{Detected, RowEnding};
pub use dynamic::{DynamicRow, DynamicRowBuilder};
pub use engine::RecordOrComment;
pub use error::{Error, ErrorKind, Result};
pub use headers::HeaderIndex;
pub use options::{DynamicRowDisposal, Options, OptionsBuilder, WriteTrailingRowEnding};
pub use reader::{ReadHeader, Reader, ReaderBuilder};
pub use row::{format_row, ConstructMode, RowConstructor};
pub use writer::{IntoInnerError, Writer, WriterBuilder};

#[cfg(feature = "async")]
pub use reader_async::{AsyncReader, AsyncReaderBuilder};
#[cfg(feature = "async")]
pub use writer_async::{AsyncWriter, AsyncWriterBuilder};
