//! Streamed JSON array writer.
//!
//! Renders the surviving events as one syntactically valid array:
//! opening `[`, comma-separated elements, a trailing newline before the
//! closing `]`. Nothing is buffered beyond the element being written.

use crate::filter::Emit;
use crate::utils::error::OutputError;
use std::io::Write;

/// Writes output representations as a JSON array, one element at a time
///
/// **Public** - the pipeline's sink
///
/// Raw representations are written byte-for-byte; synthesized records are
/// serialized here.
pub struct ArrayWriter<W: Write> {
    inner: W,
    wrote_any: bool,
}

impl<W: Write> ArrayWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            wrote_any: false,
        }
    }

    /// Append one element to the array
    ///
    /// # Errors
    /// * `OutputError::WriteFailed` - the underlying write failed
    /// * `OutputError::SerializationFailed` - a synthesized event could not
    ///   be serialized
    pub fn write_event(&mut self, emit: &Emit) -> Result<(), OutputError> {
        if self.wrote_any {
            self.inner.write_all(b",\n")?;
        } else {
            self.inner.write_all(b"[\n")?;
            self.wrote_any = true;
        }

        match emit {
            Emit::Raw(text) => self.inner.write_all(text.as_bytes())?,
            Emit::Event(record) => serde_json::to_writer(&mut self.inner, record)?,
        }
        Ok(())
    }

    /// Close the array and hand back the underlying writer
    ///
    /// Handles the zero-element case: an empty input still produces a
    /// valid (empty) array.
    pub fn finish(mut self) -> Result<W, OutputError> {
        if !self.wrote_any {
            self.inner.write_all(b"[")?;
        }
        self.inner.write_all(b"\n]\n")?;
        Ok(self.inner)
    }
}
