//! Output sinks the converter writes to.

use std::io;

use crate::error::Result;

/// An append-only text sink.
///
/// The converter calls [`TextSink::write_text`] in strict document order and
/// never rewrites earlier output, so any ordered byte sink can back it.
pub trait TextSink {
    /// Append `text` to the output.
    fn write_text(&mut self, text: &str) -> Result<()>;
}

impl TextSink for String {
    fn write_text(&mut self, text: &str) -> Result<()> {
        self.push_str(text);
        Ok(())
    }
}

/// Adapter exposing any [`io::Write`] as a [`TextSink`].
#[derive(Debug)]
pub struct WriteSink<W: io::Write> {
    inner: W,
}

impl<W: io::Write> WriteSink<W> {
    /// Wrap a writer.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Flush buffered bytes through to the underlying writer.
    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Unwrap the adapter, returning the underlying writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: io::Write> TextSink for WriteSink<W> {
    fn write_text(&mut self, text: &str) -> Result<()> {
        self.inner.write_all(text.as_bytes())?;
        Ok(())
    }
}
