//! Tab-delimited output sink.
//!
//! Buffers rows in a `BufWriter` and tags every I/O failure with the
//! destination it was writing to.

use std::io::{self, BufWriter, Write};

use crate::error::{Result, WindowError};

/// Leading header fields for the window identity columns.
pub const WINDOW_HEADER: &str = "contig\tstart\tend";

pub struct TableWriter<W: Write> {
    writer: BufWriter<W>,
    destination: String,
}

impl<W: Write> TableWriter<W> {
    /// `destination` names the sink in error messages.
    pub fn new(writer: W, destination: impl Into<String>) -> Self {
        Self { writer: BufWriter::new(writer), destination: destination.into() }
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    fn io_error(&self, source: io::Error) -> WindowError {
        WindowError::SinkWrite { destination: self.destination.clone(), source }
    }

    pub fn write_header(&mut self, columns: &[String]) -> Result<()> {
        let line = if columns.is_empty() {
            WINDOW_HEADER.to_string()
        } else {
            format!("{}\t{}", WINDOW_HEADER, columns.join("\t"))
        };
        writeln!(self.writer, "{}", line).map_err(|e| self.io_error(e))
    }

    pub fn write_row<S: AsRef<str>>(&mut self, fields: &[S]) -> Result<()> {
        self.write_fields(fields).map_err(|e| self.io_error(e))
    }

    fn write_fields<S: AsRef<str>>(&mut self, fields: &[S]) -> io::Result<()> {
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                self.writer.write_all(b"\t")?;
            }
            self.writer.write_all(field.as_ref().as_bytes())?;
        }
        self.writer.write_all(b"\n")
    }

    /// Flush buffered rows and hand back the underlying writer.
    pub fn finish(self) -> Result<W> {
        let destination = self.destination;
        self.writer
            .into_inner()
            .map_err(|e| WindowError::SinkWrite { destination, source: e.into_error() })
    }
}
