//! Buffered line reading with a one-line lookahead.

use std::io::{BufRead, BufReader, Read};

use crate::error::Result;

/// A line reader over a byte stream, with a single-slot lookahead.
///
/// Bytes are decoded through the fixed 8-bit-transparent intermediate
/// charset: every byte maps to the Unicode scalar of equal value. Raw byte
/// values therefore survive into the line strings, so per-property CHARSET
/// parameters can be honoured later by consumers. CRLF, LF and lone CR all
/// terminate a line and are stripped.
pub(crate) struct LineSource<R: Read> {
    reader: BufReader<R>,
    /// Outer `None`: no lookahead cached. Inner `None`: the lookahead is end
    /// of stream. The two must not be conflated.
    pending: Option<Option<String>>,
}

impl<R: Read> LineSource<R> {
    pub(crate) fn new(input: R) -> Self {
        Self {
            reader: BufReader::new(input),
            pending: None,
        }
    }

    /// Reads and consumes the next line. `None` means end of stream.
    pub(crate) fn read_line(&mut self) -> Result<Option<String>> {
        if let Some(pending) = self.pending.take() {
            return Ok(pending);
        }
        self.next_line()
    }

    /// Returns the next line without consuming it. The following
    /// [`read_line`](Self::read_line) will return the same line.
    pub(crate) fn peek_line(&mut self) -> Result<Option<&str>> {
        if self.pending.is_none() {
            let line = self.next_line()?;
            self.pending = Some(line);
        }
        Ok(self.pending.as_ref().and_then(|line| line.as_deref()))
    }

    /// Reads and consumes lines until one is non-blank. `None` means the
    /// stream ended first.
    pub(crate) fn read_non_blank_line(&mut self) -> Result<Option<String>> {
        loop {
            match self.read_line()? {
                Some(line) if line.trim().is_empty() => {}
                other => return Ok(other),
            }
        }
    }

    fn next_line(&mut self) -> Result<Option<String>> {
        let mut bytes = Vec::new();
        loop {
            let buffer = self.reader.fill_buf()?;
            if buffer.is_empty() {
                if bytes.is_empty() {
                    return Ok(None);
                }
                break;
            }

            match buffer.iter().position(|&b| b == b'\n' || b == b'\r') {
                Some(pos) => {
                    bytes.extend_from_slice(&buffer[..pos]);
                    let terminator = buffer[pos];
                    self.reader.consume(pos + 1);
                    if terminator == b'\r' {
                        // CRLF: swallow the LF half.
                        let buffer = self.reader.fill_buf()?;
                        if buffer.first() == Some(&b'\n') {
                            self.reader.consume(1);
                        }
                    }
                    break;
                }
                None => {
                    let len = buffer.len();
                    bytes.extend_from_slice(buffer);
                    self.reader.consume(len);
                }
            }
        }

        Ok(Some(bytes.iter().map(|&b| char::from(b)).collect()))
    }
}
