//! Line framing for agent stdout and stderr.
//!
//! Agents write arbitrary text, so the decoder differs from
//! [`tokio_util::codec::LinesCodec`] in two ways: invalid UTF-8 is replaced
//! rather than failing the stream, and an oversized line is dropped with a
//! warning instead of surfacing an error.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tokio_util::codec::FramedRead;
//! use agent_signal::runner::codec::OutputCodec;
//!
//! let lines = FramedRead::new(child_stdout, OutputCodec::new());
//! ```

use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;
use tracing::warn;

use crate::AppError;

/// Default maximum line length: 1 MiB.
pub const MAX_LINE_BYTES: usize = 1_048_576;

/// Newline-delimited text decoder.
///
/// A line is yielded only once its `\n` arrives, or at end of stream for a
/// trailing partial line, so chunking of the underlying reads never changes
/// the decoded sequence. A trailing `\r` is stripped.
#[derive(Debug)]
pub struct OutputCodec {
    /// Index in the buffer up to which no newline was found yet.
    next_index: usize,
    max_length: usize,
    /// Skipping the remainder of an oversized line.
    discarding: bool,
}

impl OutputCodec {
    /// Create a codec with the default [`MAX_LINE_BYTES`] limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_length(MAX_LINE_BYTES)
    }

    /// Create a codec with a custom line limit; 0 is treated as 1.
    #[must_use]
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            next_index: 0,
            max_length: max_length.max(1),
            discarding: false,
        }
    }

    /// Configured maximum line length.
    #[must_use]
    pub fn max_length(&self) -> usize {
        self.max_length
    }
}

impl Default for OutputCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for OutputCodec {
    type Item = String;
    type Error = AppError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            // One byte past the limit so a line of exactly `max_length`
            // bytes can still find its newline.
            let read_to = src.len().min(self.max_length.saturating_add(1));
            let newline = src[self.next_index..read_to]
                .iter()
                .position(|b| *b == b'\n');

            match (self.discarding, newline) {
                (true, Some(offset)) => {
                    src.advance(self.next_index + offset + 1);
                    self.next_index = 0;
                    self.discarding = false;
                }
                (true, None) => {
                    src.advance(read_to);
                    self.next_index = 0;
                    if src.is_empty() {
                        return Ok(None);
                    }
                }
                (false, Some(offset)) => {
                    let end = self.next_index + offset;
                    self.next_index = 0;
                    let line = src.split_to(end + 1);
                    return Ok(Some(decode_line(&line[..end])));
                }
                (false, None) if src.len() > self.max_length => {
                    warn!(
                        max_line_bytes = self.max_length,
                        "discarding oversized output line"
                    );
                    self.discarding = true;
                }
                (false, None) => {
                    self.next_index = read_to;
                    return Ok(None);
                }
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }

        self.next_index = 0;
        if self.discarding {
            src.clear();
            self.discarding = false;
            return Ok(None);
        }
        if src.is_empty() {
            return Ok(None);
        }

        let line = src.split_to(src.len());
        Ok(Some(decode_line(&line)))
    }
}

// ── Private helper ────────────────────────────────────────────────────────────

/// Decode one line without its `\n`, dropping a trailing `\r`.
fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}
