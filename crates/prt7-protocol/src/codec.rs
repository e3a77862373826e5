//! Line-based codec for the PRT-7 serial stream.
//!
//! The sender terminates every frame with `\r\n` (Arduino `Serial.println`).
//! Bytes arrive in arbitrary chunks, so they are accumulated here until a
//! terminator shows up. Blank lines are skipped, and lines longer than the
//! receive limit keep only their first `max_line_length` bytes.

use bytes::BytesMut;

/// Default maximum number of bytes kept per line.
pub const MAX_LINE_LENGTH: usize = 99;

/// Line terminator written by [`LineCodec::encode_line`].
pub const LINE_TERMINATOR: &[u8] = b"\r\n";

/// A codec for reassembling frame lines from raw serial bytes.
#[derive(Debug)]
pub struct LineCodec {
    /// Bytes of the line currently being received.
    buffer: BytesMut,
    /// Completed lines not yet handed out.
    ready: std::collections::VecDeque<String>,
    /// Maximum bytes kept per line; the remainder is discarded.
    max_line_length: usize,
    /// Whether the line in progress has already overflowed.
    overflowed: bool,
    /// Number of lines that were truncated.
    truncated_lines: u64,
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl LineCodec {
    /// Create a new line codec with the default line limit.
    pub fn new() -> Self {
        Self::with_max_line_length(MAX_LINE_LENGTH)
    }

    /// Create a line codec keeping at most `max_line_length` bytes per line.
    pub fn with_max_line_length(max_line_length: usize) -> Self {
        LineCodec {
            buffer: BytesMut::with_capacity(max_line_length),
            ready: std::collections::VecDeque::new(),
            max_line_length,
            overflowed: false,
            truncated_lines: 0,
        }
    }

    /// Add received data.
    pub fn push(&mut self, data: &[u8]) {
        for &byte in data {
            if byte == b'\r' || byte == b'\n' {
                self.complete_line();
                continue;
            }

            if self.buffer.len() < self.max_line_length {
                self.buffer.extend_from_slice(&[byte]);
            } else if !self.overflowed {
                self.overflowed = true;
                self.truncated_lines += 1;
                log::warn!(
                    "line exceeds {} bytes, discarding the remainder",
                    self.max_line_length
                );
            }
        }
    }

    fn complete_line(&mut self) {
        self.overflowed = false;
        if self.buffer.is_empty() {
            return;
        }
        let line_data = self.buffer.split();
        let line = String::from_utf8_lossy(&line_data).to_string();
        log::trace!("line received: {:?}", line);
        self.ready.push_back(line);
    }

    /// Take the next complete, non-empty line, if any.
    pub fn decode_line(&mut self) -> Option<String> {
        self.ready.pop_front()
    }

    /// Flush a trailing line that was never terminated (end of stream).
    pub fn finish(&mut self) -> Option<String> {
        self.complete_line();
        self.decode_line()
    }

    /// Encode a frame line for transmission, appending `\r\n`.
    pub fn encode_line(line: &str) -> Vec<u8> {
        let mut buf = Vec::with_capacity(line.len() + LINE_TERMINATOR.len());
        buf.extend_from_slice(line.as_bytes());
        buf.extend_from_slice(LINE_TERMINATOR);
        buf
    }

    /// Get the number of bytes in the line currently being received.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Get the number of lines that were cut at the length limit.
    pub fn truncated_lines(&self) -> u64 {
        self.truncated_lines
    }

    /// Clear all buffered state.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.ready.clear();
        self.overflowed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_line() {
        assert_eq!(LineCodec::encode_line("L,H"), b"L,H\r\n");
    }

    #[test]
    fn test_decode_lines() {
        let mut codec = LineCodec::new();
        codec.push(b"L,H\r\nM,2\r\n");

        assert_eq!(codec.decode_line(), Some("L,H".to_string()));
        assert_eq!(codec.decode_line(), Some("M,2".to_string()));
        assert!(codec.decode_line().is_none());
    }

    #[test]
    fn test_partial_line() {
        let mut codec = LineCodec::new();
        codec.push(b"M,");
        assert!(codec.decode_line().is_none());
        assert_eq!(codec.buffered_len(), 2);

        codec.push(b"-2\r");
        assert_eq!(codec.decode_line(), Some("M,-2".to_string()));
    }

    #[test]
    fn test_blank_lines_skipped() {
        let mut codec = LineCodec::new();
        codec.push(b"\r\n\r\n\nL,A\n\n");
        assert_eq!(codec.decode_line(), Some("L,A".to_string()));
        assert!(codec.decode_line().is_none());
    }

    #[test]
    fn test_overlong_line_truncated() {
        let mut codec = LineCodec::with_max_line_length(4);
        codec.push(b"L,Spacebar\r\nL,B\r\n");

        assert_eq!(codec.decode_line(), Some("L,Sp".to_string()));
        assert_eq!(codec.decode_line(), Some("L,B".to_string()));
        assert_eq!(codec.truncated_lines(), 1);
    }

    #[test]
    fn test_finish_flushes_unterminated_line() {
        let mut codec = LineCodec::new();
        codec.push(b"L,Z");
        assert!(codec.decode_line().is_none());
        assert_eq!(codec.finish(), Some("L,Z".to_string()));
        assert!(codec.finish().is_none());
    }
}
