//! Line framing for session connections.
//!
//! Inbound lines end with `\n`, optionally preceded by `\r`; both are stripped.
//! Each line, terminator included, is bounded by a byte limit so a peer cannot
//! grow the buffer without end.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::string::FromUtf8Error;

use thiserror::Error;

/// Failure to read one framed line.
#[derive(Debug, Error)]
pub enum LineError {
    /// The underlying stream failed.
    #[error("connection I/O failed: {0}")]
    Io(#[from] io::Error),
    /// The line grew past the configured limit before a terminator arrived.
    #[error("line exceeds {limit} bytes")]
    TooLong { limit: usize },
    /// The stream ended in the middle of a line.
    #[error("stream ended after {bytes} bytes of an unterminated line")]
    Unterminated { bytes: usize },
    /// The line was not valid UTF-8.
    #[error("line is not valid UTF-8: {0}")]
    InvalidUtf8(#[source] FromUtf8Error),
}

/// Buffered reader yielding one command line at a time.
///
/// Bytes read past the end of a line stay buffered for the next call, so a
/// peer may pipeline several lines in one write.
#[derive(Debug)]
pub struct LineReader<R> {
    inner: BufReader<R>,
    limit: usize,
}

impl<R: Read> LineReader<R> {
    /// Wraps `inner`, rejecting lines longer than `limit` bytes.
    pub fn new(inner: R, limit: usize) -> Self {
        Self {
            inner: BufReader::new(inner),
            limit,
        }
    }

    /// Maximum accepted line length, terminator included.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Reads the next line with its terminator stripped.
    ///
    /// Returns `Ok(None)` when the stream ends cleanly between lines.
    pub fn read_line(&mut self) -> Result<Option<String>, LineError> {
        let mut line = Vec::new();
        loop {
            let available = match self.inner.fill_buf() {
                Ok(available) => available,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) => return Err(LineError::Io(error)),
            };

            if available.is_empty() {
                return if line.is_empty() {
                    Ok(None)
                } else {
                    Err(LineError::Unterminated { bytes: line.len() })
                };
            }

            let newline = available.iter().position(|byte| *byte == b'\n');
            let taken = newline.map_or(available.len(), |position| position + 1);
            if line.len() + taken > self.limit {
                return Err(LineError::TooLong { limit: self.limit });
            }
            line.extend_from_slice(&available[..taken]);
            self.inner.consume(taken);

            if newline.is_some() {
                return decode(line).map(Some);
            }
        }
    }
}

fn decode(mut line: Vec<u8>) -> Result<String, LineError> {
    if line.last() == Some(&b'\n') {
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
    }
    String::from_utf8(line).map_err(LineError::InvalidUtf8)
}

/// Writer emitting one `\n`-terminated line per call.
#[derive(Debug)]
pub struct LineWriter<W> {
    inner: W,
}

impl<W: Write> LineWriter<W> {
    /// Wraps `inner`.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Writes `text` and a newline, then flushes.
    pub fn write_line(&mut self, text: &str) -> io::Result<()> {
        let mut frame = Vec::with_capacity(text.len() + 1);
        frame.extend_from_slice(text.as_bytes());
        frame.push(b'\n');
        self.inner.write_all(&frame)?;
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use rstest::rstest;

    use super::*;

    fn reader(bytes: &[u8], limit: usize) -> LineReader<Cursor<Vec<u8>>> {
        LineReader::new(Cursor::new(bytes.to_vec()), limit)
    }

    #[rstest]
    #[case(b"ping\n", "ping")]
    #[case(b"ping\r\n", "ping")]
    #[case(b"\n", "")]
    #[case(b"  padded \n", "  padded ")]
    #[case(b"a\rb\n", "a\rb")]
    fn strips_only_the_terminator(#[case] input: &[u8], #[case] expected: &str) {
        let mut lines = reader(input, 64);
        assert_eq!(lines.read_line().expect("line").as_deref(), Some(expected));
    }

    #[test]
    fn keeps_pipelined_lines_buffered() {
        let mut lines = reader(b"first\nsecond\n", 64);
        assert_eq!(lines.read_line().expect("first").as_deref(), Some("first"));
        assert_eq!(lines.read_line().expect("second").as_deref(), Some("second"));
        assert!(lines.read_line().expect("eof").is_none());
    }

    #[test]
    fn reports_unterminated_trailing_fragment() {
        let mut lines = reader(b"done\npartial", 64);
        lines.read_line().expect("complete line");
        let error = lines.read_line().expect_err("fragment");
        assert!(matches!(error, LineError::Unterminated { bytes: 7 }));
    }

    #[rstest]
    #[case(b"12345678\n", 8)]
    #[case(b"123456789", 8)]
    fn rejects_lines_over_the_limit(#[case] input: &[u8], #[case] limit: usize) {
        let error = reader(input, limit).read_line().expect_err("too long");
        assert!(matches!(error, LineError::TooLong { limit: 8 }));
    }

    #[test]
    fn accepts_lines_exactly_at_the_limit() {
        let mut lines = reader(b"1234567\n", 8);
        assert_eq!(lines.read_line().expect("line").as_deref(), Some("1234567"));
    }

    #[test]
    fn rejects_invalid_utf8() {
        let error = reader(b"\xff\xfe\n", 64).read_line().expect_err("utf8");
        assert!(matches!(error, LineError::InvalidUtf8(_)));
    }

    #[test]
    fn writer_terminates_and_flushes_each_line() {
        let mut writer = LineWriter::new(Vec::new());
        writer.write_line("pong").expect("write");
        writer.write_line("").expect("write empty");
        assert_eq!(writer.inner, b"pong\n\n");
    }
}
