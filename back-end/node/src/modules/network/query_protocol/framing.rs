//! Self-delimiting JSON framing.
//!
//! A message is exactly one JSON value with no length prefix. The reader
//! accumulates bytes until one complete value parses, so it never depends on
//! the remote closing its write half. Bracket depth is tracked incrementally
//! and the buffer is parsed only when the outermost value has closed.

use futures::{AsyncRead, AsyncReadExt};
use serde::de::IgnoredAny;
use std::io;
use tracing::trace;

const READ_CHUNK: usize = 8 * 1024;

/// Result of reading one frame.
#[derive(Debug, PartialEq)]
pub enum Frame {
    /// Exactly the bytes of one JSON value; trailing bytes are discarded.
    Complete(Vec<u8>),
    /// The bytes can never become a valid JSON value.
    Malformed { reason: String },
}

enum Parse {
    Complete(usize),
    Incomplete,
    Invalid(String),
}

fn try_parse(buf: &[u8]) -> Parse {
    let mut values = serde_json::Deserializer::from_slice(buf).into_iter::<IgnoredAny>();
    match values.next() {
        None => Parse::Incomplete,
        Some(Ok(_)) => Parse::Complete(values.byte_offset()),
        Some(Err(e)) if e.is_eof() => Parse::Incomplete,
        Some(Err(e)) => Parse::Invalid(e.to_string()),
    }
}

/// Tracks nesting across reads so the buffer is only parsed once the
/// outermost value can have ended.
#[derive(Debug, Default)]
struct Scanner {
    scanned: usize,
    depth: usize,
    started: bool,
    in_string: bool,
    escaped: bool,
    /// Top-level scalars and stray closers have no closing bracket to wait for.
    always_parse: bool,
}

impl Scanner {
    /// Scan bytes appended since the last call. True when a parse is worth trying.
    fn advance(&mut self, buf: &[u8]) -> bool {
        if self.always_parse {
            self.scanned = buf.len();
            return true;
        }

        while self.scanned < buf.len() {
            let byte = buf[self.scanned];
            self.scanned += 1;

            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if byte == b'\\' {
                    self.escaped = true;
                } else if byte == b'"' {
                    self.in_string = false;
                    if self.depth == 0 {
                        return self.value_closed();
                    }
                }
                continue;
            }

            match byte {
                b'"' => {
                    self.started = true;
                    self.in_string = true;
                }
                b'{' | b'[' => {
                    self.started = true;
                    self.depth += 1;
                }
                b'}' | b']' if self.depth <= 1 => {
                    self.depth = 0;
                    return self.value_closed();
                }
                b'}' | b']' => self.depth -= 1,
                b if b.is_ascii_whitespace() => {}
                _ if !self.started => {
                    self.always_parse = true;
                    return true;
                }
                _ => {}
            }
        }
        false
    }

    fn value_closed(&mut self) -> bool {
        self.always_parse = true;
        true
    }
}

/// Read one JSON value from `io`, bounded by `max_size` bytes.
///
/// Returns `UnexpectedEof` only when the stream ends before any non-whitespace byte.
pub async fn read_json_value<T>(io: &mut T, max_size: usize) -> io::Result<Frame>
where
    T: AsyncRead + Unpin + Send,
{
    let mut buf = Vec::new();
    let mut chunk = vec![0u8; READ_CHUNK];
    let mut scanner = Scanner::default();

    loop {
        let n = io.read(&mut chunk).await?;

        if n == 0 {
            if buf.iter().all(u8::is_ascii_whitespace) {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "stream closed before a message was received",
                ));
            }
            return Ok(match try_parse(&buf) {
                Parse::Complete(end) => {
                    buf.truncate(end);
                    Frame::Complete(buf)
                }
                Parse::Incomplete => Frame::Malformed {
                    reason: "stream closed mid-message".to_string(),
                },
                Parse::Invalid(reason) => Frame::Malformed { reason },
            });
        }

        buf.extend_from_slice(&chunk[..n]);
        trace!(read = n, buffered = buf.len(), "Read query frame chunk");

        if scanner.advance(&buf) {
            match try_parse(&buf) {
                Parse::Complete(end) => {
                    buf.truncate(end);
                    return Ok(Frame::Complete(buf));
                }
                Parse::Invalid(reason) => return Ok(Frame::Malformed { reason }),
                Parse::Incomplete => {}
            }
        }

        if buf.len() >= max_size {
            return Ok(Frame::Malformed {
                reason: format!("message exceeds {max_size} bytes"),
            });
        }
    }
}
