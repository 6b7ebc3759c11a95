//! Line-by-line reading of a demultiplexed log stream.

use lumber_core::{Error, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Maximum supported length of a single log line in bytes.
pub const MAX_LINE_LEN: usize = 256 * 1024;

/// Produces complete log lines from a byte stream.
///
/// Lines are returned without their trailing line feed (and without a
/// carriage return preceding it). A line longer than [`MAX_LINE_LEN`]
/// is a fatal stream error rather than being silently truncated.
pub struct LineReader<R> {
    inner: BufReader<R>,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    /// Wrap a byte stream.
    pub fn new(inner: R) -> Self {
        Self {
            inner: BufReader::new(inner),
        }
    }

    /// Read the next complete line.
    ///
    /// Returns `Ok(None)` on clean end-of-stream. A final unterminated
    /// line is still produced. Invalid UTF-8 is replaced, never an
    /// error.
    pub async fn next_line(&mut self) -> Result<Option<String>> {
        let mut line: Vec<u8> = Vec::new();
        loop {
            let (found, used) = {
                let available = self.inner.fill_buf().await?;
                if available.is_empty() {
                    if line.is_empty() {
                        return Ok(None);
                    }
                    break;
                }
                match available.iter().position(|&b| b == b'\n') {
                    Some(pos) => {
                        line.extend_from_slice(&available[..pos]);
                        (true, pos + 1)
                    }
                    None => {
                        line.extend_from_slice(available);
                        (false, available.len())
                    }
                }
            };
            self.inner.consume(used);
            if line.len() > MAX_LINE_LEN {
                return Err(Error::LineTooLong {
                    limit: MAX_LINE_LEN,
                });
            }
            if found {
                break;
            }
        }
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Ok(Some(String::from_utf8_lossy(&line).into_owned()))
    }
}
