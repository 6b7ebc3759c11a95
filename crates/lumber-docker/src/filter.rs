//! Strips the Docker stream-multiplexing headers out of a raw log stream.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, ReadBuf};

/// Size of the out-of-band header Docker interleaves into a combined
/// stdout/stderr log stream.
///
/// See <https://docs.docker.com/engine/api/v1.26/#tag/Container/operation/ContainerAttach>.
pub const LINE_HEADER_SIZE: usize = 8;

/// `AsyncRead` adapter that removes the 8-byte frame headers from a raw
/// attached-log stream, passing the log text through unchanged.
///
/// The stream starts with one header, and another follows every line
/// feed in the raw bytes. This assumes every frame boundary coincides
/// with a line boundary, which holds only while the writer flushes at
/// newlines; a frame carrying an embedded newline would lose 8 bytes of
/// text. Kept as-is because the wire format produced by `docker logs`
/// satisfies the assumption in practice.
pub struct LogFilter<R> {
    inner: R,
    data: Vec<u8>,
    /// Bytes still to drop from the front of the next upstream chunk,
    /// carrying a header excision across reads.
    skip: usize,
    /// Offset up to which `data` has already been scanned for headers.
    scanned: usize,
    inner_eof: bool,
}

impl<R> LogFilter<R> {
    /// Wrap a raw log stream. The leading header is skipped immediately.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            data: Vec::new(),
            skip: LINE_HEADER_SIZE,
            scanned: 0,
            inner_eof: false,
        }
    }

    /// Absorb one chunk of raw bytes: honor a pending skip, then excise
    /// the header following every newly visible line feed.
    fn ingest(&mut self, mut chunk: &[u8]) {
        if self.skip > 0 {
            let n = self.skip.min(chunk.len());
            chunk = &chunk[n..];
            self.skip -= n;
        }
        self.data.extend_from_slice(chunk);

        let mut i = self.scanned;
        while i < self.data.len() {
            if self.data[i] == b'\n' {
                let start = i + 1;
                let end = (start + LINE_HEADER_SIZE).min(self.data.len());
                self.data.drain(start..end);
                // remainder of a header that has not arrived yet
                self.skip = LINE_HEADER_SIZE - (end - start);
            }
            i += 1;
        }
        self.scanned = self.data.len();
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for LogFilter<R> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let me = &mut *self;

        // Keep pulling until some text survives the header stripping;
        // a chunk can be swallowed whole by a pending skip.
        while me.data.is_empty() && !me.inner_eof {
            let mut tmp = [0u8; 4096];
            let want = buf.remaining().min(tmp.len()).max(1);
            let mut tmp_buf = ReadBuf::new(&mut tmp[..want]);
            match Pin::new(&mut me.inner).poll_read(cx, &mut tmp_buf) {
                Poll::Ready(Ok(())) => {
                    let filled = tmp_buf.filled();
                    if filled.is_empty() {
                        me.inner_eof = true;
                    } else {
                        me.ingest(filled);
                    }
                }
                Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
                Poll::Pending => return Poll::Pending,
            }
        }

        if me.data.is_empty() {
            // upstream ended and nothing buffered
            return Poll::Ready(Ok(()));
        }

        let n = buf.remaining().min(me.data.len());
        buf.put_slice(&me.data[..n]);
        me.data.drain(..n);
        me.scanned -= n;
        Poll::Ready(Ok(()))
    }
}
