use std::borrow::Cow;
use std::io;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// One physical line, terminator included, exactly as read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawLine {
    pub(crate) number: usize,
    bytes: Vec<u8>,
}

impl RawLine {
    pub(crate) fn new(number: usize, bytes: Vec<u8>) -> Self {
        Self { number, bytes }
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Line content without its `\n` / `\r\n` terminator.
    pub(crate) fn content(&self) -> &[u8] {
        let len = self.bytes.len() - self.terminator().len();
        &self.bytes[..len]
    }

    pub(crate) fn terminator(&self) -> &[u8] {
        if self.bytes.ends_with(b"\r\n") {
            b"\r\n"
        } else if self.bytes.ends_with(b"\n") {
            b"\n"
        } else {
            b""
        }
    }

    pub(crate) fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.content())
    }
}

/// Forward-only line reader that keeps terminators, so rewritten files stay
/// byte-identical outside the substituted lines.
pub(crate) struct LineReader<R> {
    inner: BufReader<R>,
    line_no: usize,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            inner: BufReader::new(inner),
            line_no: 0,
        }
    }

    pub(crate) async fn next_line(&mut self) -> io::Result<Option<RawLine>> {
        let mut buf = Vec::new();
        let read = self.inner.read_until(b'\n', &mut buf).await?;
        if read == 0 {
            return Ok(None);
        }
        self.line_no += 1;
        Ok(Some(RawLine::new(self.line_no, buf)))
    }
}
