//! Per-connection transport: line-oriented reads, dot-terminated reads,
//! and the handful of write primitives every handler needs (a bare
//! status line, a multi-line payload terminated by `.`).
//!
//! This is the engine's concrete stand-in for the abstract "Transport
//! contract" of spec §6.5: one [`Conn`] wraps a split async byte
//! stream for the lifetime of a session.

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, AsyncRead, BufReader, ReadHalf, WriteHalf};

pub struct Conn<S> {
    reader: BufReader<ReadHalf<S>>,
    writer: WriteHalf<S>,
}

impl<S> Conn<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        let (read_half, write_half) = tokio::io::split(stream);
        Self {
            reader: BufReader::new(read_half),
            writer: write_half,
        }
    }

    /// Read one CRLF-terminated line, with the terminator stripped.
    /// Returns `Ok(None)` on clean end-of-stream.
    pub async fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line).await?;
        if n == 0 {
            return Ok(None);
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(Some(line))
    }

    /// Read a dot-terminated article transmission (RFC 3977 §3.6):
    /// lines up to and excluding the lone `.` terminator, with
    /// dot-stuffing on each line undone, rejoined with CRLF so the
    /// result can be handed to [`crate::parse::parse_article`].
    pub async fn read_dot_terminated(&mut self) -> Result<String> {
        let mut body = String::new();
        loop {
            match self.read_line().await? {
                None => break,
                Some(line) if line == "." => break,
                Some(line) => {
                    body.push_str(crate::wire::unstuff_line(&line));
                    body.push_str("\r\n");
                }
            }
        }
        Ok(body)
    }

    /// Write a raw byte sequence verbatim.
    pub async fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_all(bytes).await?;
        Ok(())
    }

    /// Write a single status/payload line, appending CRLF.
    pub async fn write_line(&mut self, line: &str) -> Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\r\n").await?;
        Ok(())
    }

    /// Write the multi-line terminator `.\r\n`.
    pub async fn write_terminator(&mut self) -> Result<()> {
        self.writer.write_all(crate::responses::RESP_DOT_CRLF.as_bytes()).await?;
        Ok(())
    }

    /// Write a constant (already CRLF-terminated) response.
    pub async fn write_const(&mut self, resp: &str) -> Result<()> {
        self.writer.write_all(resp.as_bytes()).await?;
        Ok(())
    }

    /// Write one article body, dot-stuffing every line that needs it,
    /// followed by the terminator.
    pub async fn write_body_and_terminator(&mut self, body: &str) -> Result<()> {
        for line in body.lines() {
            self.write_line(&crate::wire::stuff_line(line)).await?;
        }
        self.write_terminator().await
    }

    pub async fn flush(&mut self) -> Result<()> {
        self.writer.flush().await?;
        Ok(())
    }
}
