//! Line framing on top of a byte stream.

use super::types::Reply;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::warn;

/// Outcome of reading one line from a peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    /// A complete line with the trailing `\n` / `\r\n` removed
    Line(String),
    /// End of stream, possibly after an unterminated partial line
    Closed,
    /// More than the allowed number of bytes arrived without a newline
    TooLong,
}

/// Reads one `\n`-terminated line of at most `max_len` bytes.
///
/// The limit applies to the line content; neither the `\n` nor the `\r` of a
/// `\r\n` terminator counts against it. Invalid UTF-8 is replaced rather
/// than rejected.
pub async fn read_line<R>(reader: &mut R, max_len: usize) -> io::Result<Incoming>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let limit = max_len as u64 + 2;
    let read = (&mut *reader).take(limit).read_until(b'\n', &mut buf).await?;
    if read == 0 {
        return Ok(Incoming::Closed);
    }

    if buf.last() != Some(&b'\n') {
        if buf.len() > max_len {
            return Ok(Incoming::TooLong);
        }
        return Ok(Incoming::Closed);
    }

    buf.pop();
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
    if buf.len() > max_len {
        return Ok(Incoming::TooLong);
    }
    Ok(Incoming::Line(String::from_utf8_lossy(&buf).into_owned()))
}

/// Writes one reply line and flushes it.
pub async fn write_reply<W>(writer: &mut W, reply: &Reply) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let line = format!("{reply}\n");
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await
}

/// Writes a reply, logging instead of returning a failure.
///
/// A dead peer is noticed by the next read, so the caller only needs to
/// know whether the write went through.
pub async fn send_best_effort<W>(writer: &mut W, reply: &Reply, client: &str) -> bool
where
    W: AsyncWrite + Unpin,
{
    match write_reply(writer, reply).await {
        Ok(()) => true,
        Err(e) => {
            warn!("Suppressed send failure to {}: {}", client, e);
            false
        }
    }
}
