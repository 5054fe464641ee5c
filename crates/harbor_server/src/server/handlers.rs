//! Connection handling logic for admitted clients.
//!
//! This module contains the per-connection protocol state machine:
//! handshake, command loop and teardown.

use crate::{
    connection::ClientRegistry,
    messaging::{read_line, route_command, send_best_effort, Command, Flow, Incoming, Reply},
    repository::Repository,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::TcpStream;
use tracing::{debug, error, info, warn};

/// Prefix a client must echo to complete the handshake.
pub const HANDSHAKE_PREFIX: &str = "NAME ";

/// State shared by every session of one server.
#[derive(Debug)]
pub struct SessionContext {
    /// Registry of all admitted clients
    pub registry: Arc<ClientRegistry>,
    /// Repository served by `list` and `get`
    pub repository: Arc<Repository>,
    /// Chunk size for file streaming
    pub buffer_size: usize,
    /// Longest accepted command line
    pub max_line_length: usize,
}

/// Why a session reached the closed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The client sent `exit` and received `BYE`
    Exit,
    /// End of stream or a read error
    PeerClosed,
    /// The handshake acknowledgement was missing or malformed
    HandshakeRejected,
    /// A command line exceeded the configured limit
    LineTooLong,
    /// A file transfer failed part way
    TransferAborted,
}

/// Handles a single admitted connection from handshake to teardown.
///
/// The client must already be registered under `name`. Whatever way the
/// session ends, including a panic inside the protocol loop, the record's
/// `finished_at` is set and the socket is closed before this returns.
///
/// # Connection Flow
///
/// 1. Send `NAME <name>` and wait for a `NAME ...` acknowledgement
/// 2. Read and dispatch commands until `exit`, disconnect or failure
/// 3. Mark the registry record finished
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    name: String,
    context: Arc<SessionContext>,
) {
    let session = {
        let name = name.clone();
        let context = context.clone();
        tokio::spawn(async move {
            let (read_half, write_half) = stream.into_split();
            let mut reader = BufReader::new(read_half);
            let mut writer = BufWriter::new(write_half);
            let end = run_session(&mut reader, &mut writer, &name, &context).await;
            if let Err(e) = writer.shutdown().await {
                debug!("Closing connection for {} failed: {}", name, e);
            }
            end
        })
    };

    match session.await {
        Ok(end) => info!("👋 {} ({}) session closed: {:?}", name, addr, end),
        Err(e) => error!("Session task for {} ({}) failed: {}", name, addr, e),
    }

    context.registry.mark_finished(&name).await;
}

/// Runs the protocol over an already split connection.
///
/// Does not touch the registry record's lifecycle; the caller owns teardown.
pub async fn run_session<R, W>(
    reader: &mut R,
    writer: &mut W,
    name: &str,
    context: &SessionContext,
) -> SessionEnd
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    // HANDSHAKE
    send_best_effort(writer, &Reply::Name(name.to_string()), name).await;
    let acknowledged = match read_line(reader, context.max_line_length).await {
        Ok(Incoming::Line(line)) => line.starts_with(HANDSHAKE_PREFIX),
        Ok(_) => false,
        Err(e) => {
            debug!("Handshake read for {} failed: {}", name, e);
            false
        }
    };
    if !acknowledged {
        warn!("🚫 {} failed the handshake", name);
        send_best_effort(writer, &Reply::Error("Expected: NAME <your_name>".to_string()), name)
            .await;
        return SessionEnd::HandshakeRejected;
    }
    debug!("🤝 {} completed the handshake", name);

    // COMMAND_LOOP
    loop {
        let line = match read_line(reader, context.max_line_length).await {
            Ok(Incoming::Line(line)) => line,
            Ok(Incoming::Closed) => return SessionEnd::PeerClosed,
            Ok(Incoming::TooLong) => {
                warn!("{} sent a line over {} bytes", name, context.max_line_length);
                send_best_effort(writer, &Reply::Error("Line too long".to_string()), name).await;
                return SessionEnd::LineTooLong;
            }
            Err(e) => {
                debug!("Read from {} failed: {}", name, e);
                return SessionEnd::PeerClosed;
            }
        };

        let Some(command) = Command::parse(&line) else {
            continue;
        };

        match route_command(command, name, context, writer).await {
            Flow::Continue => {}
            Flow::Exit => return SessionEnd::Exit,
            Flow::Abort => return SessionEnd::TransferAborted,
        }
    }
}
