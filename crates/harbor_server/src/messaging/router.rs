//! Command dispatch for an established session.
//!
//! Each parsed command is executed against the shared registry and the
//! repository, and its reply lines are written to the session's writer.

use crate::{
    connection::{render_status, NO_CLIENTS_LINE},
    messaging::{wire::send_best_effort, Command, Reply},
    repository::StreamOutcome,
    server::handlers::SessionContext,
};
use tokio::io::AsyncWrite;
use tracing::{debug, error, trace};

/// What the session loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Read the next command
    Continue,
    /// The client asked to leave; `BYE` has been sent
    Exit,
    /// A file transfer failed part way; the connection is unusable
    Abort,
}

/// Executes one command and writes its replies.
///
/// # Arguments
///
/// * `command` - The parsed command
/// * `client` - Name of the session's client, used for logging
/// * `context` - Shared server state
/// * `writer` - The session's outgoing stream
///
/// Send failures are logged and otherwise ignored; the following read will
/// observe the disconnect. Only a broken file transfer ends the session here.
pub async fn route_command<W>(
    command: Command,
    client: &str,
    context: &SessionContext,
    writer: &mut W,
) -> Flow
where
    W: AsyncWrite + Unpin,
{
    trace!("{} -> {:?}", client, command);

    match command {
        Command::Exit => {
            send_best_effort(writer, &Reply::Bye, client).await;
            Flow::Exit
        }
        Command::List => {
            let reply = match context.repository.list().await {
                Ok(files) => Reply::Files(files),
                Err(e) => {
                    error!("Listing {} failed: {}", context.repository.root().display(), e);
                    Reply::Error("Repository unavailable".to_string())
                }
            };
            send_best_effort(writer, &reply, client).await;
            Flow::Continue
        }
        Command::GetUsage => {
            send_best_effort(writer, &Reply::Error("Usage: get <filename>".to_string()), client)
                .await;
            Flow::Continue
        }
        Command::Get(filename) => {
            match context
                .repository
                .stream(&filename, writer, context.buffer_size)
                .await
            {
                Ok(StreamOutcome::Sent(size)) => {
                    debug!("📤 {} downloaded {} ({} bytes)", client, filename, size);
                    Flow::Continue
                }
                Ok(StreamOutcome::NotFound) => {
                    debug!("{} requested unavailable file {:?}", client, filename);
                    Flow::Continue
                }
                Err(e) => {
                    debug!("Transfer of {:?} to {} aborted: {}", filename, client, e);
                    Flow::Abort
                }
            }
        }
        Command::Status => {
            let records = context.registry.snapshot().await;
            if records.is_empty() {
                // No table to frame
                send_best_effort(writer, &Reply::StatusLine(NO_CLIENTS_LINE.to_string()), client)
                    .await;
                return Flow::Continue;
            }
            send_best_effort(writer, &Reply::StatusBegin, client).await;
            for row in render_status(&records) {
                send_best_effort(writer, &Reply::StatusLine(row), client).await;
            }
            send_best_effort(writer, &Reply::StatusEnd, client).await;
            Flow::Continue
        }
        Command::Message(text) => {
            send_best_effort(writer, &Reply::Ack(text), client).await;
            Flow::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{connection::ClientRegistry, repository::Repository};
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn context() -> (TempDir, SessionContext) {
        let dir = TempDir::new().unwrap();
        let context = SessionContext {
            registry: Arc::new(ClientRegistry::new()),
            repository: Arc::new(Repository::open(dir.path()).await.unwrap()),
            buffer_size: 16,
            max_line_length: 128,
        };
        (dir, context)
    }

    async fn route(command: Command, context: &SessionContext) -> (Flow, String) {
        let mut out = Vec::new();
        let flow = route_command(command, "Client01", context, &mut out).await;
        (flow, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn test_status_without_clients_is_a_single_line() {
        let (_dir, context) = context().await;
        let (flow, output) = route(Command::Status, &context).await;
        assert_eq!(flow, Flow::Continue);
        assert_eq!(output, format!("{NO_CLIENTS_LINE}\n"));
    }

    #[tokio::test]
    async fn test_status_frames_rows_in_registration_order() {
        let (_dir, context) = context().await;
        context.registry.register("Client01", "10.0.0.1:5000".parse().unwrap()).await;
        context.registry.register("Client02", "10.0.0.2:5000".parse().unwrap()).await;
        context.registry.mark_finished("Client01").await;

        let (_, output) = route(Command::Status, &context).await;
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "STATUS-BEGIN");
        assert!(lines[1].starts_with("Client01"));
        assert!(!lines[1].ends_with('-'));
        assert!(lines[2].starts_with("Client02"));
        assert!(lines[2].ends_with('-'));
        assert_eq!(lines[3], "STATUS-END");
    }

    #[tokio::test]
    async fn test_exit_and_message_replies() {
        let (_dir, context) = context().await;
        assert_eq!(
            route(Command::Message("hi there".into()), &context).await,
            (Flow::Continue, "hi there ACK\n".to_string())
        );
        assert_eq!(
            route(Command::Exit, &context).await,
            (Flow::Exit, "BYE\n".to_string())
        );
    }

    #[tokio::test]
    async fn test_get_replies() {
        let (dir, context) = context().await;
        std::fs::write(dir.path().join("notes.txt"), b"0123456789abcdefXYZ").unwrap();

        let (flow, output) = route(Command::Get("notes.txt".into()), &context).await;
        assert_eq!(flow, Flow::Continue);
        assert_eq!(output, "FILESIZE 19\n0123456789abcdefXYZFILEEND\n");

        let (_, output) = route(Command::Get("../notes.txt".into()), &context).await;
        assert_eq!(output, "ERROR File not found\n");

        let (_, output) = route(Command::GetUsage, &context).await;
        assert_eq!(output, "ERROR Usage: get <filename>\n");
    }
}
