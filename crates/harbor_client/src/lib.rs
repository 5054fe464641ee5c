//! Client side of the harbor line protocol.
//!
//! [`HarborClient::connect`] performs the naming handshake and
//! [`HarborClient::request`] sends one command and reads its complete reply.
//! The reader knows which command it sent, so file transfers are read as an
//! exact number of raw bytes instead of waiting for the line to go quiet.

use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::{debug, info};

/// Errors surfaced by the client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("server went quiet for {0:?} in the middle of a reply")]
    Timeout(Duration),
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Outcome of connecting to the server.
#[derive(Debug)]
pub enum Connection {
    /// Handshake completed; the client is ready for commands.
    Ready(HarborClient),
    /// The server is full. Holds the full `BUSY ...` line.
    Busy(String),
}

/// A complete reply to one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// One or more text lines, in the order received.
    Lines(Vec<String>),
    /// A file was received and written to `path`.
    Saved { path: PathBuf, size: u64 },
    /// The server closed the connection before replying.
    Closed,
}

/// What kind of reply a command line produces.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Expect {
    File(String),
    Status,
    Line,
}

impl Expect {
    // Mirrors the server's command parsing: trimmed, verb is case-insensitive.
    fn for_line(line: &str) -> Self {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };
        match verb.to_ascii_lowercase().as_str() {
            "get" if !rest.is_empty() => Expect::File(rest.to_string()),
            "status" if rest.is_empty() => Expect::Status,
            _ => Expect::Line,
        }
    }
}

/// Connected, named client session.
#[derive(Debug)]
pub struct HarborClient {
    name: String,
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    download_dir: PathBuf,
    idle_timeout: Duration,
}

impl HarborClient {
    /// Connects to `addr` and completes the naming handshake.
    ///
    /// `idle_timeout` bounds every individual read, including the greeting.
    pub async fn connect(
        addr: &str,
        download_dir: impl Into<PathBuf>,
        idle_timeout: Duration,
    ) -> Result<Connection, ClientError> {
        let stream = TcpStream::connect(addr).await?;
        let (read_half, writer) = stream.into_split();
        let mut client = Self {
            name: String::new(),
            reader: BufReader::new(read_half),
            writer,
            download_dir: download_dir.into(),
            idle_timeout,
        };

        let greeting = client
            .read_line()
            .await?
            .ok_or_else(|| ClientError::Protocol("connection closed before greeting".into()))?;

        if greeting.starts_with("BUSY") {
            return Ok(Connection::Busy(greeting));
        }
        let name = greeting
            .strip_prefix("NAME ")
            .ok_or_else(|| ClientError::Protocol(format!("unexpected greeting: {greeting}")))?
            .to_string();

        // Echo the greeting back as the acknowledgement
        client.send_line(&greeting).await?;
        info!("🤝 Connected to {} as {}", addr, name);
        client.name = name;
        Ok(Connection::Ready(client))
    }

    /// Name the server assigned to this session.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directory downloaded files are written to.
    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Sends one command line and reads its complete reply.
    pub async fn request(&mut self, line: &str) -> Result<Response, ClientError> {
        self.send_line(line).await?;
        match Expect::for_line(line) {
            Expect::File(filename) => self.read_file(&filename).await,
            Expect::Status => self.read_status().await,
            Expect::Line => Ok(match self.read_line().await? {
                Some(reply) => Response::Lines(vec![reply]),
                None => Response::Closed,
            }),
        }
    }

    async fn send_line(&mut self, line: &str) -> Result<(), ClientError> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Reads one line without its terminator. `None` means the server closed.
    async fn read_line(&mut self) -> Result<Option<String>, ClientError> {
        let mut buf = Vec::new();
        let read = tokio::time::timeout(self.idle_timeout, self.reader.read_until(b'\n', &mut buf))
            .await
            .map_err(|_| ClientError::Timeout(self.idle_timeout))??;
        if read == 0 {
            return Ok(None);
        }
        while matches!(buf.last(), Some(b'\n' | b'\r')) {
            buf.pop();
        }
        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }

    async fn read_status(&mut self) -> Result<Response, ClientError> {
        let mut lines = Vec::new();
        loop {
            match self.read_line().await? {
                Some(line) => {
                    // An empty registry answers with one unframed line
                    let done = line == "STATUS-END" || (lines.is_empty() && line != "STATUS-BEGIN");
                    lines.push(line);
                    if done {
                        return Ok(Response::Lines(lines));
                    }
                }
                None if lines.is_empty() => return Ok(Response::Closed),
                None => {
                    return Err(ClientError::Protocol(
                        "connection closed inside status report".into(),
                    ))
                }
            }
        }
    }

    async fn read_file(&mut self, requested: &str) -> Result<Response, ClientError> {
        let header = match self.read_line().await? {
            Some(header) => header,
            None => return Ok(Response::Closed),
        };
        let size: u64 = match header.strip_prefix("FILESIZE ") {
            Some(size) => size
                .trim()
                .parse()
                .map_err(|_| ClientError::Protocol(format!("bad size header: {header}")))?,
            None => return Ok(Response::Lines(vec![header])),
        };

        let path = self.download_path(requested);
        tokio::fs::create_dir_all(&self.download_dir).await?;
        // Only a complete transfer replaces `path`
        let mut partial = path.clone().into_os_string();
        partial.push(".part");
        let partial = PathBuf::from(partial);

        if let Err(e) = self.receive_payload(&partial, size).await {
            if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
                debug!("Could not remove {}: {}", partial.display(), cleanup);
            }
            return Err(e);
        }
        tokio::fs::rename(&partial, &path).await?;

        debug!("Saved {} bytes to {}", size, path.display());
        Ok(Response::Saved { path, size })
    }

    /// Copies exactly `size` payload bytes into `target`, then expects `FILEEND`.
    async fn receive_payload(&mut self, target: &Path, size: u64) -> Result<(), ClientError> {
        let mut file = tokio::fs::File::create(target).await?;

        let mut remaining = size;
        let mut chunk = vec![0u8; 8192];
        while remaining > 0 {
            let want = remaining.min(chunk.len() as u64) as usize;
            let read = tokio::time::timeout(self.idle_timeout, self.reader.read(&mut chunk[..want]))
                .await
                .map_err(|_| ClientError::Timeout(self.idle_timeout))??;
            if read == 0 {
                return Err(ClientError::Protocol(format!(
                    "connection closed with {remaining} of {size} bytes outstanding"
                )));
            }
            file.write_all(&chunk[..read]).await?;
            remaining -= read as u64;
        }
        file.flush().await?;

        match self.read_line().await? {
            Some(trailer) if trailer == "FILEEND" => Ok(()),
            other => Err(ClientError::Protocol(format!(
                "expected FILEEND after payload, got {other:?}"
            ))),
        }
    }

    /// Downloads land under the requested file's base name only.
    fn download_path(&self, requested: &str) -> PathBuf {
        let base = Path::new(requested)
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| "download".into());
        self.download_dir.join(base)
    }
}
