//! Repository access and file streaming.
//!
//! The repository is a single flat directory. Entries are discovered by
//! listing on every request, so files added or removed by other processes
//! show up on the next `list`.

use crate::error::ServerError;
use crate::messaging::{wire::write_reply, Reply};
use std::io;
use std::path::{Component, Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

/// Message sent for missing files and for names that escape the root.
pub const NOT_FOUND_MESSAGE: &str = "File not found";

/// Result of a `get` request that did not fail on I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    /// `ERROR File not found` was sent
    NotFound,
    /// The framed file was sent; carries the payload size
    Sent(u64),
}

/// Lists and streams files from a fixed root directory.
#[derive(Debug, Clone)]
pub struct Repository {
    /// Canonical path of the repository root
    root: PathBuf,
}

impl Repository {
    /// Opens the repository at `root`, creating the directory if needed.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self, ServerError> {
        let root = root.as_ref();
        tokio::fs::create_dir_all(root).await.map_err(|e| {
            ServerError::Repository(format!("cannot create {}: {e}", root.display()))
        })?;
        let root = tokio::fs::canonicalize(root).await.map_err(|e| {
            ServerError::Repository(format!("cannot resolve {}: {e}", root.display()))
        })?;
        info!("📂 Repository root: {}", root.display());
        Ok(Self { root })
    }

    /// The canonical repository root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the sorted base names of regular files directly under the root.
    pub async fn list(&self) -> io::Result<Vec<String>> {
        tokio::fs::create_dir_all(&self.root).await?;

        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            // Follows symlinks, like the `get` path does.
            let is_file = tokio::fs::metadata(entry.path())
                .await
                .map(|meta| meta.is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => debug!("Skipping non UTF-8 file name {:?}", raw),
            }
        }
        names.sort();
        Ok(names)
    }

    /// Maps a requested name to a regular file inside the root.
    ///
    /// Anything that is not a single plain path component, that resolves
    /// (through `..` or symlinks) outside the root, or that is not a regular
    /// file yields `None`.
    pub async fn resolve(&self, filename: &str) -> Option<PathBuf> {
        let requested = Path::new(filename);
        let mut components = requested.components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => {}
            _ => {
                debug!("Rejecting non base-name request {:?}", filename);
                return None;
            }
        }

        let candidate = tokio::fs::canonicalize(self.root.join(requested)).await.ok()?;
        if !candidate.starts_with(&self.root) {
            warn!("Request {:?} resolves outside the repository", filename);
            return None;
        }

        let meta = tokio::fs::metadata(&candidate).await.ok()?;
        meta.is_file().then_some(candidate)
    }

    /// Sends a framed file: `FILESIZE <n>`, exactly `n` bytes, `FILEEND`.
    ///
    /// Unknown or escaping names produce `ERROR File not found`. Write
    /// errors are returned as-is; a transfer is never retried or resumed.
    pub async fn stream<W>(
        &self,
        filename: &str,
        writer: &mut W,
        chunk_size: usize,
    ) -> io::Result<StreamOutcome>
    where
        W: AsyncWrite + Unpin,
    {
        let Some(path) = self.resolve(filename).await else {
            write_reply(writer, &Reply::Error(NOT_FOUND_MESSAGE.to_string())).await?;
            return Ok(StreamOutcome::NotFound);
        };

        let file = match File::open(&path).await {
            Ok(file) => file,
            Err(e) => {
                debug!("Cannot open {}: {}", path.display(), e);
                write_reply(writer, &Reply::Error(NOT_FOUND_MESSAGE.to_string())).await?;
                return Ok(StreamOutcome::NotFound);
            }
        };
        let size = file.metadata().await?.len();

        write_reply(writer, &Reply::FileSize(size)).await?;

        let mut body = file.take(size);
        let mut chunk = vec![0u8; chunk_size.max(1)];
        let mut sent = 0u64;
        loop {
            let read = body.read(&mut chunk).await?;
            if read == 0 {
                break;
            }
            writer.write_all(&chunk[..read]).await?;
            sent += read as u64;
        }

        if sent < size {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("{} shrank during transfer ({sent} of {size} bytes)", path.display()),
            ));
        }

        write_reply(writer, &Reply::FileEnd).await?;
        debug!("Sent {} ({} bytes)", filename, size);
        Ok(StreamOutcome::Sent(size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn repository_with(files: &[(&str, &[u8])]) -> (TempDir, Repository) {
        let dir = TempDir::new().unwrap();
        for (name, contents) in files {
            std::fs::write(dir.path().join(name), contents).unwrap();
        }
        let repository = Repository::open(dir.path()).await.unwrap();
        (dir, repository)
    }

    #[tokio::test]
    async fn test_open_creates_missing_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("server_repo");
        assert!(!root.exists());

        let repository = Repository::open(&root).await.unwrap();
        assert!(root.is_dir());
        assert_eq!(repository.list().await.unwrap(), Vec::<String>::new());
    }

    #[tokio::test]
    async fn test_list_sorted_regular_files_only() {
        let (dir, repository) = repository_with(&[("b.txt", b"b"), ("a.txt", b"a")]).await;
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("hidden.txt"), b"x").unwrap();

        assert_eq!(repository.list().await.unwrap(), vec!["a.txt", "b.txt"]);
    }

    #[tokio::test]
    async fn test_list_sees_external_changes() {
        let (dir, repository) = repository_with(&[("a.txt", b"a")]).await;
        assert_eq!(repository.list().await.unwrap(), vec!["a.txt"]);

        std::fs::write(dir.path().join("c.txt"), b"c").unwrap();
        std::fs::remove_file(dir.path().join("a.txt")).unwrap();
        assert_eq!(repository.list().await.unwrap(), vec!["c.txt"]);
    }

    #[tokio::test]
    async fn test_resolve_rejects_escapes() {
        let outer = TempDir::new().unwrap();
        std::fs::write(outer.path().join("secret.txt"), b"secret").unwrap();
        let root = outer.path().join("repo");
        let repository = Repository::open(&root).await.unwrap();
        std::fs::write(root.join("ok.txt"), b"ok").unwrap();

        assert!(repository.resolve("ok.txt").await.is_some());
        assert!(repository.resolve("../secret.txt").await.is_none());
        assert!(repository.resolve("../../etc/passwd").await.is_none());
        assert!(repository.resolve("/etc/passwd").await.is_none());
        assert!(repository.resolve("..").await.is_none());
        assert!(repository.resolve(".").await.is_none());
        assert!(repository.resolve("").await.is_none());
        assert!(repository.resolve("missing.txt").await.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_resolve_rejects_symlink_out_of_root() {
        let outer = TempDir::new().unwrap();
        std::fs::write(outer.path().join("secret.txt"), b"secret").unwrap();
        let root = outer.path().join("repo");
        let repository = Repository::open(&root).await.unwrap();
        std::os::unix::fs::symlink(outer.path().join("secret.txt"), root.join("link.txt")).unwrap();

        assert!(repository.resolve("link.txt").await.is_none());
    }

    #[tokio::test]
    async fn test_stream_frames_exact_bytes() {
        let payload: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let (_dir, repository) = repository_with(&[("present.bin", &payload)]).await;

        let mut out = Vec::new();
        let outcome = repository.stream("present.bin", &mut out, 4096).await.unwrap();
        assert_eq!(outcome, StreamOutcome::Sent(10_000));

        let header = b"FILESIZE 10000\n";
        assert!(out.starts_with(header));
        assert_eq!(&out[header.len()..header.len() + payload.len()], payload.as_slice());
        assert_eq!(&out[header.len() + payload.len()..], b"FILEEND\n");
    }

    #[tokio::test]
    async fn test_stream_empty_file() {
        let (_dir, repository) = repository_with(&[("empty.txt", b"")]).await;
        let mut out = Vec::new();
        let outcome = repository.stream("empty.txt", &mut out, 16).await.unwrap();
        assert_eq!(outcome, StreamOutcome::Sent(0));
        assert_eq!(out, b"FILESIZE 0\nFILEEND\n");
    }

    #[tokio::test]
    async fn test_stream_missing_and_escaping_look_identical() {
        let (_dir, repository) = repository_with(&[]).await;

        let mut missing = Vec::new();
        repository.stream("missing.txt", &mut missing, 4096).await.unwrap();
        let mut escaping = Vec::new();
        repository.stream("../../etc/passwd", &mut escaping, 4096).await.unwrap();

        assert_eq!(missing, b"ERROR File not found\n");
        assert_eq!(escaping, missing);
    }

    /// Truncates `path` right after the first body chunk is written.
    #[cfg(unix)]
    struct TruncateAfterFirstChunk {
        path: PathBuf,
        writes: usize,
        out: Vec<u8>,
    }

    #[cfg(unix)]
    impl AsyncWrite for TruncateAfterFirstChunk {
        fn poll_write(
            mut self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            buf: &[u8],
        ) -> std::task::Poll<io::Result<usize>> {
            self.out.extend_from_slice(buf);
            self.writes += 1;
            if self.writes == 2 {
                std::fs::File::create(&self.path)?;
            }
            std::task::Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }

        fn poll_shutdown(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stream_fails_when_file_shrinks() {
        let (dir, repository) = repository_with(&[("log.txt", &[b'z'; 100])]).await;
        let mut writer = TruncateAfterFirstChunk {
            path: dir.path().join("log.txt"),
            writes: 0,
            out: Vec::new(),
        };

        let err = repository.stream("log.txt", &mut writer, 4).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        assert_eq!(writer.out, b"FILESIZE 100\nzzzz");
    }
}
