//! # Harbor Server - Line Protocol File Repository
//!
//! A small TCP server that names its clients, answers a line-oriented text
//! protocol, serves files from a fixed repository directory and reports a
//! live table of connected and disconnected clients.
//!
//! ## Architecture Overview
//!
//! ### Core Components
//!
//! * **Name Assigner** - Issues `Client01`, `Client02`, ... and never reuses a name
//! * **Client Registry** - Insertion-ordered record store behind the `status` report
//! * **Repository** - Lists and streams files from a flat directory, rejecting path escapes
//! * **Session Handler** - Per-connection handshake, command loop and teardown
//! * **File Server** - Accept loop with a capacity gate, one task per session
//!
//! ### Session Flow
//!
//! 1. The acceptor checks capacity; a full server replies `BUSY ...` and closes
//! 2. The session sends `NAME <name>` and expects a line starting with `NAME `
//! 3. Commands (`list`, `get <file>`, `status`, `exit`, anything else) are answered
//! 4. On exit, disconnect or failure the record's finish time is set exactly once
//!
//! ## Wire Protocol
//!
//! ```text
//! S: NAME Client01
//! C: NAME Client01
//! C: list
//! S: FILES a.txt | b.txt
//! C: get a.txt
//! S: FILESIZE 5
//! S: <5 raw bytes>FILEEND
//! C: hello
//! S: hello ACK
//! C: exit
//! S: BYE
//! ```
//!
//! ## Configuration
//!
//! The server is configured through [`ServerConfig`]: bind address,
//! repository directory, client limit, streaming chunk size, line length
//! limit, and whether admission is a strict atomic reservation.
//!
//! ## Error Handling
//!
//! Startup failures are reported as [`ServerError`]. Everything that goes
//! wrong inside a session stays inside that session's task and is logged.
//!
//! ## Example
//!
//! ```rust,no_run
//! # #[tokio::main]
//! # async fn main() -> Result<(), harbor_server::ServerError> {
//! use harbor_server::{create_server_with_config, ServerConfig};
//!
//! let server = create_server_with_config(ServerConfig {
//!     bind_address: "127.0.0.1:37200".parse().unwrap(),
//!     ..Default::default()
//! });
//! server.start().await
//! # }
//! ```

// Re-export core types and functions for easy access
pub use config::ServerConfig;
pub use connection::{ClientRecord, ClientRegistry, NameAssigner};
pub use error::ServerError;
pub use repository::{Repository, StreamOutcome};
pub use server::{FileServer, SessionEnd};
pub use utils::{create_server, create_server_with_config};

// Public module declarations
pub mod config;
pub mod connection;
pub mod error;
pub mod messaging;
pub mod repository;
pub mod server;
pub mod utils;
