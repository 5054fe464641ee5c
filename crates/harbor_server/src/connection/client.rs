//! Client record representation.
//!
//! This module defines the per-connection metadata kept by the registry for
//! the lifetime of the process.

use chrono::{DateTime, Local};
use std::net::SocketAddr;

/// Timestamp format used in status reports.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Represents one admitted client connection.
///
/// A record is created when a connection passes the capacity gate and is
/// never removed. The only mutation is setting `finished_at` at teardown.
///
/// # Fields
///
/// * `name` - Unique sequential name assigned at admission
/// * `remote_addr` - The network address of the peer
/// * `connected_at` - When the record was registered
/// * `finished_at` - When the session ended, `None` while it is active
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientRecord {
    /// The assigned client name (`Client01`, `Client02`, ...)
    pub name: String,

    /// The remote network address of the client
    pub remote_addr: SocketAddr,

    /// When this client was registered
    pub connected_at: DateTime<Local>,

    /// When the session ended, unset while active
    pub finished_at: Option<DateTime<Local>>,
}

impl ClientRecord {
    /// Creates an active record stamped with the current time.
    pub fn new(name: String, remote_addr: SocketAddr) -> Self {
        Self {
            name,
            remote_addr,
            connected_at: Local::now(),
            finished_at: None,
        }
    }

    /// Whether the session owning this record is still running.
    pub fn is_active(&self) -> bool {
        self.finished_at.is_none()
    }

    /// Sets `finished_at` to now unless it is already set.
    ///
    /// Returns `true` only for the call that actually set the timestamp.
    pub fn mark_finished(&mut self) -> bool {
        if self.finished_at.is_some() {
            return false;
        }
        self.finished_at = Some(Local::now());
        true
    }

    /// Renders the record as one fixed-width status row.
    pub fn status_row(&self) -> String {
        let ip_port = format!("{}:{}", self.remote_addr.ip(), self.remote_addr.port());
        let connected = self.connected_at.format(TIMESTAMP_FORMAT).to_string();
        let finished = self
            .finished_at
            .map(|at| at.format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_else(|| "-".to_string());
        format!("{:<10} {:<22} {:<20} {:<20}", self.name, ip_port, connected, finished)
            .trim_end()
            .to_string()
    }
}
