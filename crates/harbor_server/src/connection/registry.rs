//! Client registry for tracking every admitted connection.
//!
//! This module provides the concurrent record store backing the capacity
//! gate and the `status` report. Records are kept in registration order and
//! are never removed.

use super::{client::ClientRecord, names::NameAssigner};
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Line returned by the status report when nothing has connected yet.
pub const NO_CLIENTS_LINE: &str = "No clients connected yet.";

/// Records plus a name index, guarded together so a reader never sees one
/// without the other.
#[derive(Debug, Default)]
struct RegistryState {
    records: Vec<ClientRecord>,
    by_name: HashMap<String, usize>,
}

impl RegistryState {
    fn active_count(&self) -> usize {
        self.records.iter().filter(|record| record.is_active()).count()
    }

    fn insert(&mut self, record: ClientRecord) -> bool {
        if self.by_name.contains_key(&record.name) {
            return false;
        }
        self.by_name.insert(record.name.clone(), self.records.len());
        self.records.push(record);
        true
    }
}

/// Central store for all client records.
///
/// The `ClientRegistry` owns its synchronization; callers share it through
/// an `Arc` handle. Every critical section only touches in-memory state and
/// never spans a network call.
///
/// # Architecture
///
/// * Uses a single `RwLock` over an insertion-ordered `Vec` and a name index
/// * Snapshots are cloned under the read lock, giving a point-in-time view
/// * Admission can reserve a slot and register in one write-locked step
#[derive(Debug, Default)]
pub struct ClientRegistry {
    state: RwLock<RegistryState>,
}

impl ClientRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new active record for `name`.
    ///
    /// Returns `false` and leaves the registry untouched if the name was
    /// already registered.
    pub async fn register(&self, name: &str, remote_addr: SocketAddr) -> bool {
        let mut state = self.state.write().await;
        let inserted = state.insert(ClientRecord::new(name.to_string(), remote_addr));
        if inserted {
            info!("🔗 {} registered from {}", name, remote_addr);
        } else {
            warn!("Refusing duplicate registration of {}", name);
        }
        inserted
    }

    /// Atomically checks capacity, assigns a name and registers it.
    ///
    /// Returns `None` without consuming a name when `max_active` sessions are
    /// already active.
    pub async fn admit(
        &self,
        remote_addr: SocketAddr,
        max_active: usize,
        names: &NameAssigner,
    ) -> Option<String> {
        let mut state = self.state.write().await;
        if state.active_count() >= max_active {
            return None;
        }
        let name = names.assign();
        state.insert(ClientRecord::new(name.clone(), remote_addr));
        info!("🔗 {} registered from {}", name, remote_addr);
        Some(name)
    }

    /// Stamps `finished_at` on the named record.
    ///
    /// Returns `true` only for the call that set the timestamp; later calls
    /// and unknown names leave the registry unchanged.
    pub async fn mark_finished(&self, name: &str) -> bool {
        let mut state = self.state.write().await;
        let Some(&index) = state.by_name.get(name) else {
            warn!("mark_finished for unknown client {}", name);
            return false;
        };
        let record = &mut state.records[index];
        let finished = record.mark_finished();
        if finished {
            info!("❌ {} from {} finished", record.name, record.remote_addr);
        } else {
            debug!("{} was already marked finished", name);
        }
        finished
    }

    /// Number of records whose session has not finished.
    pub async fn active_count(&self) -> usize {
        self.state.read().await.active_count()
    }

    /// Total number of records ever registered.
    pub async fn len(&self) -> usize {
        self.state.read().await.records.len()
    }

    /// Whether no client has ever been registered.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.records.is_empty()
    }

    /// Looks up a copy of the named record.
    pub async fn get(&self, name: &str) -> Option<ClientRecord> {
        let state = self.state.read().await;
        state.by_name.get(name).map(|&index| state.records[index].clone())
    }

    /// Returns a consistent copy of all records in registration order.
    pub async fn snapshot(&self) -> Vec<ClientRecord> {
        self.state.read().await.records.clone()
    }

    /// Renders the status table from a fresh snapshot.
    pub async fn render_status(&self) -> Vec<String> {
        render_status(&self.snapshot().await)
    }
}

/// Renders one row per record, or a single line when there are none.
pub fn render_status(records: &[ClientRecord]) -> Vec<String> {
    if records.is_empty() {
        return vec![NO_CLIENTS_LINE.to_string()];
    }
    records.iter().map(ClientRecord::status_row).collect()
}
