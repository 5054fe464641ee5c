//! Core file server implementation.
//!
//! This module contains the main `FileServer` struct: the accept loop, the
//! capacity gate and the spawning of one session task per admitted client.

use crate::{
    config::ServerConfig,
    connection::{ClientRegistry, NameAssigner},
    error::ServerError,
    messaging::{write_reply, Reply},
    repository::Repository,
    server::handlers::{handle_connection, SessionContext},
};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// How an accepted connection got past the capacity gate.
enum Admission {
    /// Registered under this name by the acceptor itself
    Reserved(String),
    /// Passed the count check; the session registers on start
    Unreserved,
}

/// The core file server structure.
///
/// `FileServer` owns the shared client registry and name assigner and runs
/// the accept loop. Registry and assigner are injected handles, so several
/// servers (or tests) can run side by side without sharing state.
///
/// # Architecture
///
/// * **Acceptor**: the only task calling `accept`, never blocked by sessions
/// * **Capacity gate**: rejects with `BUSY` once `max_clients` are active
/// * **Sessions**: one tokio task per admitted connection
pub struct FileServer {
    /// Server configuration parameters
    config: ServerConfig,

    /// Records of every admitted client
    registry: Arc<ClientRegistry>,

    /// Source of client names
    names: Arc<NameAssigner>,

    /// Channel for stopping the accept loop
    shutdown_sender: broadcast::Sender<()>,

    /// Set once shutdown is requested, so a loop that has not subscribed yet still stops
    shutdown_requested: AtomicBool,

    /// Address of the listener currently being served
    local_addr: Mutex<Option<SocketAddr>>,
}

impl FileServer {
    /// Creates a new file server with its own registry and name assigner.
    pub fn new(config: ServerConfig) -> Self {
        Self::with_state(config, Arc::new(ClientRegistry::new()), Arc::new(NameAssigner::new()))
    }

    /// Creates a file server around existing shared state.
    pub fn with_state(
        config: ServerConfig,
        registry: Arc<ClientRegistry>,
        names: Arc<NameAssigner>,
    ) -> Self {
        let (shutdown_sender, _) = broadcast::channel(1);
        Self {
            config,
            registry,
            names,
            shutdown_sender,
            shutdown_requested: AtomicBool::new(false),
            local_addr: Mutex::new(None),
        }
    }

    /// The configuration this server was created with.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Handle to the client registry.
    pub fn registry(&self) -> Arc<ClientRegistry> {
        self.registry.clone()
    }

    /// Address the accept loop is listening on, once serving has begun.
    ///
    /// Useful when binding to port 0.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.lock().map(|addr| *addr).unwrap_or(None)
    }

    /// Handle to the name assigner.
    pub fn names(&self) -> Arc<NameAssigner> {
        self.names.clone()
    }

    /// Binds and serves until [`FileServer::shutdown`] is called.
    pub async fn start(&self) -> Result<(), ServerError> {
        let listener = self.bind().await?;
        self.serve(listener).await
    }

    /// Validates the configuration and binds the listening socket.
    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        self.config.validate()?;
        let listener = TcpListener::bind(self.config.bind_address)
            .await
            .map_err(|e| {
                ServerError::Network(format!("bind {} failed: {e}", self.config.bind_address))
            })?;
        Ok(listener)
    }

    /// Runs the accept loop on an already bound listener.
    ///
    /// Opens (and if needed creates) the repository first. Accept errors are
    /// logged and the loop keeps going; only a shutdown request stops it.
    /// Sessions already running are left to finish on their own. A shutdown
    /// requested before or during startup makes this return without accepting.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), ServerError> {
        let mut shutdown_receiver = self.shutdown_sender.subscribe();
        let repository = Repository::open(&self.config.repository_directory).await?;
        let context = Arc::new(SessionContext {
            registry: self.registry.clone(),
            repository: Arc::new(repository),
            buffer_size: self.config.buffer_size,
            max_line_length: self.config.max_line_length,
        });

        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::Network(e.to_string()))?;
        if let Ok(mut slot) = self.local_addr.lock() {
            *slot = Some(local_addr);
        }
        info!(
            "🚀 Listening on {} (max {} clients, {} capacity)",
            local_addr,
            self.config.max_clients,
            if self.config.strict_capacity { "strict" } else { "soft" }
        );

        if self.shutdown_requested.load(Ordering::SeqCst) {
            info!("🛑 Shutdown requested during startup - not accepting connections");
            return Ok(());
        }

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, addr)) => self.admit(stream, addr, &context).await,
                    Err(e) => error!("Failed to accept connection: {}", e),
                },
                _ = shutdown_receiver.recv() => {
                    info!("🛑 Accept loop stopping - shutdown requested");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Stops the accept loop. Shutdown is final for this server.
    pub fn shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::SeqCst);
        if self.shutdown_sender.send(()).is_err() {
            debug!("Shutdown requested while no accept loop is running");
        }
    }

    /// Applies the capacity gate and spawns a session for the connection.
    async fn admit(&self, stream: TcpStream, addr: SocketAddr, context: &Arc<SessionContext>) {
        let max_clients = self.config.max_clients;
        let admission = if self.config.strict_capacity {
            self.registry
                .admit(addr, max_clients, &self.names)
                .await
                .map(Admission::Reserved)
        } else if self.registry.active_count().await >= max_clients {
            None
        } else {
            Some(Admission::Unreserved)
        };

        let Some(admission) = admission else {
            reject_busy(stream, addr, max_clients).await;
            return;
        };

        let registry = self.registry.clone();
        let names = self.names.clone();
        let context = context.clone();
        tokio::spawn(async move {
            let name = match admission {
                Admission::Reserved(name) => name,
                Admission::Unreserved => {
                    let name = names.assign();
                    registry.register(&name, addr).await;
                    name
                }
            };
            handle_connection(stream, addr, name, context).await;
        });
    }
}

/// Sends `BUSY` and closes a connection that never gets registered.
async fn reject_busy(mut stream: TcpStream, addr: SocketAddr, max_clients: usize) {
    warn!("⛔ Rejecting {} - server at capacity ({})", addr, max_clients);
    let reply = Reply::Busy(format!(
        "Server is at capacity ({max_clients}). Try again later."
    ));
    if let Err(e) = write_reply(&mut stream, &reply).await {
        debug!("BUSY reply to {} failed: {}", addr, e);
    }
    if let Err(e) = stream.shutdown().await {
        debug!("Closing rejected connection {} failed: {}", addr, e);
    }
}
