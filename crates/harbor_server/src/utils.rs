//! Utility functions and helper methods for the file server.
//!
//! This module provides convenient factory functions for creating server
//! instances with different configurations.

use crate::{config::ServerConfig, server::FileServer};

/// Creates a new file server with default configuration.
///
/// Listens on `0.0.0.0:37200`, serves `./server_repo` and admits three
/// concurrent clients.
///
/// # Example
///
/// ```rust
/// use harbor_server::create_server;
///
/// let server = create_server();
/// assert_eq!(server.config().max_clients, 3);
/// ```
pub fn create_server() -> FileServer {
    FileServer::new(ServerConfig::default())
}

/// Creates a new file server with custom configuration.
///
/// # Arguments
///
/// * `config` - A `ServerConfig` instance with desired settings
///
/// # Example
///
/// ```rust
/// use harbor_server::{create_server_with_config, ServerConfig};
///
/// let config = ServerConfig {
///     bind_address: "127.0.0.1:9000".parse().unwrap(),
///     max_clients: 10,
///     ..Default::default()
/// };
///
/// let server = create_server_with_config(config);
/// assert_eq!(server.config().max_clients, 10);
/// ```
pub fn create_server_with_config(config: ServerConfig) -> FileServer {
    FileServer::new(config)
}
