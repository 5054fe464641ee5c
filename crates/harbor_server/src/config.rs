//! Server configuration types and defaults.
//!
//! This module contains the server configuration structure and default values
//! used to initialize and customize the file server behavior.

use crate::error::ServerError;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Default TCP port the server listens on.
pub const DEFAULT_PORT: u16 = 37200;

/// Default number of concurrently active sessions.
pub const DEFAULT_MAX_CLIENTS: usize = 3;

/// Default chunk size used when streaming file contents.
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Default upper bound for a single command line, in bytes.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 64 * 1024;

/// Configuration structure for the file server.
///
/// Contains all necessary parameters to configure server behavior including
/// network settings, the repository location and admission limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The socket address to bind the server to
    pub bind_address: SocketAddr,

    /// Directory served by `list` and `get`, created on startup if absent
    pub repository_directory: PathBuf,

    /// Maximum number of concurrently active sessions
    pub max_clients: usize,

    /// Chunk size in bytes for file streaming
    pub buffer_size: usize,

    /// Longest command line accepted from a client
    pub max_line_length: usize,

    /// Whether admission and registration happen as one atomic step.
    ///
    /// When disabled the acceptor counts active sessions and registers in two
    /// separate steps, so closely spaced connections may briefly exceed
    /// `max_clients`.
    pub strict_capacity: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            repository_directory: PathBuf::from("server_repo"),
            max_clients: DEFAULT_MAX_CLIENTS,
            buffer_size: DEFAULT_BUFFER_SIZE,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            strict_capacity: true,
        }
    }
}

impl ServerConfig {
    /// Checks the configuration for values the server cannot operate with.
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.max_clients == 0 {
            return Err(ServerError::Config("max_clients must be greater than 0".to_string()));
        }
        if self.buffer_size == 0 {
            return Err(ServerError::Config("buffer_size must be greater than 0".to_string()));
        }
        if self.max_line_length == 0 {
            return Err(ServerError::Config(
                "max_line_length must be greater than 0".to_string(),
            ));
        }
        if self.repository_directory.as_os_str().is_empty() {
            return Err(ServerError::Config(
                "repository_directory cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address.port(), 37200);
        assert_eq!(config.max_clients, 3);
        assert_eq!(config.buffer_size, 4096);
        assert_eq!(config.repository_directory, PathBuf::from("server_repo"));
        assert!(config.strict_capacity);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_zero_limits() {
        let config = ServerConfig {
            max_clients: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ServerError::Config(_))));

        let config = ServerConfig {
            buffer_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ServerConfig {
            max_line_length: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ServerConfig {
            repository_directory: PathBuf::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
