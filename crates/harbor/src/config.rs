//! Configuration management for the Harbor file server.
//!
//! This module handles loading, validation, and conversion of server configuration
//! from TOML files and command-line arguments.

use harbor_server::config::{
    DEFAULT_BUFFER_SIZE, DEFAULT_MAX_CLIENTS, DEFAULT_MAX_LINE_LENGTH, DEFAULT_PORT,
};
use harbor_server::ServerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Application configuration loaded from TOML file.
///
/// This is the main configuration structure that encompasses all server settings
/// including networking, the repository and logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration settings
    #[serde(default)]
    pub server: ServerSettings,
    /// Repository configuration settings
    #[serde(default)]
    pub repository: RepositorySettings,
    /// Logging configuration settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Server-specific configuration settings.
///
/// Controls network binding, admission limits and streaming behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Network address to bind the server to (e.g., "0.0.0.0:37200")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Maximum number of concurrently active clients
    #[serde(default = "default_max_clients")]
    pub max_clients: usize,
    /// Chunk size in bytes used when streaming files
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    /// Longest command line accepted from a client, in bytes
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,
    /// Whether admission reserves a registry slot atomically
    #[serde(default = "default_strict_capacity")]
    pub strict_capacity: bool,
}

/// Repository configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositorySettings {
    /// Directory holding the downloadable files
    #[serde(default = "default_repository_directory")]
    pub directory: String,
}

/// Logging system configuration.
///
/// Controls log output format, levels, and destination settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Whether to output logs in JSON format
    #[serde(default)]
    pub json_format: bool,
    /// Optional file path for log output (None means stdout only)
    #[serde(default)]
    pub file_path: Option<String>,
}

fn default_bind_address() -> String {
    format!("0.0.0.0:{DEFAULT_PORT}")
}
fn default_max_clients() -> usize { DEFAULT_MAX_CLIENTS }
fn default_buffer_size() -> usize { DEFAULT_BUFFER_SIZE }
fn default_max_line_length() -> usize { DEFAULT_MAX_LINE_LENGTH }
fn default_strict_capacity() -> bool { true }
fn default_repository_directory() -> String { "server_repo".to_string() }
fn default_log_level() -> String { "info".to_string() }

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            max_clients: default_max_clients(),
            buffer_size: default_buffer_size(),
            max_line_length: default_max_line_length(),
            strict_capacity: default_strict_capacity(),
        }
    }
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            directory: default_repository_directory(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
            file_path: None,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            repository: RepositorySettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, creates a default configuration file at the specified path
    /// and returns the default configuration.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// The loaded or default configuration, or an error if loading/creation failed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Converts the application configuration to a file server configuration.
    ///
    /// # Returns
    ///
    /// A `ServerConfig` instance ready for use with the file server.
    pub fn to_server_config(&self) -> Result<ServerConfig, Box<dyn std::error::Error>> {
        Ok(ServerConfig {
            bind_address: self.server.bind_address.parse()?,
            repository_directory: PathBuf::from(&self.repository.directory),
            max_clients: self.server.max_clients,
            buffer_size: self.server.buffer_size,
            max_line_length: self.server.max_line_length,
            strict_capacity: self.server.strict_capacity,
        })
    }

    /// Validates the configuration for consistency and correctness.
    ///
    /// # Returns
    ///
    /// `Ok(())` if the configuration is valid, or an error string describing the issue.
    pub fn validate(&self) -> Result<(), String> {
        if self.server.bind_address.parse::<std::net::SocketAddr>().is_err() {
            return Err(format!(
                "Invalid bind address: {}",
                &self.server.bind_address
            ));
        }

        if self.server.max_clients == 0 {
            return Err("server.max_clients must be greater than 0".to_string());
        }
        if self.server.buffer_size == 0 {
            return Err("server.buffer_size must be greater than 0".to_string());
        }
        if self.server.max_line_length == 0 {
            return Err("server.max_line_length must be greater than 0".to_string());
        }

        if self.repository.directory.is_empty() {
            return Err("Repository directory cannot be empty".to_string());
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();

        assert_eq!(config.server.bind_address, "0.0.0.0:37200");
        assert_eq!(config.server.max_clients, 3);
        assert_eq!(config.server.buffer_size, 4096);
        assert!(config.server.strict_capacity);
        assert_eq!(config.repository.directory, "server_repo");
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json_format);
        assert!(config.logging.file_path.is_none());
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_load_from_nonexistent_file_writes_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("harbor.toml");

        let config = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0:37200");
        assert!(path.exists());

        let reloaded = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(reloaded.server.max_clients, config.server.max_clients);
        assert_eq!(reloaded.repository.directory, config.repository.directory);
    }

    #[tokio::test]
    async fn test_load_from_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        let toml_content = r#"
[server]
bind_address = "127.0.0.1:4000"
max_clients = 8
strict_capacity = false

[repository]
directory = "/srv/files"

[logging]
level = "debug"
json_format = true
"#;
        tokio::fs::write(&path, toml_content).await.unwrap();

        let config = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(config.server.bind_address, "127.0.0.1:4000");
        assert_eq!(config.server.max_clients, 8);
        assert!(!config.server.strict_capacity);
        // Missing keys fall back to defaults.
        assert_eq!(config.server.buffer_size, 4096);
        assert_eq!(config.repository.directory, "/srv/files");
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json_format);
    }

    #[tokio::test]
    async fn test_load_from_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.toml");
        tokio::fs::write(&path, "[server\nmax_clients = ").await.unwrap();
        assert!(AppConfig::load_from_file(&path).await.is_err());
    }

    #[test]
    fn test_to_server_config_conversion() {
        let mut config = AppConfig::default();
        config.server.bind_address = "127.0.0.1:9100".to_string();
        config.server.max_clients = 5;
        config.repository.directory = "files".to_string();

        let server_config = config.to_server_config().unwrap();
        assert_eq!(server_config.bind_address, "127.0.0.1:9100".parse().unwrap());
        assert_eq!(server_config.max_clients, 5);
        assert_eq!(server_config.repository_directory, PathBuf::from("files"));
        assert_eq!(server_config.buffer_size, 4096);
    }

    #[test]
    fn test_validation_failures() {
        let mut config = AppConfig::default();
        config.server.bind_address = "invalid".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.server.max_clients = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.repository.directory = String::new();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_valid_log_levels() {
        for level in ["trace", "debug", "info", "warn", "error"] {
            let mut config = AppConfig::default();
            config.logging.level = level.to_string();
            assert!(config.validate().is_ok(), "{level} should be accepted");
        }
    }
}
