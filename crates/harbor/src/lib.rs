//! # Harbor File Server - Main Entry Point
//!
//! Runs the line-protocol file repository server. This entry point handles
//! CLI parsing, configuration loading, logging and the application lifecycle.
//!
//! ## Quick Start
//!
//! ```bash
//! # Run with default configuration
//! harbor
//!
//! # Specify custom configuration
//! harbor --config production.toml
//!
//! # Override specific settings
//! harbor --bind 0.0.0.0:37200 --repository /srv/files --max-clients 10 --log-level debug
//!
//! # JSON logging for production
//! harbor --json-logs
//! ```
//!
//! ## Configuration
//!
//! The server loads configuration from a TOML file (default: `harbor.toml`).
//! If the file doesn't exist, a default configuration will be created.
//!
//! ## Signal Handling
//!
//! The server handles graceful shutdown on:
//! - SIGINT (Ctrl+C)
//! - SIGTERM (Unix systems)

use tracing::error;

pub mod app;
pub mod cli;
pub mod config;
pub mod logging;
pub mod signals;

use app::Application;
use cli::CliArgs;
use config::AppConfig;

/// Main entry point for the Harbor file server.
///
/// # Exit Codes
///
/// * **0**: Successful execution and shutdown
/// * **1**: Error during startup, configuration, or runtime
///
/// Note: This function is called from an async context (main with #[tokio::main]),
/// so it should NOT have #[tokio::main] itself.
pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Logging settings come from the file, so read it once before the subscriber exists
    let mut logging_config = AppConfig::load_from_file(&args.config_path)
        .await
        .unwrap_or_default();
    args.apply_overrides(&mut logging_config);

    if let Err(e) = logging::setup_logging(&logging_config.logging, args.json_logs) {
        eprintln!("❌ Failed to setup logging: {e}");
        std::process::exit(1);
    }

    match Application::new(args).await {
        Ok(app) => {
            if let Err(e) = app.run().await {
                error!("❌ Application error: {:?}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("❌ Failed to start application: {e:?}");
            std::process::exit(1);
        }
    }

    Ok(())
}

// Re-export main types for potential library usage
pub use config::{LoggingSettings, RepositorySettings, ServerSettings};
