//! Main application logic and lifecycle management.
//!
//! This module contains the `Application` struct that orchestrates server
//! startup, waits for a termination signal and reports the client table on
//! the way out.

use crate::{
    cli::CliArgs,
    config::AppConfig,
    logging::display_banner,
    signals::{setup_signal_handlers, setup_signal_handlers_silent},
};
use harbor_server::{ClientRegistry, FileServer};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Main application struct.
///
/// The `Application` struct manages the complete lifecycle of the Harbor
/// server: configuration loading, server initialization and graceful
/// shutdown handling.
pub struct Application {
    /// Loaded application configuration
    config: AppConfig,
    /// File server instance
    server: Arc<FileServer>,
}

impl Application {
    /// Creates a new application instance.
    ///
    /// # Process
    ///
    /// 1. Load configuration from file (creating default if missing)
    /// 2. Apply command-line argument overrides
    /// 3. Validate merged configuration
    /// 4. Display startup banner
    /// 5. Initialize the file server with configuration
    pub async fn new(args: CliArgs) -> Result<Self, Box<dyn std::error::Error>> {
        info!("🔧 Loading configuration from: {}", args.config_path.display());
        let mut config = AppConfig::load_from_file(&args.config_path).await?;
        args.apply_overrides(&mut config);
        Self::from_config(config)
    }

    /// Creates an application from an already merged configuration.
    pub fn from_config(config: AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        if let Err(e) = config.validate() {
            return Err(format!("Configuration validation failed: {e}").into());
        }
        info!("✅ Configuration loaded and validated successfully");

        display_banner();

        let server_config = config.to_server_config()?;
        let server = Arc::new(FileServer::new(server_config));

        Ok(Self { config, server })
    }

    /// Returns the server this application drives.
    pub fn server(&self) -> Arc<FileServer> {
        self.server.clone()
    }

    /// Runs the server until a termination signal arrives.
    ///
    /// A second signal during shutdown exits the process immediately.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        info!("🌟 Starting Harbor File Server");
        self.log_configuration_summary();

        let registry = self.server.registry();

        let mut server_handle = {
            let server = self.server.clone();
            tokio::spawn(async move { server.start().await })
        };

        info!("🛑 Press Ctrl+C to gracefully shutdown");

        tokio::select! {
            signal = setup_signal_handlers() => signal?,
            finished = &mut server_handle => {
                // The accept loop only ends on its own when startup failed
                return match finished {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => Err(e.into()),
                    Err(e) => Err(e.into()),
                };
            }
        }

        // merciless shutdown
        tokio::spawn(async move {
            if let Err(e) = setup_signal_handlers_silent().await {
                error!("Failed to set up merciless shutdown signal handler: {e}");
                return;
            }

            warn!("Shutdown handler received again! I'll make this quick.");
            std::process::exit(1);
        });

        info!("🛑 Shutdown signal received, stopping accept loop...");
        self.server.shutdown();

        match tokio::time::timeout(tokio::time::Duration::from_secs(5), server_handle).await {
            Ok(Ok(Ok(()))) => info!("✅ Accept loop stopped"),
            Ok(Ok(Err(e))) => error!("❌ Server error during shutdown: {e}"),
            Ok(Err(e)) => error!("❌ Server task failed: {e}"),
            Err(_) => warn!("⏰ Accept loop did not stop within timeout, proceeding"),
        }

        log_final_statistics(&registry).await;

        info!("✅ Harbor shutdown complete");
        Ok(())
    }

    /// Logs the configuration summary at startup.
    fn log_configuration_summary(&self) {
        info!("📋 Configuration Summary:");
        info!("  🌐 Bind address: {}", self.config.server.bind_address);
        info!("  📂 Repository: {}", self.config.repository.directory);
        info!("  👥 Max clients: {}", self.config.server.max_clients);
        info!("  📦 Chunk size: {} bytes", self.config.server.buffer_size);
        info!(
            "  🚦 Admission: {}",
            if self.config.server.strict_capacity { "strict" } else { "soft" }
        );
    }
}

/// Logs the client table during shutdown.
async fn log_final_statistics(registry: &ClientRegistry) {
    info!("📊 Final Statistics:");
    info!("  - Clients seen: {}", registry.len().await);
    info!("  - Still connected: {}", registry.active_count().await);
    for row in registry.render_status().await {
        info!("  {}", row);
    }
}
