//! Command-line interface handling for the Harbor file server.
//!
//! This module provides command-line argument parsing using the `clap`
//! crate. Every option overrides the matching configuration file value.

use crate::config::AppConfig;
use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;

/// Command line arguments parsed from user input.
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Path to the configuration file
    pub config_path: PathBuf,
    /// Optional override for bind address
    pub bind_address: Option<String>,
    /// Optional override for the repository directory
    pub repository_dir: Option<PathBuf>,
    /// Optional override for the client limit
    pub max_clients: Option<usize>,
    /// Optional override for log level
    pub log_level: Option<String>,
    /// Whether to force JSON log output
    pub json_logs: bool,
}

impl CliArgs {
    /// Parses the process arguments.
    pub fn parse() -> Self {
        Self::from_matches(&Self::command().get_matches())
    }

    /// Parses an explicit argument list, returning clap's error on failure.
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Ok(Self::from_matches(&Self::command().try_get_matches_from(args)?))
    }

    fn command() -> Command {
        Command::new("Harbor File Server")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Line-protocol TCP file repository server")
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .value_name("FILE")
                    .help("Configuration file path")
                    .default_value("harbor.toml"),
            )
            .arg(
                Arg::new("bind")
                    .short('b')
                    .long("bind")
                    .value_name("ADDRESS")
                    .help("Bind address (e.g., 0.0.0.0:37200)"),
            )
            .arg(
                Arg::new("repository")
                    .short('r')
                    .long("repository")
                    .value_name("DIR")
                    .help("Directory served to clients"),
            )
            .arg(
                Arg::new("max-clients")
                    .short('m')
                    .long("max-clients")
                    .value_name("N")
                    .value_parser(clap::value_parser!(usize))
                    .help("Maximum number of concurrently active clients"),
            )
            .arg(
                Arg::new("log-level")
                    .short('l')
                    .long("log-level")
                    .value_name("LEVEL")
                    .help("Log level (trace, debug, info, warn, error)"),
            )
            .arg(
                Arg::new("json-logs")
                    .long("json-logs")
                    .help("Output logs in JSON format")
                    .action(clap::ArgAction::SetTrue),
            )
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            config_path: matches
                .get_one::<String>("config")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("harbor.toml")),
            bind_address: matches.get_one::<String>("bind").cloned(),
            repository_dir: matches.get_one::<String>("repository").map(PathBuf::from),
            max_clients: matches.get_one::<usize>("max-clients").copied(),
            log_level: matches.get_one::<String>("log-level").cloned(),
            json_logs: matches.get_flag("json-logs"),
        }
    }

    /// Applies the command-line overrides on top of a loaded configuration.
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(bind_address) = &self.bind_address {
            config.server.bind_address = bind_address.clone();
        }
        if let Some(repository_dir) = &self.repository_dir {
            config.repository.directory = repository_dir.to_string_lossy().to_string();
        }
        if let Some(max_clients) = self.max_clients {
            config.server.max_clients = max_clients;
        }
        if let Some(log_level) = &self.log_level {
            config.logging.level = log_level.clone();
        }
        if self.json_logs {
            config.logging.json_format = true;
        }
    }
}
