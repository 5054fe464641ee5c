//! Error types and handling for the file server.
//!
//! This module defines the error types that can occur during server operations,
//! providing clear categorization of different failure modes.

/// Enumeration of possible server errors.
///
/// Per-session failures are logged inside the session and never surface
/// here; these variants cover startup and lifecycle failures.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Network-related errors such as binding failures or connection issues
    #[error("Network error: {0}")]
    Network(String),

    /// The repository root could not be created or inspected
    #[error("Repository error: {0}")]
    Repository(String),

    /// The server configuration is unusable
    #[error("Configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_variant_names_its_category() {
        let errors = [
            ServerError::Network("bind 0.0.0.0:37200 failed".into()),
            ServerError::Repository("permission denied".into()),
            ServerError::Config("max_clients must be greater than 0".into()),
        ];
        for error in errors {
            let prefix = match &error {
                ServerError::Network(_) => "Network error: ",
                ServerError::Repository(_) => "Repository error: ",
                ServerError::Config(_) => "Configuration error: ",
            };
            assert!(error.to_string().starts_with(prefix), "{error}");
        }
    }
}
