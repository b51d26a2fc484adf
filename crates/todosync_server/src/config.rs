//! Server configuration.

use crate::auth::AuthConfig;
use std::path::PathBuf;
use todosync_protocol::EndpointConfig;

/// Configuration for the todo server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Candidate addresses to bind, tried in order.
    pub endpoint: EndpointConfig,
    /// Credential signing configuration.
    pub auth: AuthConfig,
    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
    /// Snapshot file; state is kept in memory only when unset.
    pub data_file: Option<PathBuf>,
}

impl ServerConfig {
    /// Creates a new server configuration.
    pub fn new(endpoint: EndpointConfig, auth: AuthConfig) -> Self {
        Self {
            endpoint,
            auth,
            max_body_bytes: 64 * 1024,
            data_file: None,
        }
    }

    /// Sets the maximum request body size.
    pub fn with_max_body_bytes(mut self, max: usize) -> Self {
        self.max_body_bytes = max;
        self
    }

    /// Enables snapshot persistence to the given file.
    pub fn with_data_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_file = Some(path.into());
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(EndpointConfig::default(), AuthConfig::generate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.max_body_bytes, 64 * 1024);
        assert_eq!(config.endpoint.default_port, 5000);
        assert!(config.data_file.is_none());
        assert_ne!(config.auth.secret, ServerConfig::default().auth.secret);
    }

    #[test]
    fn config_builder() {
        let auth = AuthConfig::new(vec![1, 2, 3, 4]).with_expiry(Duration::from_secs(60));
        let config = ServerConfig::new(EndpointConfig::new("0.0.0.0", 9000), auth)
            .with_max_body_bytes(512)
            .with_data_file("/tmp/todos.json");

        assert_eq!(config.max_body_bytes, 512);
        assert_eq!(config.auth.secret, vec![1, 2, 3, 4]);
        assert_eq!(config.auth.token_expiry, Duration::from_secs(60));
        assert_eq!(config.data_file, Some(PathBuf::from("/tmp/todos.json")));
    }
}
