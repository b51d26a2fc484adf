//! Configuration for the todo client.

use std::time::Duration;
use todosync_protocol::EndpointConfig;

/// Configuration for client operations.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Candidate service addresses, probed in order.
    pub endpoint: EndpointConfig,
    /// How long one liveness probe may take.
    pub probe_timeout: Duration,
    /// Name of the list created when a user has none.
    pub default_list_name: String,
}

impl ClientConfig {
    /// Creates a new client configuration.
    pub fn new(endpoint: EndpointConfig) -> Self {
        Self {
            endpoint,
            probe_timeout: Duration::from_secs(1),
            default_list_name: "My Tasks".into(),
        }
    }

    /// Sets the probe timeout.
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Sets the default list name.
    pub fn with_default_list_name(mut self, name: impl Into<String>) -> Self {
        self.default_list_name = name.into();
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(EndpointConfig::default())
    }
}
