//! Candidate endpoints shared by server binding and client discovery.

use crate::error::{ProtocolError, ProtocolResult};

/// Default service port.
pub const DEFAULT_PORT: u16 = 5000;

/// Ports tried, in order, after the default.
pub const DEFAULT_FALLBACK_PORTS: [u16; 5] = [5001, 5002, 5003, 5004, 5005];

/// Where the service may be listening.
///
/// The server binds the first free candidate; the client probes the same
/// candidates in the same order, so both sides read one configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    /// Host name or address.
    pub host: String,
    /// Preferred port.
    pub default_port: u16,
    /// Fallback ports in declared order.
    pub fallback_ports: Vec<u16>,
}

impl EndpointConfig {
    /// Creates a configuration with no fallbacks.
    pub fn new(host: impl Into<String>, default_port: u16) -> Self {
        Self {
            host: host.into(),
            default_port,
            fallback_ports: Vec::new(),
        }
    }

    /// Sets the fallback ports.
    pub fn with_fallback_ports(mut self, ports: impl IntoIterator<Item = u16>) -> Self {
        self.fallback_ports = ports.into_iter().collect();
        self
    }

    /// Reads `TODOSYNC_HOST`, `TODOSYNC_PORT` and `TODOSYNC_FALLBACK_PORTS`,
    /// keeping defaults for unset variables.
    pub fn from_env() -> ProtocolResult<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ProtocolResult<Self> {
        let mut config = Self::default();
        if let Some(host) = lookup("TODOSYNC_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("TODOSYNC_PORT") {
            config.default_port = parse_port("TODOSYNC_PORT", &port)?;
        }
        if let Some(ports) = lookup("TODOSYNC_FALLBACK_PORTS") {
            config.fallback_ports = parse_port_list("TODOSYNC_FALLBACK_PORTS", &ports)?;
        }
        Ok(config)
    }

    /// Returns every candidate port: the default first, then fallbacks.
    /// Duplicates are dropped, keeping the first occurrence.
    pub fn candidates(&self) -> Vec<u16> {
        let mut ports = Vec::with_capacity(1 + self.fallback_ports.len());
        for port in std::iter::once(self.default_port).chain(self.fallback_ports.iter().copied()) {
            if !ports.contains(&port) {
                ports.push(port);
            }
        }
        ports
    }

    /// Returns the base URL for a port.
    pub fn base_url(&self, port: u16) -> String {
        format!("http://{}:{}", self.host, port)
    }

    /// Returns the base URL of the default candidate.
    pub fn default_base_url(&self) -> String {
        self.base_url(self.default_port)
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self::new("127.0.0.1", DEFAULT_PORT).with_fallback_ports(DEFAULT_FALLBACK_PORTS)
    }
}

/// Parses a port number.
pub fn parse_port(var: &str, value: &str) -> ProtocolResult<u16> {
    value.trim().parse().map_err(|_| ProtocolError::InvalidEnv {
        var: var.into(),
        value: value.into(),
    })
}

/// Parses a comma-separated port list; blank entries are skipped.
pub fn parse_port_list(var: &str, value: &str) -> ProtocolResult<Vec<u16>> {
    value
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| parse_port(var, part))
        .collect()
}
