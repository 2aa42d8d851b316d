//! Listener settings for the HTTP adapter.

use std::time::Duration;

/// Where and how the inbound adapter listens.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub host: String,
    /// `0` lets the OS pick; [`NetworkModule::start`](super::NetworkModule::start)
    /// reports the bound port.
    pub port: u16,
    /// Origins echoed by the CORS layer. `"*"` allows any origin.
    pub cors_origins: Vec<String>,
    /// Upper bound on a whole HTTP exchange, answered with `408` when hit.
    pub request_timeout: Duration,
    /// Largest JSON body the adapter will buffer, in bytes.
    pub body_limit: usize,
}

impl NetworkConfig {
    /// `host:port` as handed to the TCP listener.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            request_timeout: Duration::from_secs(30),
            body_limit: 2 * 1024 * 1024,
        }
    }
}
