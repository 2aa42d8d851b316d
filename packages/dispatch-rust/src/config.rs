use std::time::Duration;

/// Engine-level configuration shared by the registry, descriptors and the
/// inbound adapter.
#[derive(Debug, Clone)]
pub struct IsopropylConfig {
    /// Transport path prefix. Prepended to descriptor URIs and stripped from
    /// inbound paths by the HTTP adapter.
    pub xhr_path: String,
    /// Remote endpoint used when a resource is not defined locally.
    pub transport: TransportConfig,
    /// Optional deadline applied to routed dispatches. `None` disables it.
    pub dispatch_timeout: Option<Duration>,
}

impl Default for IsopropylConfig {
    fn default() -> Self {
        Self {
            xhr_path: "/api".to_string(),
            transport: TransportConfig::default(),
            dispatch_timeout: None,
        }
    }
}

/// Settings for the HTTP transport client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Scheme and authority remote URIs are joined onto, e.g.
    /// `http://localhost:3000`. Without it remote calls fail with
    /// [`TransportError::NotConfigured`](crate::TransportError::NotConfigured).
    pub base_url: Option<String>,
    /// Whole-request timeout for remote calls.
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(30),
        }
    }
}
