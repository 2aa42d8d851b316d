//! Registry facade: registration of named handler sets, the route table
//! built from them, and resource lookup.
//!
//! Registration happens on a [`RegistryBuilder`]. [`RegistryBuilder::build`]
//! freezes it into a [`Registry`] that is shared read-only from then on, so
//! the dispatch path takes no locks.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use isopropyl_core::{ResourceError, ResourceId, ResourceName};

use crate::config::IsopropylConfig;
use crate::error::TransportError;
use crate::handler::HandlerSet;
use crate::resource::{Resource, ResourceOptions};
use crate::router::Router;
use crate::transport::{self, Transport};

// ---------------------------------------------------------------------------
// RegistryBuilder
// ---------------------------------------------------------------------------

/// Collects registrations before the registry is frozen.
pub struct RegistryBuilder {
    config: IsopropylConfig,
    transport: Option<Arc<dyn Transport>>,
    handlers: HashMap<String, Arc<HandlerSet>>,
    router: Router,
}

impl RegistryBuilder {
    #[must_use]
    pub fn new(config: IsopropylConfig) -> Self {
        Self {
            config,
            transport: None,
            handlers: HashMap::new(),
            router: Router::new(),
        }
    }

    /// Overrides the transport otherwise built from
    /// [`IsopropylConfig::transport`].
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Registers `handlers` under `name` for local lookup and adds its route
    /// rule. Rules are matched in registration order.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::MissingResourceName`] / [`ResourceError::InvalidResourceName`]
    ///   for an empty or malformed name.
    /// - [`ResourceError::EmptyHandlerSet`] when `handlers` has no entries.
    /// - [`ResourceError::DuplicateResource`] when `name` is already registered.
    /// - [`ResourceError::StreamingUnsupported`] when any handler is a stream.
    pub fn register(&mut self, name: &str, handlers: HandlerSet) -> Result<&mut Self, ResourceError> {
        let name = ResourceName::parse(name)?;

        if handlers.is_empty() {
            return Err(ResourceError::EmptyHandlerSet {
                resource: name.to_string(),
            });
        }
        if let Some(key) = handlers.streaming_key() {
            return Err(ResourceError::StreamingUnsupported {
                resource: name.to_string(),
                key: key.to_string(),
            });
        }
        if self.handlers.contains_key(name.as_str()) {
            return Err(ResourceError::DuplicateResource {
                resource: name.to_string(),
            });
        }

        tracing::info!(resource = %name, handlers = ?handlers, "registering handler set");

        let handlers = Arc::new(handlers);
        self.router.add(&name, Arc::clone(&handlers));
        self.handlers.insert(name.into(), handlers);
        Ok(self)
    }

    /// Freezes the registrations.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Network`] if no transport was supplied and
    /// the configured HTTP client cannot be built.
    pub fn build(self) -> Result<Registry, TransportError> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => transport::from_config(&self.config.transport)?,
        };

        Ok(Registry {
            inner: Arc::new(RegistryInner {
                config: self.config,
                transport,
                handlers: self.handlers,
                router: self.router,
            }),
        })
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new(IsopropylConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

struct RegistryInner {
    config: IsopropylConfig,
    transport: Arc<dyn Transport>,
    handlers: HashMap<String, Arc<HandlerSet>>,
    router: Router,
}

/// Immutable set of registered resources.
///
/// Cloning is cheap and every clone sees the same registrations.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

impl Registry {
    #[must_use]
    pub fn builder(config: IsopropylConfig) -> RegistryBuilder {
        RegistryBuilder::new(config)
    }

    /// Builds a descriptor for `name` addressed by `ids`.
    ///
    /// The descriptor runs operations locally when `name` was registered
    /// here, and through the transport otherwise.
    ///
    /// # Errors
    ///
    /// See [`Resource::new`].
    pub fn resource<I>(&self, name: &str, ids: I) -> Result<Resource, ResourceError>
    where
        I: IntoIterator,
        I::Item: Into<ResourceId>,
    {
        let options = ResourceOptions {
            xhr_path: self.inner.config.xhr_path.clone(),
            handlers: self.handlers(name),
            transport: Arc::clone(&self.inner.transport),
        };
        Resource::new(name, ids, options)
    }

    /// Descriptor for a top-level collection: `resource(name, [])`.
    ///
    /// # Errors
    ///
    /// See [`Resource::new`].
    pub fn collection(&self, name: &str) -> Result<Resource, ResourceError> {
        self.resource(name, std::iter::empty::<ResourceId>())
    }

    #[must_use]
    pub fn handlers(&self, name: &str) -> Option<Arc<HandlerSet>> {
        self.inner.handlers.get(name).cloned()
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        &self.inner.router
    }

    #[must_use]
    pub fn xhr_path(&self) -> &str {
        &self.inner.config.xhr_path
    }

    #[must_use]
    pub fn config(&self) -> &IsopropylConfig {
        &self.inner.config
    }

    /// Registered resource names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.inner.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.handlers.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("xhr_path", &self.xhr_path())
            .field("resources", &self.names())
            .finish_non_exhaustive()
    }
}
