//! Resource descriptors: a named, addressed handle whose verb methods run
//! locally when a handler is registered and go through the transport
//! otherwise.

use std::fmt;
use std::sync::Arc;

use isopropyl_core::{
    Cardinality, HandlerKey, Params, Query, Request, ResourceError, ResourceId, ResourceName,
    ResourcePath, Verb,
};
use serde_json::Value;

use crate::error::DispatchError;
use crate::handler::{Handler, HandlerSet};
use crate::invoke::{invoke, Invocation};
use crate::transport::{DetachedTransport, Transport};

/// Construction options for a [`Resource`].
#[derive(Clone)]
pub struct ResourceOptions {
    /// Transport path prefix prepended to the derived URI.
    pub xhr_path: String,
    /// Locally registered handlers, if any.
    pub handlers: Option<Arc<HandlerSet>>,
    /// Used for every operation without a local handler.
    pub transport: Arc<dyn Transport>,
}

impl Default for ResourceOptions {
    fn default() -> Self {
        Self {
            xhr_path: String::new(),
            handlers: None,
            transport: Arc::new(DetachedTransport),
        }
    }
}

/// A resource addressed by name and identifiers.
///
/// Never constructed in an invalid state: the id count is checked against
/// the name's depth up front. `N` segments take `N - 1` ids (collection) or
/// `N` ids (member).
#[derive(Clone)]
pub struct Resource {
    name: ResourceName,
    path: ResourcePath,
    handlers: Option<Arc<HandlerSet>>,
    transport: Arc<dyn Transport>,
}

impl Resource {
    /// # Errors
    ///
    /// [`ResourceError::MissingResourceName`] for an empty name,
    /// [`ResourceError::InvalidResourceName`] for an empty segment, and
    /// [`ResourceError::TooManyIdentifiers`] / [`ResourceError::TooFewIdentifiers`]
    /// when the id count does not fit the name.
    pub fn new<I>(name: &str, ids: I, options: ResourceOptions) -> Result<Self, ResourceError>
    where
        I: IntoIterator,
        I::Item: Into<ResourceId>,
    {
        let name = ResourceName::parse(name)?;
        let ids: Vec<ResourceId> = ids.into_iter().map(Into::into).collect();
        let path = ResourcePath::derive(&options.xhr_path, &name, &ids)?;

        Ok(Self {
            name,
            path,
            handlers: options.handlers,
            transport: options.transport,
        })
    }

    #[must_use]
    pub fn name(&self) -> &ResourceName {
        &self.name
    }

    /// Derived URI, prefix included.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.path.uri
    }

    /// Identifier bindings for the segments that received an id.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.path.params
    }

    #[must_use]
    pub fn cardinality(&self) -> Cardinality {
        self.path.cardinality
    }

    #[must_use]
    pub fn is_collection(&self) -> bool {
        self.path.cardinality.is_collection()
    }

    /// True when a non-empty handler set was supplied.
    #[must_use]
    pub fn is_locally_defined(&self) -> bool {
        self.handlers.as_ref().is_some_and(|set| !set.is_empty())
    }

    pub fn get(&self, query: Query) -> Invocation {
        self.dispatch(Verb::Get, query, Value::Null)
    }

    pub fn put(&self, body: Value, query: Query) -> Invocation {
        self.dispatch(Verb::Put, query, body)
    }

    pub fn post(&self, body: Value, query: Query) -> Invocation {
        self.dispatch(Verb::Post, query, body)
    }

    pub fn patch(&self, body: Value, query: Query) -> Invocation {
        self.dispatch(Verb::Patch, query, body)
    }

    pub fn delete(&self, query: Query) -> Invocation {
        self.dispatch(Verb::Delete, query, Value::Null)
    }

    fn local_handler(&self, key: HandlerKey) -> Option<&Handler> {
        self.handlers.as_deref()?.handler(key)
    }

    fn dispatch(&self, verb: Verb, query: Query, body: Value) -> Invocation {
        let key = HandlerKey::new(verb, self.path.cardinality);
        let request = Request::new(
            verb,
            self.name.as_str(),
            self.path.uri.clone(),
            self.path.params.clone(),
            query,
            body,
        );

        if let Some(handler) = self.local_handler(key) {
            tracing::debug!(resource = %self.name, %key, uri = %self.path.uri, "dispatching locally");
            return invoke(handler, key, request);
        }

        tracing::debug!(resource = %self.name, %key, uri = %self.path.uri, "dispatching through transport");
        let transport = Arc::clone(&self.transport);
        Invocation::adopt(async move { transport.send(request).await.map_err(DispatchError::from) })
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("name", &self.name.as_str())
            .field("uri", &self.path.uri)
            .field("params", &self.path.params)
            .field("cardinality", &self.path.cardinality)
            .field("locally_defined", &self.is_locally_defined())
            .finish_non_exhaustive()
    }
}
