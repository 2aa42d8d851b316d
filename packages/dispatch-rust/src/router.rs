//! Inbound request routing: matches a path against registered route rules
//! and invokes the resolved handler.

use std::sync::Arc;
use std::task::{Context, Poll};

use isopropyl_core::{
    HandlerKey, InboundRequest, ParsedPath, Request, ResourceName, RouteRule, Verb,
};
use serde_json::Value;
use tower::Service;

use crate::error::DispatchError;
use crate::handler::HandlerSet;
use crate::invoke::{invoke, Invocation};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct RouteEntry {
    rule: RouteRule,
    handlers: Arc<HandlerSet>,
}

/// Ordered table of route rules.
///
/// Rules are tried in registration order and the first structural match is
/// selected; there is no specificity ranking. A selected rule whose handler
/// set lacks the requested verb at the requested cardinality yields
/// [`DispatchError::RouteNotFound`], exactly like an unmatched path.
///
/// Cloning is cheap: the rule table is shared behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct Router {
    rules: Arc<Vec<RouteEntry>>,
}

impl Router {
    /// Create a new empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives the rule for `name` and appends it to the table.
    ///
    /// Registration is expected to finish before the router is shared.
    pub fn add(&mut self, name: &ResourceName, handlers: Arc<HandlerSet>) {
        let rule = RouteRule::derive(name);
        tracing::debug!(resource = %name, parts = rule.parts().len(), "route rule registered");
        Arc::make_mut(&mut self.rules).push(RouteEntry { rule, handlers });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Resolves `request` to a handler invocation.
    ///
    /// Query entries embedded in `request.path` are merged under the
    /// explicit `request.query`, which wins on conflicts. The handler
    /// receives the resolved resource name, the bound identifiers, and the
    /// inbound path without its query string as its `url`.
    pub fn run(&self, request: InboundRequest) -> Invocation {
        let InboundRequest {
            path,
            method,
            query,
            body,
        } = request;

        let parsed = match ParsedPath::parse(&path) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::debug!(%path, error = %err, "path rejected");
                return not_found(path);
            }
        };

        let Some(verb) = Verb::from_method(&method) else {
            tracing::debug!(%path, %method, "unsupported method");
            return not_found(path);
        };

        let Some((entry, matched)) = self
            .rules
            .iter()
            .find_map(|entry| entry.rule.match_segments(&parsed.segments).map(|m| (entry, m)))
        else {
            tracing::debug!(%path, "route not matched");
            return not_found(path);
        };

        let key = HandlerKey::new(verb, matched.cardinality);
        let resource = entry.rule.name().as_str();

        let Some(handler) = entry.handlers.handler(key) else {
            tracing::debug!(%path, resource, %key, "matched resource does not implement operation");
            return not_found(path);
        };

        tracing::debug!(%path, resource, %key, "route matched");

        let mut merged = parsed.query;
        merged.extend(query);

        let url = path.split_once('?').map_or(path.as_str(), |(url, _)| url).to_string();
        let request = Request::new(verb, resource, url, matched.params, merged, body);
        invoke(handler, key, request)
    }
}

fn not_found(path: String) -> Invocation {
    Invocation::rejected(DispatchError::RouteNotFound { path })
}

impl Service<InboundRequest> for Router {
    type Response = Value;
    type Error = DispatchError;
    type Future = Invocation;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: InboundRequest) -> Self::Future {
        self.run(request)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
