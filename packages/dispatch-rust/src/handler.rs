//! Handler variants and the verb × cardinality keyed handler set.
//!
//! Every handler declares its calling convention when it is constructed:
//!
//! - [`Handler::sync`]: returns the final value directly.
//! - [`Handler::callback`]: receives a [`Callback`] and settles it later.
//! - [`Handler::eventual`]: returns a future that the invocation adopts.
//! - [`Handler::stream`]: produces incremental results. Declarable, but never
//!   dispatched; see [`invoke`](crate::invoke::invoke).
//!
//! Handlers are closures. Any state they need (a store, a client) is captured
//! by the closure, typically behind an `Arc`.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures_util::stream::{BoxStream, Stream, StreamExt};
use isopropyl_core::{HandlerKey, Request, Verb};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;

/// Result type for handler functions.
pub type HandlerResult = anyhow::Result<Value>;

/// Boxed future for handler results.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

type SyncFn = dyn Fn(Request) -> HandlerResult + Send + Sync;
type CallbackFn = dyn Fn(Request, Callback) + Send + Sync;
type EventualFn = dyn Fn(Request) -> BoxFuture<'static, HandlerResult> + Send + Sync;
type StreamFn = dyn Fn(Request) -> BoxStream<'static, HandlerResult> + Send + Sync;

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

/// A single operation implementation tagged with its calling convention.
///
/// Cloning is cheap: the closure is shared behind an `Arc`.
#[derive(Clone)]
pub enum Handler {
    Sync(Arc<SyncFn>),
    Callback(Arc<CallbackFn>),
    Eventual(Arc<EventualFn>),
    Stream(Arc<StreamFn>),
}

impl Handler {
    /// Handler whose return value is the final result.
    pub fn sync<F>(handler: F) -> Self
    where
        F: Fn(Request) -> HandlerResult + Send + Sync + 'static,
    {
        Handler::Sync(Arc::new(handler))
    }

    /// Handler that settles the supplied [`Callback`], now or later.
    pub fn callback<F>(handler: F) -> Self
    where
        F: Fn(Request, Callback) + Send + Sync + 'static,
    {
        Handler::Callback(Arc::new(handler))
    }

    /// Handler returning a future whose outcome becomes the result.
    pub fn eventual<F, Fut>(handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Handler::Eventual(Arc::new(move |request| Box::pin(handler(request))))
    }

    /// Handler producing a stream of results.
    pub fn stream<F, S>(handler: F) -> Self
    where
        F: Fn(Request) -> S + Send + Sync + 'static,
        S: Stream<Item = HandlerResult> + Send + 'static,
    {
        Handler::Stream(Arc::new(move |request| handler(request).boxed()))
    }

    /// Name of the calling convention, for logs.
    #[must_use]
    pub fn convention(&self) -> &'static str {
        match self {
            Handler::Sync(_) => "sync",
            Handler::Callback(_) => "callback",
            Handler::Eventual(_) => "eventual",
            Handler::Stream(_) => "stream",
        }
    }

    #[must_use]
    pub fn is_stream(&self) -> bool {
        matches!(self, Handler::Stream(_))
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handler").field(&self.convention()).finish()
    }
}

// ---------------------------------------------------------------------------
// Callback
// ---------------------------------------------------------------------------

/// Completion handle given to callback-style handlers.
///
/// Only the first settlement counts; later calls are ignored and report
/// `false`. Clones share the same slot. If every clone is dropped without
/// settling, the invocation fails with
/// [`DispatchError::CallbackDropped`](crate::DispatchError::CallbackDropped).
#[derive(Clone)]
pub struct Callback {
    slot: Arc<Mutex<Option<oneshot::Sender<HandlerResult>>>>,
}

impl Callback {
    pub(crate) fn channel() -> (Self, oneshot::Receiver<HandlerResult>) {
        let (tx, rx) = oneshot::channel();
        let callback = Self {
            slot: Arc::new(Mutex::new(Some(tx))),
        };
        (callback, rx)
    }

    /// Settles the invocation with `result`.
    ///
    /// Returns `true` if this call settled it, `false` if it was already
    /// settled or the invocation was dropped.
    pub fn call(&self, result: HandlerResult) -> bool {
        let Some(tx) = self.slot.lock().take() else {
            tracing::debug!("callback invoked after settlement, ignored");
            return false;
        };
        tx.send(result).is_ok()
    }

    /// Shorthand for `call(Ok(value))`.
    pub fn resolve(&self, value: Value) -> bool {
        self.call(Ok(value))
    }

    /// Shorthand for `call(Err(error))`.
    pub fn reject(&self, error: impl Into<anyhow::Error>) -> bool {
        self.call(Err(error.into()))
    }

    /// Drops the sender without settling. Returns `true` if it was still
    /// open, so the caller now owns the outcome.
    pub(crate) fn close(&self) -> bool {
        self.slot.lock().take().is_some()
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.slot.lock().is_none()
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("settled", &self.is_settled())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// HandlerSet
// ---------------------------------------------------------------------------

/// Table of handlers keyed by verb and cardinality.
///
/// A missing key means the operation is not implemented locally.
#[derive(Clone, Default)]
pub struct HandlerSet {
    handlers: HashMap<HandlerKey, Handler>,
}

macro_rules! handler_set_builders {
    ($($collection:ident, $member:ident => $verb:expr;)*) => {
        $(
            #[doc = concat!("Registers the `", stringify!($collection), "` collection handler.")]
            #[must_use]
            pub fn $collection(self, handler: Handler) -> Self {
                self.with(HandlerKey::collection($verb), handler)
            }

            #[doc = concat!("Registers the `", stringify!($member), "` member handler.")]
            #[must_use]
            pub fn $member(self, handler: Handler) -> Self {
                self.with(HandlerKey::member($verb), handler)
            }
        )*
    };
}

impl HandlerSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `handler` under `key`, replacing any previous entry.
    #[must_use]
    pub fn with(mut self, key: HandlerKey, handler: Handler) -> Self {
        self.handlers.insert(key, handler);
        self
    }

    handler_set_builders! {
        get, get_one => Verb::Get;
        put, put_one => Verb::Put;
        post, post_one => Verb::Post;
        patch, patch_one => Verb::Patch;
        delete, delete_one => Verb::Delete;
    }

    pub fn insert(&mut self, key: HandlerKey, handler: Handler) -> Option<Handler> {
        self.handlers.insert(key, handler)
    }

    #[must_use]
    pub fn handler(&self, key: HandlerKey) -> Option<&Handler> {
        self.handlers.get(&key)
    }

    #[must_use]
    pub fn contains(&self, key: HandlerKey) -> bool {
        self.handlers.contains_key(&key)
    }

    pub fn keys(&self) -> impl Iterator<Item = HandlerKey> + '_ {
        self.handlers.keys().copied()
    }

    /// First key bound to a [`Handler::Stream`], in verb order.
    #[must_use]
    pub fn streaming_key(&self) -> Option<HandlerKey> {
        Verb::ALL
            .into_iter()
            .flat_map(|verb| [HandlerKey::collection(verb), HandlerKey::member(verb)])
            .find(|key| self.handlers.get(key).is_some_and(Handler::is_stream))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl FromIterator<(HandlerKey, Handler)> for HandlerSet {
    fn from_iter<T: IntoIterator<Item = (HandlerKey, Handler)>>(iter: T) -> Self {
        Self {
            handlers: iter.into_iter().collect(),
        }
    }
}

impl fmt::Debug for HandlerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self.keys().map(|key| key.to_string()).collect();
        keys.sort();
        f.debug_struct("HandlerSet").field("keys", &keys).finish()
    }
}
