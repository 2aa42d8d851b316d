//! Service invoker: turns any handler convention into one [`Invocation`].
//!
//! The handler is called eagerly, inside a panic boundary, when [`invoke`]
//! runs. Only settlement is deferred: an `Invocation` that is already settled
//! completes on its first poll, an adopted future is polled through, and a
//! callback-style handler completes when its [`Callback`] fires.
//!
//! State machine per invocation: `Pending -> Resolved | Rejected`. Terminal
//! states are absorbing; a settled invocation never changes outcome.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::task::{Context, Poll};

use isopropyl_core::{HandlerKey, Request};
use futures_util::FutureExt;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::error::DispatchError;
use crate::handler::{BoxFuture, Callback, Handler, HandlerResult};

/// Uniform eventual result of a dispatched operation.
#[must_use = "an invocation does nothing unless awaited"]
pub struct Invocation {
    state: State,
}

enum State {
    Settled(Option<Result<Value, DispatchError>>),
    Adopted(BoxFuture<'static, Result<Value, DispatchError>>),
    AwaitingCallback(oneshot::Receiver<HandlerResult>),
}

impl Invocation {
    /// An invocation that resolves with `value`.
    pub fn resolved(value: Value) -> Self {
        Self::settled(Ok(value))
    }

    /// An invocation that rejects with `error`.
    pub fn rejected(error: DispatchError) -> Self {
        Self::settled(Err(error))
    }

    fn settled(result: Result<Value, DispatchError>) -> Self {
        Self {
            state: State::Settled(Some(result)),
        }
    }

    /// An invocation that settles when `future` does.
    pub fn adopt<F>(future: F) -> Self
    where
        F: Future<Output = Result<Value, DispatchError>> + Send + 'static,
    {
        Self {
            state: State::Adopted(Box::pin(future)),
        }
    }

    fn awaiting(rx: oneshot::Receiver<HandlerResult>) -> Self {
        Self {
            state: State::AwaitingCallback(rx),
        }
    }

    /// True when the outcome is already known without polling.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        matches!(self.state, State::Settled(_))
    }
}

impl Future for Invocation {
    type Output = Result<Value, DispatchError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().state {
            State::Settled(slot) => {
                Poll::Ready(slot.take().expect("Invocation polled after completion"))
            }
            State::Adopted(future) => future.as_mut().poll(cx),
            State::AwaitingCallback(rx) => Pin::new(rx).poll(cx).map(|received| match received {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(err)) => Err(DispatchError::Handler(err)),
                Err(_) => Err(DispatchError::CallbackDropped),
            }),
        }
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state {
            State::Settled(_) => "settled",
            State::Adopted(_) => "adopted",
            State::AwaitingCallback(_) => "awaiting_callback",
        };
        f.debug_struct("Invocation").field("state", &state).finish()
    }
}

// ---------------------------------------------------------------------------
// invoke
// ---------------------------------------------------------------------------

/// Invokes `handler` with `request` and normalises its outcome.
///
/// `key` identifies the handler in logs and errors. Stream handlers are not
/// called; the invocation rejects with
/// [`DispatchError::StreamingUnsupported`].
pub fn invoke(handler: &Handler, key: HandlerKey, request: Request) -> Invocation {
    tracing::debug!(
        resource = %request.resource,
        %key,
        convention = handler.convention(),
        "executing handler"
    );

    match handler {
        Handler::Sync(f) => match catch_unwind(AssertUnwindSafe(|| f(request))) {
            Ok(Ok(value)) => Invocation::resolved(value),
            Ok(Err(err)) => Invocation::rejected(DispatchError::Handler(err)),
            Err(payload) => Invocation::rejected(panicked(&*payload)),
        },
        Handler::Callback(f) => {
            let (callback, rx) = Callback::channel();
            let boundary = callback.clone();
            match catch_unwind(AssertUnwindSafe(|| f(request, callback))) {
                Ok(()) => Invocation::awaiting(rx),
                // first settlement wins, a panic included
                Err(payload) if boundary.close() => Invocation::rejected(panicked(&*payload)),
                Err(payload) => {
                    tracing::debug!(
                        message = %panic_message(&*payload),
                        "handler panicked after settling, ignored"
                    );
                    Invocation::awaiting(rx)
                }
            }
        }
        Handler::Eventual(f) => match catch_unwind(AssertUnwindSafe(|| f(request))) {
            Ok(future) => Invocation::adopt(async move {
                match AssertUnwindSafe(future).catch_unwind().await {
                    Ok(result) => result.map_err(DispatchError::Handler),
                    Err(payload) => Err(panicked(&*payload)),
                }
            }),
            Err(payload) => Invocation::rejected(panicked(&*payload)),
        },
        Handler::Stream(_) => {
            tracing::warn!(
                resource = %request.resource,
                %key,
                "streaming handler reached the invoker, rejecting"
            );
            Invocation::rejected(DispatchError::StreamingUnsupported {
                resource: request.resource,
                key: key.to_string(),
            })
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

fn panicked(payload: &(dyn Any + Send)) -> DispatchError {
    let message = panic_message(payload);
    tracing::warn!(%message, "handler panicked");
    DispatchError::HandlerPanicked { message }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use isopropyl_core::{Params, Query, Verb};
    use serde_json::json;

    use super::*;

    fn request() -> Request {
        Request::new(
            Verb::Get,
            "articles",
            "/api/articles",
            Params::new(),
            Query::new(),
            Value::Null,
        )
    }

    fn key() -> HandlerKey {
        HandlerKey::collection(Verb::Get)
    }

    fn handler_message(result: Result<Value, DispatchError>) -> String {
        match result {
            Err(DispatchError::Handler(err)) => err.to_string(),
            other => panic!("expected a handler error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn sync_value_resolves() {
        let invocation = invoke(&Handler::sync(|_| Ok(json!({"a": 1}))), key(), request());
        assert!(invocation.is_settled());
        assert_eq!(invocation.await.unwrap(), json!({"a": 1}));
    }

    #[tokio::test]
    async fn eventual_value_resolves() {
        let handler = Handler::eventual(|_| async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            Ok(json!("later"))
        });
        assert_eq!(invoke(&handler, key(), request()).await.unwrap(), json!("later"));
    }

    #[tokio::test]
    async fn callback_value_resolves() {
        let handler = Handler::callback(|_, callback| {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                callback.resolve(json!([1, 2, 3]));
            });
        });
        assert_eq!(invoke(&handler, key(), request()).await.unwrap(), json!([1, 2, 3]));
    }

    #[tokio::test]
    async fn sync_error_rejects_verbatim() {
        let handler = Handler::sync(|_| Err(anyhow::anyhow!("Oh my!")));
        assert_eq!(handler_message(invoke(&handler, key(), request()).await), "Oh my!");
    }

    #[tokio::test]
    async fn eventual_error_rejects_verbatim() {
        let handler = Handler::eventual(|_| async { Err(anyhow::anyhow!("rejected")) });
        assert_eq!(handler_message(invoke(&handler, key(), request()).await), "rejected");
    }

    #[tokio::test]
    async fn callback_error_rejects_verbatim() {
        let handler = Handler::callback(|_, callback| {
            callback.reject(anyhow::anyhow!("callback failed"));
        });
        assert_eq!(
            handler_message(invoke(&handler, key(), request()).await),
            "callback failed"
        );
    }

    #[tokio::test]
    async fn sync_panic_is_caught() {
        let handler = Handler::sync(|_| panic!("boom"));
        let err = invoke(&handler, key(), request()).await.unwrap_err();
        assert!(matches!(err, DispatchError::HandlerPanicked { message } if message == "boom"));
    }

    #[tokio::test]
    async fn callback_panic_is_caught() {
        let handler = Handler::callback(|req, _| panic!("bad {}", req.resource));
        let err = invoke(&handler, key(), request()).await.unwrap_err();
        assert!(
            matches!(err, DispatchError::HandlerPanicked { message } if message == "bad articles")
        );
    }

    #[tokio::test]
    async fn dropped_callback_rejects() {
        let handler = Handler::callback(|_, callback| drop(callback));
        let err = invoke(&handler, key(), request()).await.unwrap_err();
        assert!(matches!(err, DispatchError::CallbackDropped));
    }

    #[tokio::test]
    async fn double_settlement_keeps_first_outcome() {
        let settled = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&settled);
        let handler = Handler::callback(move |_, callback| {
            for value in 0..3 {
                if callback.resolve(json!(value)) {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
            }
            callback.reject(anyhow::anyhow!("ignored"));
        });

        assert_eq!(invoke(&handler, key(), request()).await.unwrap(), json!(0));
        assert_eq!(settled.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn panic_after_settlement_keeps_settled_value() {
        let handler = Handler::callback(|_, callback| {
            callback.resolve(json!("settled"));
            panic!("after settle");
        });
        assert_eq!(invoke(&handler, key(), request()).await.unwrap(), json!("settled"));
    }

    #[tokio::test]
    async fn panic_before_settlement_ignores_late_callback() {
        let late = Arc::new(parking_lot::Mutex::new(None));
        let slot = Arc::clone(&late);
        let handler = Handler::callback(move |_, callback| {
            *slot.lock() = Some(callback);
            panic!("early");
        });

        let invocation = invoke(&handler, key(), request());
        let callback = late.lock().take().unwrap();
        assert!(!callback.resolve(json!("too late")));

        let err = invocation.await.unwrap_err();
        assert!(matches!(err, DispatchError::HandlerPanicked { message } if message == "early"));
    }

    #[tokio::test]
    async fn eventual_panic_is_caught() {
        async fn panics_when_polled() -> HandlerResult {
            tokio::task::yield_now().await;
            panic!("inside future")
        }

        let handler = Handler::eventual(|_| panics_when_polled());
        let err = invoke(&handler, key(), request()).await.unwrap_err();
        assert!(
            matches!(err, DispatchError::HandlerPanicked { message } if message == "inside future")
        );
    }

    #[tokio::test]
    async fn handler_runs_before_first_poll() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let handler = Handler::sync(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Null)
        });

        let invocation = invoke(&handler, key(), request());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        invocation.await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stream_handler_is_never_called() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let handler = Handler::stream(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            futures_util::stream::iter([Ok(json!(1))])
        });

        let err = invoke(&handler, HandlerKey::member(Verb::Get), request())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::StreamingUnsupported { ref resource, ref key }
                if resource == "articles" && key == "getOne"
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
