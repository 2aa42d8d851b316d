//! Runtime error types: everything that can settle an invocation as a failure.

use http::StatusCode;

/// Errors that settle an [`Invocation`](crate::invoke::Invocation) as a failure.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// No registered rule matched the path, or the matched resource does not
    /// implement the verb at the requested cardinality.
    #[error("Route not matched: {path}")]
    RouteNotFound { path: String },

    /// The handler's own error, propagated as-is.
    #[error(transparent)]
    Handler(#[from] anyhow::Error),

    /// The handler panicked while being invoked.
    #[error("handler panicked: {message}")]
    HandlerPanicked { message: String },

    /// Every copy of the callback was dropped without settling it.
    #[error("handler dropped its callback without calling it")]
    CallbackDropped,

    #[error("streaming handler {key} on resource {resource} is not supported")]
    StreamingUnsupported { resource: String, key: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("dispatch timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The inbound adapter could not decode the request body.
    #[error("malformed request body: {0}")]
    MalformedBody(#[source] serde_json::Error),
}

impl DispatchError {
    /// HTTP status an inbound adapter should render this error with.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            DispatchError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            DispatchError::Handler(err) => err
                .downcast_ref::<StatusError>()
                .map_or(StatusCode::INTERNAL_SERVER_ERROR, StatusError::status),
            DispatchError::Transport(_) => StatusCode::BAD_GATEWAY,
            DispatchError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            DispatchError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            DispatchError::HandlerPanicked { .. }
            | DispatchError::CallbackDropped
            | DispatchError::StreamingUnsupported { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True for the expected, recoverable "nothing lives here" outcome.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, DispatchError::RouteNotFound { .. })
    }
}

/// Errors produced by a [`Transport`](crate::transport::Transport).
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Unknown Error: Server returned a status of {}", status.as_u16())]
    Status { status: StatusCode, url: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("could not decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("no remote endpoint configured for {url}")]
    NotConfigured { url: String },
}

/// Handler error that carries the HTTP status the adapter should reply with.
///
/// ```
/// use http::StatusCode;
/// use isopropyl_dispatch::StatusError;
///
/// let err: anyhow::Error = StatusError::new(StatusCode::CONFLICT, "already exists").into();
/// assert_eq!(err.to_string(), "already exists");
/// ```
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct StatusError {
    status: StatusCode,
    message: String,
}

impl StatusError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }
}
