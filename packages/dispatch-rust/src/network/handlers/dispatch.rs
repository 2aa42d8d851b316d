//! Fallback handler that feeds HTTP requests into the dispatch pipeline.
//!
//! The transport prefix is stripped from the path, the JSON body decoded,
//! and the pipeline's outcome rendered: resolved values as `200` JSON,
//! errors as `{"error": message}` with [`DispatchError::status_code`].

use axum::extract::State;
use axum::http::uri::PathAndQuery;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use isopropyl_core::InboundRequest;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::AppState;
use crate::error::DispatchError;

/// Dispatches any request no other route claimed.
pub async fn dispatch_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    let target = uri.path_and_query().map_or(uri.path(), PathAndQuery::as_str);

    let Some(path) = strip_prefix(target, state.registry.xhr_path()) else {
        tracing::debug!(path = uri.path(), prefix = state.registry.xhr_path(), "outside transport prefix");
        return DispatchError::RouteNotFound {
            path: uri.path().to_string(),
        }
        .into_response();
    };

    let body = match decode_body(&body) {
        Ok(body) => body,
        Err(err) => return err.into_response(),
    };

    let request = InboundRequest::new(method.as_str(), path).with_body(body);

    match state.pipeline.clone().oneshot(request).await {
        Ok(value) => (StatusCode::OK, Json(value)).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Strips `prefix` from `target` on a segment boundary.
///
/// An empty prefix (or `/`) accepts every path.
fn strip_prefix<'a>(target: &'a str, prefix: &str) -> Option<&'a str> {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return Some(target);
    }

    let rest = target.strip_prefix(prefix)?;
    if rest.is_empty() || rest.starts_with('/') || rest.starts_with('?') {
        Some(rest)
    } else {
        None
    }
}

/// Empty bodies decode to `null`.
fn decode_body(body: &[u8]) -> Result<Value, DispatchError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(DispatchError::MalformedBody)
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %self, "dispatch failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "dispatch rejected");
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
