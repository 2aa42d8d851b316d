//! Request values passed to handlers and to the transport client.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::verb::Verb;

/// Content type carried by every request the engine builds.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Body encoding marker carried alongside [`JSON_CONTENT_TYPE`].
pub const JSON_BODY_TYPE: &str = "json";

/// Identifier bindings: segment token -> identifier value.
pub type Params = BTreeMap<String, String>;

/// Query parameters. Repeated keys collapse to the last value.
pub type Query = BTreeMap<String, String>;

/// An identifier value supplied for one segment of a resource name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ResourceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ResourceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<&String> for ResourceId {
    fn from(value: &String) -> Self {
        Self(value.clone())
    }
}

macro_rules! resource_id_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ResourceId {
                fn from(value: $ty) -> Self {
                    Self(value.to_string())
                }
            }
        )*
    };
}

resource_id_from_int!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

/// The canonical in-flight request handed to handlers and to the transport.
///
/// Serialises with the wire field names (`contentType`, `type`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// Dotted resource name the request was resolved to.
    pub resource: String,
    /// Derived URI (descriptor calls) or the inbound path (routed calls).
    pub url: String,
    /// Identifier bindings by segment token.
    pub params: Params,
    pub content_type: String,
    #[serde(rename = "type")]
    pub body_type: String,
    /// Payload. `Null` when the operation carries no body.
    pub body: Value,
    pub method: Verb,
    pub query: Query,
}

impl Request {
    /// Builds a JSON request with the standard content markers.
    #[must_use]
    pub fn new(
        method: Verb,
        resource: impl Into<String>,
        url: impl Into<String>,
        params: Params,
        query: Query,
        body: Value,
    ) -> Self {
        Self {
            resource: resource.into(),
            url: url.into(),
            params,
            content_type: JSON_CONTENT_TYPE.to_string(),
            body_type: JSON_BODY_TYPE.to_string(),
            body,
            method,
            query,
        }
    }
}

/// What an inbound adapter hands the router: `{ path, method, query, body }`.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundRequest {
    /// Path relative to the transport prefix, optionally with a query string.
    pub path: String,
    /// HTTP method name, any case.
    pub method: String,
    pub query: Query,
    pub body: Value,
}

impl InboundRequest {
    #[must_use]
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: method.into(),
            query: Query::new(),
            body: Value::Null,
        }
    }

    #[must_use]
    pub fn with_query(mut self, query: Query) -> Self {
        self.query = query;
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }
}
