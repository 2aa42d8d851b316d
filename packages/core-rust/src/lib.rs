//! Isopropyl Core: resource names, handler keys, route rules, and request values.
//!
//! Everything here is synchronous and free of I/O. The asynchronous dispatch
//! engine (router, descriptors, service invoker) lives in `isopropyl-dispatch`.

pub mod error;
pub mod name;
pub mod request;
pub mod route;
pub mod uri;
pub mod verb;

pub use error::ResourceError;
pub use name::ResourceName;
pub use request::{
    InboundRequest, Params, Query, Request, ResourceId, JSON_BODY_TYPE, JSON_CONTENT_TYPE,
};
pub use route::{ParsedPath, PartKind, PathError, RouteMatch, RoutePart, RouteRule, MAX_PATH_SEGMENTS};
pub use uri::ResourcePath;
pub use verb::{Cardinality, HandlerKey, ParseHandlerKeyError, Verb};
