//! Isopropyl Dispatch: one set of resource handlers, invoked the same way
//! in-process and over HTTP.
//!
//! - [`Registry`] / [`RegistryBuilder`]: register named handler sets, look up
//!   [`Resource`] descriptors.
//! - [`Router`]: matches inbound paths against registered route rules.
//! - [`invoke`]: normalises every [`Handler`] convention into an
//!   [`Invocation`].
//! - [`Transport`]: reaches resources that are not registered locally.
//! - [`network`]: the axum adapter serving a registry over HTTP.

pub mod config;
pub mod error;
pub mod handler;
pub mod invoke;
pub mod middleware;
pub mod network;
pub mod registry;
pub mod resource;
pub mod router;
pub mod telemetry;
pub mod transport;

pub use config::{IsopropylConfig, TransportConfig};
pub use error::{DispatchError, StatusError, TransportError};
pub use handler::{BoxFuture, Callback, Handler, HandlerResult, HandlerSet};
pub use invoke::{invoke, Invocation};
pub use registry::{Registry, RegistryBuilder};
pub use resource::{Resource, ResourceOptions};
pub use router::Router;
pub use transport::{DetachedTransport, HttpTransport, Transport};

pub use isopropyl_core::{
    Cardinality, HandlerKey, InboundRequest, Params, Query, Request, ResourceError, ResourceId,
    ResourceName, Verb,
};
