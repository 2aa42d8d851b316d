//! Axum handlers for the inbound adapter.
//!
//! Defines `AppState` (the shared state carried through axum extractors)
//! and re-exports the handler functions used when building the router.

pub mod dispatch;
pub mod health;

pub use dispatch::dispatch_handler;
pub use health::{health_handler, liveness_handler, readiness_handler};

use std::sync::Arc;
use std::time::Instant;

use super::ShutdownController;
use crate::middleware::DispatchPipeline;
use crate::registry::Registry;

/// Shared application state passed to all axum handlers via `State` extraction.
///
/// Every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Registered resources; supplies the transport prefix and resource count.
    pub registry: Registry,
    /// Router wrapped in the dispatch middleware.
    pub pipeline: DispatchPipeline,
    /// Health state reported by the probes.
    pub shutdown: Arc<ShutdownController>,
    /// Server process start time, used for uptime calculation.
    pub start_time: Instant,
}
