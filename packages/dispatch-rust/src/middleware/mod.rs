//! Tower middleware layers for the dispatch pipeline.
//!
//! - [`timeout`]: Optional deadline on routed dispatches
//! - [`metrics`]: Dispatch timing and outcome via `tracing` spans
//! - [`pipeline`]: Composes the layers around a [`Router`](crate::Router)

pub mod metrics;
pub mod pipeline;
pub mod timeout;

pub use metrics::MetricsLayer;
pub use pipeline::{build_dispatch_pipeline, DispatchPipeline};
pub use timeout::TimeoutLayer;
