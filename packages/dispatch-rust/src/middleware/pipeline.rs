//! Pipeline composition: wraps the router with the dispatch middleware layers.

use tower::ServiceBuilder;

use super::metrics::{MetricsLayer, MetricsService};
use super::timeout::{TimeoutLayer, TimeoutService};
use crate::config::IsopropylConfig;
use crate::router::Router;

/// The composed dispatch service produced by [`build_dispatch_pipeline`].
pub type DispatchPipeline = TimeoutService<MetricsService<Router>>;

/// Build the dispatch pipeline by wrapping the `Router` with middleware layers.
///
/// Layer order (outermost to innermost):
/// 1. `TimeoutLayer` -- enforce `config.dispatch_timeout`, if set
/// 2. `MetricsLayer` -- record timing and outcome (closest to the router)
///
/// The returned service implements `tower::Service<InboundRequest>` and is
/// cheap to clone.
#[must_use]
pub fn build_dispatch_pipeline(router: Router, config: &IsopropylConfig) -> DispatchPipeline {
    ServiceBuilder::new()
        .layer(TimeoutLayer::new(config.dispatch_timeout))
        .layer(MetricsLayer)
        .service(router)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
