//! Server health state, transitioned across the serve lifecycle.

use parking_lot::RwLock;

/// Server health state.
///
/// State machine: Starting -> Ready -> Draining -> Stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    /// Listener bound, not yet serving.
    Starting,
    /// Serving requests.
    Ready,
    /// Shutdown signalled, finishing in-flight requests.
    Draining,
    /// Server has stopped.
    Stopped,
}

impl HealthState {
    /// Lowercase name used in the health endpoint.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HealthState::Starting => "starting",
            HealthState::Ready => "ready",
            HealthState::Draining => "draining",
            HealthState::Stopped => "stopped",
        }
    }
}

/// Tracks the server's [`HealthState`] for the health endpoints.
#[derive(Debug)]
pub struct ShutdownController {
    state: RwLock<HealthState>,
}

impl ShutdownController {
    /// Creates a new controller in the `Starting` state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(HealthState::Starting),
        }
    }

    pub fn set_ready(&self) {
        *self.state.write() = HealthState::Ready;
    }

    /// Moves to `Draining`. New requests are still answered until the
    /// listener closes.
    pub fn trigger_shutdown(&self) {
        *self.state.write() = HealthState::Draining;
    }

    pub fn set_stopped(&self) {
        *self.state.write() = HealthState::Stopped;
    }

    #[must_use]
    pub fn health_state(&self) -> HealthState {
        *self.state.read()
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_in_starting_state() {
        assert_eq!(ShutdownController::new().health_state(), HealthState::Starting);
    }

    #[test]
    fn transitions_through_lifecycle() {
        let ctrl = ShutdownController::new();
        ctrl.set_ready();
        assert_eq!(ctrl.health_state(), HealthState::Ready);
        ctrl.trigger_shutdown();
        assert_eq!(ctrl.health_state(), HealthState::Draining);
        ctrl.set_stopped();
        assert_eq!(ctrl.health_state().as_str(), "stopped");
    }
}
