//! Application state management.
//!
//! Defines the state passed to all Axum handlers via the `State` extractor.
//! Everything a handler needs is reachable through the ceremony service, so
//! the state is a single `Arc` and cheap to clone per request.

use crate::ceremony::CeremonyService;
use crate::domain::MetricsPtr;
use std::sync::Arc;

/// Shared application state passed to all Axum handlers.
///
/// Built once in `create_router()` and never mutated afterwards. Handlers
/// depend on the service's operations, not on concrete backends.
#[derive(Clone)]
pub(crate) struct AppState {
    /// Ceremony engine: challenges, verification and session binding.
    service: Arc<CeremonyService>,
}

impl AppState {
    // ---
    pub fn new(service: Arc<CeremonyService>) -> Self {
        AppState { service }
    }

    pub(crate) fn service(&self) -> &CeremonyService {
        // ---
        &self.service
    }

    pub(crate) fn metrics(&self) -> &MetricsPtr {
        // ---
        self.service.metrics()
    }
}
