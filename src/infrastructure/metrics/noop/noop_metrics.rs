use crate::domain::{CeremonyKind, ErrorCategory, Metrics};

/// No-op metrics implementation for testing.
pub struct NoopMetrics;

impl NoopMetrics {
    pub fn new() -> Self {
        NoopMetrics
    }
}

impl Metrics for NoopMetrics {
    // ---
    fn render(&self) -> String {
        String::new()
    }
    fn record_ceremony_started(&self, _: CeremonyKind) {}
    fn record_ceremony_completed(&self, _: CeremonyKind) {}
    fn record_ceremony_rejected(&self, _: CeremonyKind, _: ErrorCategory) {}
}
