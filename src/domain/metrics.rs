use super::error::ErrorCategory;
use super::models::CeremonyKind;
use std::sync::Arc;

/// Abstraction for application metrics (counters).
pub trait Metrics: Send + Sync + 'static {
    // ---
    /// Render current metrics in Prometheus text format.
    fn render(&self) -> String;

    /// Record that ceremony options were issued.
    fn record_ceremony_started(&self, kind: CeremonyKind);

    /// Record a ceremony that finished successfully.
    fn record_ceremony_completed(&self, kind: CeremonyKind);

    /// Record a rejected begin or finish call.
    fn record_ceremony_rejected(&self, kind: CeremonyKind, category: ErrorCategory);
}

/// Type alias for any backend that implements Metrics.
pub type MetricsPtr = Arc<dyn Metrics>;
