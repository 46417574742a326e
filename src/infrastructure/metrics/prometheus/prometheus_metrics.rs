//! Prometheus metrics implementation.
//!
//! Counters are registered in the global `metrics` registry on first use and
//! rendered through the handle kept in `recorder.rs`.

use crate::domain::{CeremonyKind, ErrorCategory, Metrics};

/// Prometheus-backed ceremony metrics.
///
/// Holds no state of its own; see the global registry.
pub struct PrometheusMetrics {}

impl PrometheusMetrics {
    pub fn new() -> Self {
        tracing::info!("Creating Prometheus metrics");
        PrometheusMetrics {}
    }
}

impl Metrics for PrometheusMetrics {
    fn render(&self) -> String {
        super::render_metrics()
    }

    fn record_ceremony_started(&self, kind: CeremonyKind) {
        tracing::debug!("Recording {} ceremony started", kind);
        super::increment_started(kind);
    }

    fn record_ceremony_completed(&self, kind: CeremonyKind) {
        tracing::debug!("Recording {} ceremony completed", kind);
        super::increment_completed(kind);
    }

    fn record_ceremony_rejected(&self, kind: CeremonyKind, category: ErrorCategory) {
        tracing::debug!("Recording {} ceremony rejected ({})", kind, category.as_str());
        super::increment_rejected(kind, category);
    }
}
