mod counters;
mod prometheus_metrics;
mod recorder;

pub use prometheus_metrics::PrometheusMetrics;
use std::sync::Arc;

pub(crate) use counters::{increment_completed, increment_rejected, increment_started};
pub(crate) use recorder::{init_metrics, render_metrics};

/// Creates a Prometheus metrics implementation, installing the global
/// recorder if this process has not done so yet.
pub fn create() -> anyhow::Result<crate::domain::MetricsPtr> {
    tracing::info!("Initializing Prometheus metrics");
    init_metrics()?;

    Ok(Arc::new(PrometheusMetrics::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CeremonyKind, ErrorCategory};

    #[test]
    fn create_is_repeatable_and_renders_counters() {
        // ---
        let first = create().unwrap();
        let second = create().unwrap();

        first.record_ceremony_started(CeremonyKind::Registration);
        second.record_ceremony_rejected(
            CeremonyKind::Authentication,
            ErrorCategory::SecurityInvariant,
        );

        let text = first.render();
        assert!(text.contains("ceremonies_started_total"));
        assert!(text.contains("ceremonies_rejected_total"));
        assert!(text.contains("clone_detections_total"));
    }
}
