use crate::domain::{CeremonyKind, ErrorCategory};
use metrics::counter;

pub fn increment_started(kind: CeremonyKind) {
    counter!("ceremonies_started_total", "kind" => kind.as_str()).increment(1);
}

pub fn increment_completed(kind: CeremonyKind) {
    counter!("ceremonies_completed_total", "kind" => kind.as_str()).increment(1);
}

/// Rejections are labelled by category, never by the detailed reason.
pub fn increment_rejected(kind: CeremonyKind, category: ErrorCategory) {
    counter!(
        "ceremonies_rejected_total",
        "kind" => kind.as_str(),
        "category" => category.as_str()
    )
    .increment(1);

    if category == ErrorCategory::SecurityInvariant {
        counter!("clone_detections_total").increment(1);
    }
}
