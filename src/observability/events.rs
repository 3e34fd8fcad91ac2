//! Per-call event reporting.

use std::time::Duration;

use crate::observability::metrics;
use crate::upstream::FetchFailure;

/// Sink for the outcome of each image feed call.
pub trait CallEvents: Send + Sync {
    /// A complete image was returned to the caller.
    fn image_served(&self, bytes: usize, elapsed: Duration);

    /// The camera timed out or the connection failed.
    fn upstream_unavailable(&self, failure: &FetchFailure, elapsed: Duration);

    /// The camera answered with a non-OK status.
    fn upstream_rejected(&self, failure: &FetchFailure, elapsed: Duration);
}

/// Production sink: structured logs plus metrics.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEvents;

impl CallEvents for TracingEvents {
    fn image_served(&self, bytes: usize, elapsed: Duration) {
        tracing::debug!(bytes, elapsed_ms = elapsed.as_millis() as u64, "Image served");
        metrics::record_call(metrics::OUTCOME_OK, elapsed);
        metrics::record_image_size(bytes);
    }

    fn upstream_unavailable(&self, failure: &FetchFailure, elapsed: Duration) {
        tracing::warn!(
            kind = ?failure.kind(),
            elapsed_ms = elapsed.as_millis() as u64,
            error = %failure,
            "Camera unavailable"
        );
        metrics::record_call(metrics::OUTCOME_UNAVAILABLE, elapsed);
    }

    fn upstream_rejected(&self, failure: &FetchFailure, elapsed: Duration) {
        tracing::error!(
            kind = ?failure.kind(),
            elapsed_ms = elapsed.as_millis() as u64,
            error = %failure,
            "Camera rejected snapshot request"
        );
        metrics::record_call(metrics::OUTCOME_REJECTED, elapsed);
    }
}
