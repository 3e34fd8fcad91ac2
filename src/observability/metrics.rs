//! Metrics collection and exposition.
//!
//! # Metrics
//! - `feed_calls_total` (counter): calls by outcome (ok, unavailable, rejected)
//! - `feed_call_duration_seconds` (histogram): call latency by outcome
//! - `feed_image_bytes` (histogram): size of served images

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

pub const OUTCOME_OK: &str = "ok";
pub const OUTCOME_UNAVAILABLE: &str = "unavailable";
pub const OUTCOME_REJECTED: &str = "rejected";

/// Install the Prometheus recorder and its HTTP scrape listener.
///
/// Must be called from within the Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    describe_counter!("feed_calls_total", "Image feed calls by outcome");
    describe_histogram!(
        "feed_call_duration_seconds",
        Unit::Seconds,
        "Time spent serving one image feed call"
    );
    describe_histogram!("feed_image_bytes", Unit::Bytes, "Size of images returned to callers");

    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_call(outcome: &'static str, elapsed: Duration) {
    counter!("feed_calls_total", "outcome" => outcome).increment(1);
    histogram!("feed_call_duration_seconds", "outcome" => outcome).record(elapsed.as_secs_f64());
}

pub fn record_image_size(bytes: usize) {
    histogram!("feed_image_bytes").record(bytes as f64);
}
