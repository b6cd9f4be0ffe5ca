//! Drive request metrics.

use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Total Drive requests by operation and status.
    pub const REQUESTS_TOTAL: &str = "motionlog_drive_requests_total";

    /// Request latency in seconds by operation.
    pub const LATENCY_SECONDS: &str = "motionlog_drive_latency_seconds";
}

/// Record metrics for a completed Drive request.
pub fn record_request(operation: &'static str, status: u16, latency_secs: f64) {
    counter!(
        names::REQUESTS_TOTAL,
        "operation" => operation,
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(names::LATENCY_SECONDS, "operation" => operation).record(latency_secs);
}
