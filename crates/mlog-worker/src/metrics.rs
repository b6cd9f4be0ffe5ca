//! Pipeline metrics.

use std::net::SocketAddr;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use mlog_models::FaultKind;

use crate::error::{WorkerError, WorkerResult};
use crate::pipeline::PipelineState;

/// Metric names as constants for consistency.
pub mod names {
    pub const CYCLES_TOTAL: &str = "motionlog_cycles_total";
    pub const CYCLE_FAULTS_TOTAL: &str = "motionlog_cycle_faults_total";
    pub const CLIPS_UPLOADED_TOTAL: &str = "motionlog_clips_uploaded_total";
    pub const DAYS_EVICTED_TOTAL: &str = "motionlog_days_evicted_total";
    pub const RETENTION_DAYS: &str = "motionlog_retention_days";
    pub const DETECTION_WAIT_SECONDS: &str = "motionlog_detection_wait_seconds";
}

/// Install the Prometheus recorder with an HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> WorkerResult<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| WorkerError::config_error(format!("Failed to start metrics listener: {}", e)))
}

pub fn record_cycle() {
    counter!(names::CYCLES_TOTAL).increment(1);
}

pub fn record_fault(phase: PipelineState, fault: FaultKind) {
    counter!(
        names::CYCLE_FAULTS_TOTAL,
        "phase" => phase.as_str(),
        "fault" => fault.as_str()
    )
    .increment(1);
}

pub fn record_upload() {
    counter!(names::CLIPS_UPLOADED_TOTAL).increment(1);
}

pub fn record_eviction() {
    counter!(names::DAYS_EVICTED_TOTAL).increment(1);
}

pub fn set_retention_days(days: usize) {
    gauge!(names::RETENTION_DAYS).set(days as f64);
}

pub fn record_detection_wait(secs: f64) {
    histogram!(names::DETECTION_WAIT_SECONDS).record(secs);
}
