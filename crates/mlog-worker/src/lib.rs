//! Motion-triggered capture pipeline.
//!
//! This crate provides:
//! - Environment-driven configuration
//! - The retention log of uploaded days
//! - The pipeline controller (detect, record, index, upload, rotate)
//! - Cycle logging and metrics

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod retention;

pub use config::WorkerConfig;
pub use error::{CycleError, WorkerError, WorkerResult};
pub use logging::CycleLogger;
pub use pipeline::{Clock, Pipeline, PipelineState};
pub use retention::RetentionLog;
