//! Structured cycle logging utilities.
//!
//! Provides consistent, structured logging for pipeline cycles with
//! tracing spans and contextual information.

use mlog_models::FaultKind;
use tracing::{error, info, warn, Span};

use crate::pipeline::PipelineState;

/// Cycle logger for structured logging with consistent formatting.
///
/// Every event carries the cycle number, so one motion event can be
/// followed from detection to rotation.
#[derive(Debug, Clone)]
pub struct CycleLogger {
    cycle: u64,
}

impl CycleLogger {
    pub fn new(cycle: u64) -> Self {
        Self { cycle }
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Log entry into a phase.
    pub fn log_phase(&self, phase: PipelineState, message: &str) {
        info!(
            cycle = self.cycle,
            phase = %phase,
            "{}", message
        );
    }

    /// Log a warning during a cycle.
    pub fn log_warning(&self, phase: PipelineState, message: &str) {
        warn!(
            cycle = self.cycle,
            phase = %phase,
            "Cycle warning: {}", message
        );
    }

    /// Log a cycle fault. The loop carries on afterwards.
    pub fn log_fault(&self, phase: PipelineState, fault: FaultKind, message: &str) {
        error!(
            cycle = self.cycle,
            phase = %phase,
            fault = %fault,
            "Cycle failed: {}", message
        );
    }

    /// Log the completion of a cycle.
    pub fn log_completion(&self, message: &str) {
        info!(cycle = self.cycle, "Cycle completed: {}", message);
    }

    /// Create a tracing span for this cycle.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("cycle", cycle = self.cycle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_logger_creation() {
        let logger = CycleLogger::new(7);
        assert_eq!(logger.cycle(), 7);
    }

    #[test]
    fn test_logging_without_subscriber() {
        let logger = CycleLogger::new(1);
        let _guard = logger.create_span().entered();
        logger.log_phase(PipelineState::Detecting, "waiting for motion");
        logger.log_fault(PipelineState::Uploading, FaultKind::Transport, "timed out");
        logger.log_completion("done");
    }
}
