//! Worker error types.

use mlog_models::FaultKind;
use thiserror::Error;

use crate::pipeline::PipelineState;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    Storage(#[from] mlog_storage::StorageError),

    #[error("Media error: {0}")]
    Media(#[from] mlog_media::MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn fault_kind(&self) -> FaultKind {
        match self {
            WorkerError::Storage(e) => e.fault_kind(),
            WorkerError::Media(e) => e.fault_kind(),
            WorkerError::ConfigError(_) | WorkerError::Io(_) => FaultKind::Storage,
        }
    }
}

/// A fault raised inside one pipeline cycle, tagged with the phase it hit.
#[derive(Debug, Error)]
#[error("{phase} failed: {source}")]
pub struct CycleError {
    pub phase: PipelineState,
    #[source]
    pub source: WorkerError,
}

impl CycleError {
    pub fn new(phase: PipelineState, source: impl Into<WorkerError>) -> Self {
        Self {
            phase,
            source: source.into(),
        }
    }

    pub fn fault_kind(&self) -> FaultKind {
        self.source.fault_kind()
    }
}

/// Tag a result with the phase it came from.
pub(crate) trait InPhase<T> {
    fn in_phase(self, phase: PipelineState) -> Result<T, CycleError>;
}

impl<T, E: Into<WorkerError>> InPhase<T> for Result<T, E> {
    fn in_phase(self, phase: PipelineState) -> Result<T, CycleError> {
        self.map_err(|e| CycleError::new(phase, e))
    }
}
