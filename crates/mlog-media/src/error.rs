//! Error types for camera operations.

use std::path::PathBuf;
use thiserror::Error;

use mlog_models::{FaultKind, Resolution};

/// Result type for camera operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while sampling or recording.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Camera binary not found in PATH: {0}")]
    CameraNotFound(String),

    #[error("Camera command failed: {message}")]
    CameraFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("Failed to decode still frame: {0}")]
    DecodeFailed(String),

    #[error("Frame size mismatch: expected {expected}, got {actual}")]
    FrameMismatch {
        expected: Resolution,
        actual: Resolution,
    },

    #[error("Camera is busy recording")]
    RecordingInProgress,

    #[error("Camera is not recording")]
    NotRecording,

    #[error("Recording produced no output at {0}")]
    RecordingMissing(PathBuf),

    #[error("Invalid camera setting: {0}")]
    InvalidSetting(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Create a camera command failure error.
    pub fn camera_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::CameraFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    pub fn decode_failed(message: impl Into<String>) -> Self {
        Self::DecodeFailed(message.into())
    }

    pub fn invalid_setting(message: impl Into<String>) -> Self {
        Self::InvalidSetting(message.into())
    }

    /// Local I/O failures are storage faults; everything else is the camera.
    pub fn fault_kind(&self) -> FaultKind {
        match self {
            MediaError::Io(_) => FaultKind::Storage,
            _ => FaultKind::Hardware,
        }
    }
}
