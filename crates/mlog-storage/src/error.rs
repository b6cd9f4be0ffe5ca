//! Storage error types.

use mlog_models::FaultKind;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Failed to configure storage client: {0}")]
    ConfigError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Request failed with status {status}: {message}")]
    RequestFailed { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub fn auth_error(msg: impl Into<String>) -> Self {
        Self::AuthError(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Map a non-success HTTP status to an error.
    pub fn from_http_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Self::AuthError(message),
            404 => Self::NotFound(message),
            _ => Self::RequestFailed { status, message },
        }
    }

    /// Fault category of this error.
    pub fn fault_kind(&self) -> FaultKind {
        match self {
            StorageError::AuthError(_) => FaultKind::Auth,
            StorageError::ConfigError(_) | StorageError::Io(_) => FaultKind::Storage,
            _ => FaultKind::Transport,
        }
    }
}
