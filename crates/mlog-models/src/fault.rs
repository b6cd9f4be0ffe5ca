//! Fault taxonomy shared across crates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse fault category used for logging and exit decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// Camera unavailable or busy.
    Hardware,
    /// Remote storage unreachable or rejected a request.
    Transport,
    /// Credential invalid or expired.
    Auth,
    /// Local disk full or unwritable.
    Storage,
}

impl FaultKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultKind::Hardware => "hardware_fault",
            FaultKind::Transport => "transport_fault",
            FaultKind::Auth => "auth_fault",
            FaultKind::Storage => "storage_fault",
        }
    }

    /// Auth faults end the process; everything else is scoped to one cycle.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FaultKind::Auth)
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
