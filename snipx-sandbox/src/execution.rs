//! Execution identifiers and lifecycle stages

use serde::{Deserialize, Serialize};

/// Unique execution identifier, used to correlate log lines of one call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutionId(pub uuid::Uuid);

impl ExecutionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ExecutionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of one subprocess execution
///
/// `Staged -> Launched -> Draining -> Reaped -> Cleaned`. A staging failure
/// goes straight to `Cleaned`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExecutionStage {
    Staged,
    Launched,
    Draining,
    Reaped,
    Cleaned,
}

impl ExecutionStage {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            ExecutionStage::Staged => "staged",
            ExecutionStage::Launched => "launched",
            ExecutionStage::Draining => "draining",
            ExecutionStage::Reaped => "reaped",
            ExecutionStage::Cleaned => "cleaned",
        }
    }
}

impl std::fmt::Display for ExecutionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
