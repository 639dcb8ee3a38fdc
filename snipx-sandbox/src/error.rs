//! Error types for the sandbox

use std::path::PathBuf;

/// Sandbox errors
///
/// Only [`SandboxError::InterpreterInit`] and [`SandboxError::Config`] reach
/// callers of [`crate::SandboxService`]. The remaining variants describe
/// failures inside one execution and are folded into an error result.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    /// The embedded interpreter session could not be created
    #[error("Failed to initialize embedded interpreter: {0}")]
    InterpreterInit(String),

    /// The temporary script could not be written or permissioned
    #[error("Failed to stage script in {dir}: {source}")]
    Staging {
        /// Directory the script was staged into
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The interpreter process could not be started
    #[error("Failed to launch `{program}`: {source}")]
    Launch {
        /// Program that failed to start
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on or reading from the child process failed
    #[error("Failed to collect process output: {0}")]
    Wait(#[source] std::io::Error),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SandboxError {
    /// Whether this error must abort the caller instead of becoming a result
    pub fn is_fatal(&self) -> bool {
        matches!(self, SandboxError::InterpreterInit(_) | SandboxError::Config(_))
    }
}
