//! snipx sandbox - snippet execution backends
//!
//! Runs caller-supplied snippets against a persistent embedded Python
//! session or an external shell interpreter, and answers with the uniform
//! [`ExecutionResult`] from `snipx-common` either way.
//!
//! This is not a security sandbox: there is no isolation beyond process
//! boundaries and no built-in resource limits.

mod config;
mod encoding;
mod error;
mod execution;
mod platform;
mod runtime;
mod service;
mod staging;

pub use config::{ProgramConfig, SandboxConfig};
pub use encoding::EncodingNormalizer;
pub use error::SandboxError;
pub use execution::ExecutionId;
pub use platform::{HostPlatform, ScriptPlan, ScriptPlatform, UnixPlatform, WindowsPlatform};
pub use runtime::{InterpreterExecutor, InterpreterSession, ProcessScriptExecutor, Runtime};
pub use service::SandboxService;
pub use staging::TempScript;

pub use snipx_common::{ExecutionRequest, ExecutionResult, RuntimeKind, Status};

/// Result alias for sandbox operations
pub type Result<T> = std::result::Result<T, SandboxError>;
