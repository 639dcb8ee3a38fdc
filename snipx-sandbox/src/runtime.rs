//! Runtime trait and implementations

mod interpreter;
mod process;

use async_trait::async_trait;
use snipx_common::{ExecutionRequest, ExecutionResult};

pub use interpreter::{InterpreterExecutor, InterpreterSession};
pub use process::ProcessScriptExecutor;

/// Runtime abstraction for executing snippets
///
/// Implementations never fail at the call site: every failure of the
/// snippet, the staging step or the launched process is reported through
/// the returned [`ExecutionResult`].
#[async_trait]
pub trait Runtime: Send + Sync {
    /// Execute a snippet and wait for its result
    async fn execute(&self, request: ExecutionRequest) -> ExecutionResult;

    /// Get runtime name
    fn name(&self) -> &str;
}
