//! Sandbox service - main entry point

use crate::config::SandboxConfig;
use crate::error::SandboxError;
use crate::execution::ExecutionId;
use crate::runtime::{InterpreterExecutor, ProcessScriptExecutor, Runtime};
use crate::Result;
use snipx_common::{precheck, ExecutionRequest, ExecutionResult, RuntimeKind};
use std::time::Instant;
use tokio::sync::OnceCell;

/// Routes requests to the embedded session or the subprocess executor
///
/// The embedded interpreter is only started on the first embedded request;
/// all embedded requests to one service share that session.
pub struct SandboxService {
    interpreter: OnceCell<InterpreterExecutor>,
    process: ProcessScriptExecutor,
}

impl SandboxService {
    /// Create a service from configuration
    pub fn new(config: &SandboxConfig) -> Result<Self> {
        Ok(Self::with_process(ProcessScriptExecutor::from_config(config)?))
    }

    /// Create a service around a preconfigured subprocess executor
    pub fn with_process(process: ProcessScriptExecutor) -> Self {
        Self {
            interpreter: OnceCell::new(),
            process,
        }
    }

    /// Execute a snippet
    ///
    /// Snippet failures are reported inside the [`ExecutionResult`]. `Err` is
    /// reserved for the embedded interpreter failing to start.
    pub async fn execute(&self, request: ExecutionRequest) -> Result<ExecutionResult> {
        self.execute_with_id(ExecutionId::new(), request).await
    }

    /// Execute under a caller-chosen id
    pub async fn execute_with_id(
        &self,
        id: ExecutionId,
        request: ExecutionRequest,
    ) -> Result<ExecutionResult> {
        if let Some(result) = precheck(&request.code) {
            tracing::debug!(execution_id = %id, runtime = %request.runtime, "Empty snippet");
            return Ok(result);
        }

        let runtime = request.runtime;
        tracing::info!(
            execution_id = %id,
            runtime = %runtime,
            code_len = request.code.len(),
            "Executing code"
        );

        let started = Instant::now();
        let result = match runtime {
            RuntimeKind::Embedded => self.interpreter().await?.execute(request).await,
            _ => self.process.execute(request).await,
        };

        tracing::info!(
            execution_id = %id,
            runtime = %runtime,
            status = %result.status(),
            output_len = result.output().len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Execution finished"
        );
        Ok(result)
    }

    /// Name of the backend that handles `kind`
    pub fn runtime_name(&self, kind: RuntimeKind) -> &str {
        match kind {
            RuntimeKind::Embedded => "embedded",
            _ => self.process.name(),
        }
    }

    /// Whether the embedded interpreter has been started
    pub fn interpreter_started(&self) -> bool {
        self.interpreter.initialized()
    }

    pub fn process(&self) -> &ProcessScriptExecutor {
        &self.process
    }

    async fn interpreter(&self) -> Result<&InterpreterExecutor> {
        self.interpreter
            .get_or_try_init(|| async {
                tracing::info!("Starting embedded interpreter");
                tokio::task::spawn_blocking(InterpreterExecutor::new)
                    .await
                    .map_err(|e| SandboxError::InterpreterInit(e.to_string()))?
            })
            .await
    }
}

impl std::fmt::Debug for SandboxService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SandboxService")
            .field("interpreter_started", &self.interpreter_started())
            .field("process", &self.process)
            .finish()
    }
}
