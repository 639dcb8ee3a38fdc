//! Process-based runtime - stages a snippet as a script and runs an interpreter on it

use crate::config::{ProgramConfig, SandboxConfig};
use crate::encoding::EncodingNormalizer;
use crate::error::SandboxError;
use crate::execution::ExecutionStage;
use crate::platform::{HostPlatform, ScriptPlan, ScriptPlatform};
use crate::staging::TempScript;
use crate::Result;
use async_trait::async_trait;
use snipx_common::{
    precheck, CapturedOutput, ExecutionRequest, ExecutionResult, ExitInfo, RuntimeKind,
};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};

const READ_CHUNK: usize = 8 * 1024;

/// Executes snippets by staging them as temp scripts for an external interpreter
///
/// Holds no state across calls apart from the staging directory, so one
/// instance can serve concurrent executions.
#[derive(Debug, Clone)]
pub struct ProcessScriptExecutor {
    platform: Arc<dyn ScriptPlatform>,
    temp_dir: PathBuf,
    normalizer: EncodingNormalizer,
    drain_grace: Duration,
    inherit_stdin: bool,
    programs: ProgramConfig,
}

impl ProcessScriptExecutor {
    /// Executor for the host platform with default settings
    pub fn new() -> Self {
        let platform = HostPlatform::default();
        Self {
            normalizer: EncodingNormalizer::new(platform.native_encoding()),
            platform: Arc::new(platform),
            temp_dir: std::env::temp_dir(),
            drain_grace: Duration::from_millis(100),
            inherit_stdin: true,
            programs: ProgramConfig::default(),
        }
    }

    /// Executor configured from a [`SandboxConfig`]
    pub fn from_config(config: &SandboxConfig) -> Result<Self> {
        Ok(Self {
            normalizer: config.normalizer()?,
            platform: Arc::new(HostPlatform::default()),
            temp_dir: config.temp_dir(),
            drain_grace: config.drain_grace,
            inherit_stdin: config.inherit_stdin,
            programs: config.programs.clone(),
        })
    }

    /// Use another platform strategy (the normalizer is left unchanged)
    pub fn with_platform(mut self, platform: impl ScriptPlatform + 'static) -> Self {
        self.platform = Arc::new(platform);
        self
    }

    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = dir.into();
        self
    }

    pub fn with_normalizer(mut self, normalizer: EncodingNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_drain_grace(mut self, grace: Duration) -> Self {
        self.drain_grace = grace;
        self
    }

    pub fn with_inherit_stdin(mut self, inherit: bool) -> Self {
        self.inherit_stdin = inherit;
        self
    }

    pub fn with_programs(mut self, programs: ProgramConfig) -> Self {
        self.programs = programs;
        self
    }

    /// Directory scripts are staged in
    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Resolve the script plan for a kind, with program overrides applied
    pub fn plan(&self, kind: RuntimeKind) -> ScriptPlan {
        let plan = self.platform.plan(kind);
        let program = match plan.shell {
            RuntimeKind::Bash => self.programs.bash.as_deref(),
            RuntimeKind::PowerShell => self.programs.powershell.as_deref(),
            RuntimeKind::Batch => self.programs.batch.as_deref(),
            RuntimeKind::Embedded => None,
        };
        plan.with_program(program)
    }

    /// Stage, launch, drain, classify and clean up
    pub async fn run(&self, kind: RuntimeKind, code: &str) -> ExecutionResult {
        if let Some(result) = precheck(code) {
            return result;
        }

        let plan = self.plan(kind);
        let script = match TempScript::stage(&self.temp_dir, &plan, code, &self.normalizer) {
            Ok(script) => script,
            Err(e) => {
                tracing::warn!(
                    runtime = %kind,
                    error = %e,
                    stage = %ExecutionStage::Cleaned,
                    "Staging failed"
                );
                return ExecutionResult::error(e.to_string());
            }
        };
        tracing::debug!(
            runtime = %kind,
            platform = self.platform.name(),
            path = %script.path().display(),
            stage = %ExecutionStage::Staged,
            "Script staged"
        );

        // If this future is dropped mid-flight, `kill_on_drop` stops the child
        // and dropping `script` removes the file.
        let outcome = self.launch_and_collect(&plan, script.path()).await;

        let path = script.path().to_path_buf();
        if script.close().is_ok() {
            tracing::debug!(
                path = %path.display(),
                stage = %ExecutionStage::Cleaned,
                "Script removed"
            );
        }

        match outcome {
            Ok(capture) => capture.into_result(),
            Err(e) => {
                tracing::warn!(runtime = %kind, error = %e, "Execution failed before completion");
                ExecutionResult::error(e.to_string())
            }
        }
    }

    async fn launch_and_collect(&self, plan: &ScriptPlan, script: &Path) -> Result<CapturedOutput> {
        let stdin = if self.inherit_stdin {
            Stdio::inherit()
        } else {
            Stdio::null()
        };

        let child = Command::new(&plan.program)
            .args(&plan.args)
            .arg(script)
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SandboxError::Launch {
                program: plan.program.clone(),
                source,
            })?;
        tracing::debug!(
            command = %plan.command_line(script),
            pid = ?child.id(),
            stage = %ExecutionStage::Launched,
            "Interpreter launched"
        );

        let (status, stdout, stderr) = drain(child, self.drain_grace).await?;
        let exit = exit_info(status);
        tracing::debug!(
            ?exit,
            stdout_bytes = stdout.len(),
            stderr_bytes = stderr.len(),
            stage = %ExecutionStage::Reaped,
            "Interpreter exited"
        );

        Ok(CapturedOutput::new(
            self.normalizer.normalize(&stdout),
            self.normalizer.normalize(&stderr),
            exit,
        ))
    }
}

impl Default for ProcessScriptExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl super::Runtime for ProcessScriptExecutor {
    async fn execute(&self, request: ExecutionRequest) -> ExecutionResult {
        self.run(request.runtime, &request.code).await
    }

    fn name(&self) -> &str {
        "process"
    }
}

/// Read both pipes while waiting for the child
///
/// Both pipes and the exit are awaited in one `select!`, so neither pipe can
/// fill up and block the child while the other is being read. The loop ends
/// once the child has exited and both pipes reached EOF, or at the fixed
/// deadline `grace` after the exit. A background process may keep a pipe
/// open, and keep writing to it, indefinitely.
async fn drain(mut child: Child, grace: Duration) -> Result<(ExitStatus, Vec<u8>, Vec<u8>)> {
    let mut stdout_pipe = child.stdout.take();
    let mut stderr_pipe = child.stderr.take();
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let mut stdout_buf = [0u8; READ_CHUNK];
    let mut stderr_buf = [0u8; READ_CHUNK];
    let mut exit: Option<ExitStatus> = None;

    // Armed once, when the child exits; disabled until then.
    let deadline = tokio::time::sleep(grace);
    tokio::pin!(deadline);

    tracing::trace!(stage = %ExecutionStage::Draining, "Draining output pipes");

    loop {
        if exit.is_some() && stdout_pipe.is_none() && stderr_pipe.is_none() {
            break;
        }

        tokio::select! {
            read = read_chunk(&mut stdout_pipe, &mut stdout_buf), if stdout_pipe.is_some() => {
                match read {
                    Ok(0) => stdout_pipe = None,
                    Ok(n) => stdout.extend_from_slice(&stdout_buf[..n]),
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to read stdout; closing pipe");
                        stdout_pipe = None;
                    }
                }
            }
            read = read_chunk(&mut stderr_pipe, &mut stderr_buf), if stderr_pipe.is_some() => {
                match read {
                    Ok(0) => stderr_pipe = None,
                    Ok(n) => stderr.extend_from_slice(&stderr_buf[..n]),
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to read stderr; closing pipe");
                        stderr_pipe = None;
                    }
                }
            }
            status = child.wait(), if exit.is_none() => {
                exit = Some(status.map_err(SandboxError::Wait)?);
                deadline.as_mut().reset(tokio::time::Instant::now() + grace);
            }
            _ = &mut deadline, if exit.is_some() => {
                tracing::warn!(
                    stdout_open = stdout_pipe.is_some(),
                    stderr_open = stderr_pipe.is_some(),
                    "Output pipe still open after exit; stopped reading"
                );
                break;
            }
        }
    }

    match exit {
        Some(status) => Ok((status, stdout, stderr)),
        None => Err(SandboxError::Wait(std::io::Error::other(
            "process output ended without an exit status",
        ))),
    }
}

async fn read_chunk<R: AsyncRead + Unpin>(
    pipe: &mut Option<R>,
    buf: &mut [u8],
) -> std::io::Result<usize> {
    match pipe {
        Some(reader) => reader.read(buf).await,
        None => std::future::pending().await,
    }
}

fn exit_info(status: ExitStatus) -> ExitInfo {
    if let Some(code) = status.code() {
        return ExitInfo::Exited(code);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return ExitInfo::Signaled(signal);
        }
    }
    ExitInfo::Exited(-1)
}
