//! Core request/result types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Which execution backend a request targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeKind {
    /// Persistent embedded Python session
    Embedded,
    /// `bash` script run as a subprocess
    Bash,
    /// PowerShell script run as a subprocess
    PowerShell,
    /// Windows batch script run through `cmd.exe`
    Batch,
}

impl RuntimeKind {
    pub const ALL: [RuntimeKind; 4] = [
        RuntimeKind::Embedded,
        RuntimeKind::Bash,
        RuntimeKind::PowerShell,
        RuntimeKind::Batch,
    ];

    /// Whether this kind runs in-process rather than as a subprocess
    pub fn is_embedded(self) -> bool {
        matches!(self, RuntimeKind::Embedded)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RuntimeKind::Embedded => "embedded",
            RuntimeKind::Bash => "bash",
            RuntimeKind::PowerShell => "powershell",
            RuntimeKind::Batch => "batch",
        }
    }
}

impl fmt::Display for RuntimeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a runtime name is not recognized
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown runtime '{0}' (expected embedded, bash, powershell or batch)")]
pub struct ParseRuntimeKindError(pub String);

impl FromStr for RuntimeKind {
    type Err = ParseRuntimeKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "embedded" | "python" => Ok(RuntimeKind::Embedded),
            "bash" | "sh" => Ok(RuntimeKind::Bash),
            "powershell" | "pwsh" => Ok(RuntimeKind::PowerShell),
            "batch" | "cmd" => Ok(RuntimeKind::Batch),
            _ => Err(ParseRuntimeKindError(s.to_string())),
        }
    }
}

/// Request to execute a snippet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// Target runtime
    pub runtime: RuntimeKind,

    /// The code to execute
    pub code: String,
}

impl ExecutionRequest {
    pub fn new(runtime: RuntimeKind, code: impl Into<String>) -> Self {
        Self {
            runtime,
            code: code.into(),
        }
    }
}

/// Outcome of an execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Success => "success",
            Status::Error => "error",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two-field result every executor returns
///
/// Fields are read-only once built. `output` is never empty: constructors
/// substitute [`crate::NO_OUTPUT`] for an empty output, and deserialization
/// goes through the same constructor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ResultFields")]
pub struct ExecutionResult {
    status: Status,
    output: String,
}

/// Wire form of [`ExecutionResult`], before the output invariant is applied
#[derive(Deserialize)]
struct ResultFields {
    status: Status,
    output: String,
}

impl From<ResultFields> for ExecutionResult {
    fn from(fields: ResultFields) -> Self {
        Self::new(fields.status, fields.output)
    }
}

impl ExecutionResult {
    /// Successful result; empty output becomes the no-output sentinel
    pub fn success(output: impl Into<String>) -> Self {
        Self::new(Status::Success, output)
    }

    /// Failed result carrying a diagnostic
    pub fn error(output: impl Into<String>) -> Self {
        Self::new(Status::Error, output)
    }

    /// Result for empty or whitespace-only input
    pub fn no_code() -> Self {
        Self {
            status: Status::Success,
            output: crate::NO_CODE.to_string(),
        }
    }

    fn new(status: Status, output: impl Into<String>) -> Self {
        let output = output.into();
        let output = if output.is_empty() {
            crate::NO_OUTPUT.to_string()
        } else {
            output
        };
        Self { status, output }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    pub fn into_output(self) -> String {
        self.output
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitInfo {
    /// In-process execution; there is no exit code
    Embedded,
    /// Process exited normally with this code
    Exited(i32),
    /// Process was terminated by this signal
    Signaled(i32),
}

impl ExitInfo {
    /// Whether this counts as a conventional successful exit
    pub fn is_clean(self) -> bool {
        matches!(self, ExitInfo::Embedded | ExitInfo::Exited(0))
    }

    /// Trailing line describing an abnormal termination
    pub fn describe_abnormal(self) -> Option<String> {
        match self {
            ExitInfo::Embedded | ExitInfo::Exited(0) => None,
            ExitInfo::Exited(code) => Some(format!("Process exited with status: {}", code)),
            ExitInfo::Signaled(signal) => {
                Some(format!("Process terminated by signal: {}", signal))
            }
        }
    }
}

/// Raw text captured from one run, before classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit: ExitInfo,
}

impl CapturedOutput {
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>, exit: ExitInfo) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit,
        }
    }

    /// Classify and format this capture
    pub fn into_result(self) -> ExecutionResult {
        crate::render(&self.stdout, &self.stderr, self.exit)
    }
}
