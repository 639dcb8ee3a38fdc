//! Classification and formatting rules shared by every executor

use crate::types::{ExecutionResult, ExitInfo, Status};

/// Output substituted when a successful run captured nothing
pub const NO_OUTPUT: &str = "[No output]";

/// Output returned for empty or whitespace-only input
pub const NO_CODE: &str = "[No code to execute]";

/// Line placed between stdout and stderr in error output
pub const STDERR_SEPARATOR: &str = "--- STDERR ---";

/// Short-circuit result for input that has nothing to run
pub fn precheck(code: &str) -> Option<ExecutionResult> {
    if code.trim().is_empty() {
        Some(ExecutionResult::no_code())
    } else {
        None
    }
}

/// Decide success or error from a capture
///
/// Any stderr text is an error, even a deliberate diagnostic. Subprocesses
/// must additionally exit with code 0.
pub fn classify(_stdout: &str, stderr: &str, exit: ExitInfo) -> Status {
    if !stderr.is_empty() || !exit.is_clean() {
        Status::Error
    } else {
        Status::Success
    }
}

/// Strip trailing `\n` and `\r` characters
pub fn trim_line_endings(text: &str) -> &str {
    text.trim_end_matches(['\n', '\r'])
}

/// Build the result for a capture
pub fn render(stdout: &str, stderr: &str, exit: ExitInfo) -> ExecutionResult {
    let stdout = trim_line_endings(stdout);
    let stderr = trim_line_endings(stderr);

    match classify(stdout, stderr, exit) {
        Status::Success => ExecutionResult::success(stdout),
        Status::Error => {
            let mut output = String::from(stdout);
            if !stderr.is_empty() {
                if !output.is_empty() {
                    output.push('\n');
                    output.push_str(STDERR_SEPARATOR);
                    output.push('\n');
                }
                output.push_str(stderr);
            }
            if let Some(line) = exit.describe_abnormal() {
                if !output.is_empty() {
                    output.push('\n');
                }
                output.push_str(&line);
            }
            ExecutionResult::error(output)
        }
    }
}
