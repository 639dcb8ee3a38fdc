//! Embedded runtime - a persistent in-process Python namespace
//!
//! Each [`InterpreterSession`] owns a private global namespace that survives
//! between calls, so names defined by one snippet are visible to the next.
//! Snippets run through a small driver that captures both output channels and
//! echoes the value of a trailing expression, the way an interactive prompt
//! would.

use super::Runtime;
use crate::error::SandboxError;
use crate::Result;
use async_trait::async_trait;
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyModule};
use snipx_common::{precheck, render, ExecutionRequest, ExecutionResult, ExitInfo};
use std::ffi::CStr;
use std::sync::{Arc, Mutex, PoisonError};

const CODE_NAME: &str = "__snipx_code__";
const STDOUT_NAME: &str = "__snipx_stdout__";
const STDERR_NAME: &str = "__snipx_stderr__";

/// Name the session namespace is bound to inside the driver's scratch scope
const NAMESPACE_NAME: &str = "_ns";

const WRAPPER_FAILED: &str = "Execution wrapper failed: ";

/// Preloaded into every fresh namespace
const PRELUDE: &CStr = c"import sys\nimport io\n";

/// Runs the snippet bound under `__snipx_code__` inside `_ns`.
///
/// Everything except the user code itself lives in the scratch scope, so the
/// driver's temporaries never leak into the session namespace.
const DRIVER: &CStr = c"
import ast
import contextlib
import io
import traceback

_code = _ns['__snipx_code__']
_out = io.StringIO()
_err = io.StringIO()
with contextlib.redirect_stdout(_out), contextlib.redirect_stderr(_err):
    try:
        try:
            _tree = ast.parse(_code, mode='exec')
        except SyntaxError:
            _tree = None
        if _tree is not None and _tree.body and isinstance(_tree.body[-1], ast.Expr):
            _last = ast.Expression(body=_tree.body.pop().value)
            exec(compile(_tree, '<snippet>', 'exec'), _ns)
            _value = eval(compile(_last, '<snippet>', 'eval'), _ns)
            if _value is not None:
                print(repr(_value))
        else:
            exec(_code, _ns)
    except BaseException:
        traceback.print_exc()
_ns['__snipx_stdout__'] = _out.getvalue()
_ns['__snipx_stderr__'] = _err.getvalue()
";

/// `sys.stdout` redirection is process-global, so driver runs from different
/// sessions must not overlap.
static REDIRECT_LOCK: Mutex<()> = Mutex::new(());

/// One persistent namespace in the process-wide interpreter
pub struct InterpreterSession {
    namespace: Py<PyDict>,
}

impl std::fmt::Debug for InterpreterSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterpreterSession").finish_non_exhaustive()
    }
}

impl InterpreterSession {
    /// Create a session with a fresh `__main__`-style namespace
    pub fn new() -> Result<Self> {
        Python::with_gil(|py| {
            let init = || -> PyResult<Py<PyDict>> {
                let namespace = PyDict::new(py);
                namespace.set_item("__builtins__", PyModule::import(py, "builtins")?)?;
                namespace.set_item("__name__", "__main__")?;
                py.run(PRELUDE, Some(&namespace), None)?;
                Ok(namespace.unbind())
            };
            let namespace =
                init().map_err(|e| SandboxError::InterpreterInit(format_py_err(py, &e)))?;
            tracing::debug!(version = %py.version(), "Interpreter session created");
            Ok(Self { namespace })
        })
    }

    /// Run one snippet against the session namespace
    ///
    /// Errors raised by the snippet are captured as stderr text. Only a failure
    /// of the driver itself produces an `Execution wrapper failed` result.
    pub fn execute(&self, code: &str) -> ExecutionResult {
        self.execute_with_driver(code, DRIVER)
    }

    fn execute_with_driver(&self, code: &str, driver: &CStr) -> ExecutionResult {
        if let Some(result) = precheck(code) {
            return result;
        }

        // Lock before the GIL; nothing takes them in the other order.
        let _redirect = REDIRECT_LOCK.lock().unwrap_or_else(PoisonError::into_inner);

        Python::with_gil(|py| {
            let namespace = self.namespace.bind(py);
            let outcome = run_driver(py, namespace, code.trim(), driver);
            let captured = take_captured(namespace);
            clear_reserved(namespace);

            match outcome.and(captured) {
                Ok((stdout, stderr)) => render(&stdout, &stderr, ExitInfo::Embedded),
                Err(e) => {
                    let trace = format_py_err(py, &e);
                    tracing::warn!(error = %trace, "Embedded driver failed");
                    ExecutionResult::error(format!("{WRAPPER_FAILED}{trace}"))
                }
            }
        })
    }

    /// Whether `name` is currently bound in the session namespace
    pub fn contains(&self, name: &str) -> bool {
        Python::with_gil(|py| self.namespace.bind(py).contains(name).unwrap_or(false))
    }
}

impl Drop for InterpreterSession {
    fn drop(&mut self) {
        // The interpreter itself stays up; pyo3 cannot re-initialize it.
        Python::with_gil(|py| self.namespace.bind(py).clear());
        tracing::debug!("Interpreter session released");
    }
}

fn run_driver(
    py: Python<'_>,
    namespace: &Bound<'_, PyDict>,
    code: &str,
    driver: &CStr,
) -> PyResult<()> {
    namespace.set_item(CODE_NAME, code)?;
    let scope = PyDict::new(py);
    scope.set_item("__builtins__", PyModule::import(py, "builtins")?)?;
    scope.set_item(NAMESPACE_NAME, namespace)?;
    py.run(driver, Some(&scope), None)
}

fn take_captured(namespace: &Bound<'_, PyDict>) -> PyResult<(String, String)> {
    let read = |name: &str| -> PyResult<String> {
        match namespace.get_item(name)? {
            Some(value) => value.extract(),
            None => Ok(String::new()),
        }
    };
    Ok((read(STDOUT_NAME)?, read(STDERR_NAME)?))
}

fn clear_reserved(namespace: &Bound<'_, PyDict>) {
    for name in [CODE_NAME, STDOUT_NAME, STDERR_NAME] {
        if namespace.contains(name).unwrap_or(false) {
            if let Err(e) = namespace.del_item(name) {
                tracing::warn!(name, error = %e, "Failed to remove reserved name");
            }
        }
    }
}

/// Full traceback text for a Python error, or its plain form if formatting fails
fn format_py_err(py: Python<'_>, err: &PyErr) -> String {
    let formatted = || -> PyResult<String> {
        let lines = PyModule::import(py, "traceback")?.call_method1(
            "format_exception",
            (err.get_type(py), err.value(py), err.traceback(py)),
        )?;
        let lines: Vec<String> = lines.extract()?;
        Ok(lines.concat())
    };
    formatted()
        .map(|text| text.trim_end().to_string())
        .unwrap_or_else(|_| err.to_string())
}

/// [`Runtime`] backed by one interpreter session
///
/// Calls are serialized on the session; the blocking interpreter work runs on
/// the blocking thread pool.
#[derive(Debug, Clone)]
pub struct InterpreterExecutor {
    session: Arc<Mutex<InterpreterSession>>,
}

impl InterpreterExecutor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            session: Arc::new(Mutex::new(InterpreterSession::new()?)),
        })
    }

    /// Execute on the calling thread
    pub fn execute_blocking(&self, code: &str) -> ExecutionResult {
        let session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        session.execute(code)
    }
}

#[async_trait]
impl Runtime for InterpreterExecutor {
    async fn execute(&self, request: ExecutionRequest) -> ExecutionResult {
        if let Some(result) = precheck(&request.code) {
            return result;
        }
        let executor = self.clone();
        tokio::task::spawn_blocking(move || executor.execute_blocking(&request.code))
            .await
            .unwrap_or_else(|e| ExecutionResult::error(format!("{WRAPPER_FAILED}{e}")))
    }

    fn name(&self) -> &str {
        "embedded"
    }
}
