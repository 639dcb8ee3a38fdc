//! Embedded session behavior through the public API

use crate::common::setup_test_logging;
use snipx_common::{Status, NO_CODE, NO_OUTPUT};
use snipx_sandbox::{InterpreterExecutor, InterpreterSession};

#[test]
fn test_expression_scenario() {
    setup_test_logging();
    let session = InterpreterSession::new().expect("Failed to start interpreter");
    let result = session.execute("1 + 1");
    assert_eq!(result.status(), Status::Success);
    assert_eq!(result.output(), "2");
}

#[test]
fn test_raised_error_scenario() {
    setup_test_logging();
    let session = InterpreterSession::new().unwrap();
    let result = session.execute("raise KeyError('x')");
    assert_eq!(result.status(), Status::Error);
    assert!(result.output().contains("KeyError"));
    assert!(result.output().contains("'x'"));
}

#[test]
fn test_fresh_sessions_do_not_accumulate() {
    for _ in 0..3 {
        let session = InterpreterSession::new().unwrap();
        let result = session.execute("print(\"hi\")");
        assert_eq!(result.status(), Status::Success);
        assert_eq!(result.output(), "hi");
    }
}

#[test]
fn test_definitions_persist() {
    let session = InterpreterSession::new().unwrap();
    assert_eq!(
        session.execute("def square(v):\n    return v * v").output(),
        NO_OUTPUT
    );
    assert_eq!(session.execute("import math").output(), NO_OUTPUT);
    assert_eq!(session.execute("square(int(math.sqrt(81)))").output(), "81");
}

#[test]
fn test_whitespace_only() {
    let session = InterpreterSession::new().unwrap();
    for code in ["", " ", "\n\n", "\t \r\n"] {
        let result = session.execute(code);
        assert_eq!(result.status(), Status::Success);
        assert_eq!(result.output(), NO_CODE);
    }
}

#[test]
fn test_dropped_session_does_not_leak_into_new_one() {
    let first = InterpreterSession::new().unwrap();
    first.execute("leaked = True");
    drop(first);

    let second = InterpreterSession::new().unwrap();
    assert!(!second.contains("leaked"));
}

#[tokio::test]
async fn test_separate_executors_run_in_parallel_safely() {
    setup_test_logging();
    let mut handles = Vec::new();
    for i in 0..4 {
        handles.push(tokio::task::spawn_blocking(move || {
            let executor = InterpreterExecutor::new().unwrap();
            executor.execute_blocking(&format!("value = {i}"));
            executor.execute_blocking("print(value)")
        }));
    }
    for (i, handle) in handles.into_iter().enumerate() {
        let result = handle.await.unwrap();
        assert!(result.is_success());
        assert_eq!(result.output(), i.to_string());
    }
}
