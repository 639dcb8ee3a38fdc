//! Agent-style flows mixing runtimes against one service

use crate::common::{leftover_files, service_in, setup_test_logging, staging_dir};
use snipx_common::{ExecutionRequest, ExecutionResult, RuntimeKind, Status, STDERR_SEPARATOR};
use snipx_sandbox::SandboxService;

async fn run(service: &SandboxService, runtime: RuntimeKind, code: &str) -> ExecutionResult {
    service
        .execute(ExecutionRequest::new(runtime, code))
        .await
        .expect("execution could start")
}

#[tokio::test]
async fn test_data_analysis_flow() {
    setup_test_logging();
    let dir = staging_dir();
    let service = service_in(dir.path());

    let load = run(
        &service,
        RuntimeKind::Embedded,
        "rows = [('a', 3), ('b', 5), ('c', 8)]\nprint(len(rows), 'rows loaded')",
    )
    .await;
    assert_eq!(load.output(), "3 rows loaded");

    let total = run(&service, RuntimeKind::Embedded, "sum(v for _, v in rows)").await;
    assert_eq!(total.output(), "16");

    // a failing step leaves earlier state intact
    let failed = run(&service, RuntimeKind::Embedded, "rows[10]").await;
    assert_eq!(failed.status(), Status::Error);
    assert!(failed.output().contains("IndexError"));

    let names = run(&service, RuntimeKind::Embedded, "[k for k, _ in rows]").await;
    assert_eq!(names.output(), "['a', 'b', 'c']");
}

#[cfg(unix)]
#[tokio::test]
async fn test_shell_and_python_interleaved() {
    setup_test_logging();
    let dir = staging_dir();
    let service = service_in(dir.path());

    let data = dir.path().join("data.txt");
    let write = run(
        &service,
        RuntimeKind::Bash,
        &format!("printf 'alpha\\nbeta\\n' > '{}'", data.display()),
    )
    .await;
    assert!(write.is_success(), "{}", write.output());

    let read = run(
        &service,
        RuntimeKind::Embedded,
        &format!("open({:?}).read().split()", data.display().to_string()),
    )
    .await;
    assert_eq!(read.output(), "['alpha', 'beta']");

    let diagnostics = run(
        &service,
        RuntimeKind::Bash,
        "echo partial\necho 'disk warning' >&2",
    )
    .await;
    assert_eq!(diagnostics.status(), Status::Error);
    assert_eq!(
        diagnostics.output(),
        format!("partial\n{STDERR_SEPARATOR}\ndisk warning")
    );

    std::fs::remove_file(&data).unwrap();
    assert!(leftover_files(dir.path()).is_empty());
}

#[tokio::test]
async fn test_result_json_shape() {
    let dir = staging_dir();
    let service = service_in(dir.path());
    let result = run(&service, RuntimeKind::Embedded, "'json'").await;

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(
        value,
        serde_json::json!({ "status": "success", "output": "'json'" })
    );
}
