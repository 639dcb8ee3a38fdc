//! Subprocess executor properties: cleanup, draining, normalization

#![cfg(unix)]

use crate::common::{leftover_files, process_in, setup_test_logging, staging_dir};
use assert_matches::assert_matches;
use snipx_common::{RuntimeKind, Status};
use snipx_sandbox::EncodingNormalizer;
use std::time::Duration;

#[tokio::test]
async fn test_echo_scenario() {
    setup_test_logging();
    let dir = staging_dir();
    let result = process_in(dir.path())
        .run(RuntimeKind::Bash, "echo hello")
        .await;
    assert_eq!(result.status(), Status::Success);
    assert_eq!(result.output(), "hello");
    assert!(leftover_files(dir.path()).is_empty());
}

#[tokio::test]
async fn test_exit_code_scenario() {
    let dir = staging_dir();
    let result = process_in(dir.path()).run(RuntimeKind::Bash, "exit 3").await;
    assert_eq!(result.status(), Status::Error);
    assert!(result.output().contains('3'));
    assert!(leftover_files(dir.path()).is_empty());
}

#[tokio::test]
async fn test_clean_exit_is_success_for_every_variant() {
    let dir = staging_dir();
    let executor = process_in(dir.path());
    // on this platform batch falls back to bash
    for kind in [RuntimeKind::Bash, RuntimeKind::Batch] {
        let result = executor.run(kind, "true").await;
        assert_eq!(result.status(), Status::Success, "{kind}");
    }
    assert!(leftover_files(dir.path()).is_empty());
}

#[tokio::test]
async fn test_large_output_on_both_pipes() {
    setup_test_logging();
    let dir = staging_dir();
    let code = r#"
for i in $(seq 1 40000); do
  echo "out line $i"
  echo "err line $i" >&2
done
"#;
    let result = process_in(dir.path()).run(RuntimeKind::Bash, code).await;
    assert_eq!(result.status(), Status::Error);

    let output = result.output();
    let (stdout, stderr) = output
        .split_once("\n--- STDERR ---\n")
        .expect("both channels present");
    let out_lines: Vec<_> = stdout.lines().collect();
    let err_lines: Vec<_> = stderr.lines().collect();
    assert_eq!(out_lines.len(), 40000);
    assert_eq!(err_lines.len(), 40000);
    assert_eq!(out_lines[0], "out line 1");
    assert_eq!(out_lines[39999], "out line 40000");
    assert_eq!(err_lines[39999], "err line 40000");
}

#[tokio::test]
async fn test_caller_timeout_cleans_up() {
    setup_test_logging();
    let dir = staging_dir();
    let executor = process_in(dir.path());

    let outcome = tokio::time::timeout(
        Duration::from_millis(300),
        executor.run(RuntimeKind::Bash, "sleep 30"),
    )
    .await;
    assert_matches!(outcome, Err(_));
    assert!(leftover_files(dir.path()).is_empty());
}

#[tokio::test]
async fn test_non_utf8_output_is_normalized() {
    let dir = staging_dir();
    let sanitized = process_in(dir.path())
        .with_normalizer(EncodingNormalizer::default())
        .run(RuntimeKind::Bash, r"printf 'caf\xe9'")
        .await;
    assert_eq!(sanitized.output(), "caf?");

    let reinterpreted = process_in(dir.path())
        .with_normalizer(EncodingNormalizer::for_label("latin1").unwrap())
        .run(RuntimeKind::Bash, r"printf 'caf\xe9'")
        .await;
    assert_eq!(reinterpreted.output(), "café");
}

#[tokio::test]
async fn test_parallel_invocations_share_directory() {
    let dir = staging_dir();
    let executor = process_in(dir.path());

    let mut handles = Vec::new();
    for i in 0..12 {
        let executor = executor.clone();
        handles.push(tokio::spawn(async move {
            executor.run(RuntimeKind::Bash, &format!("echo {i}")).await
        }));
    }
    for (i, handle) in handles.into_iter().enumerate() {
        let result = handle.await.unwrap();
        assert_eq!(result.output(), i.to_string());
    }
    assert!(leftover_files(dir.path()).is_empty());
}

#[tokio::test]
async fn test_launch_failure_cleans_up() {
    let dir = staging_dir();
    let executor = process_in(dir.path()).with_programs(snipx_sandbox::ProgramConfig {
        bash: Some("/nonexistent/snipx-shell".into()),
        ..Default::default()
    });
    let result = executor.run(RuntimeKind::Bash, "echo never").await;
    assert_eq!(result.status(), Status::Error);
    assert!(result.output().contains("/nonexistent/snipx-shell"));
    assert!(leftover_files(dir.path()).is_empty());
}
