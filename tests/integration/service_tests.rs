//! Service dispatch and configuration

use crate::common::{leftover_files, service_in, setup_test_logging, staging_dir};
use snipx_common::{ExecutionRequest, RuntimeKind, Status, NO_CODE, NO_OUTPUT};
use snipx_sandbox::{SandboxConfig, SandboxError, SandboxService};

#[tokio::test]
async fn test_empty_request_for_every_runtime() {
    setup_test_logging();
    let dir = staging_dir();
    let service = service_in(dir.path());
    for kind in RuntimeKind::ALL {
        let result = service
            .execute(ExecutionRequest::new(kind, "\n \t"))
            .await
            .unwrap();
        assert_eq!(result.status(), Status::Success);
        assert_eq!(result.output(), NO_CODE);
    }
    assert!(leftover_files(dir.path()).is_empty());
}

#[tokio::test]
async fn test_embedded_session_persists_across_requests() {
    let dir = staging_dir();
    let service = service_in(dir.path());

    let first = service
        .execute(ExecutionRequest::new(RuntimeKind::Embedded, "x = 5"))
        .await
        .unwrap();
    assert_eq!(first.output(), NO_OUTPUT);

    let second = service
        .execute(ExecutionRequest::new(RuntimeKind::Embedded, "x"))
        .await
        .unwrap();
    assert_eq!(second.status(), Status::Success);
    assert_eq!(second.output(), "5");
}

#[cfg(unix)]
#[tokio::test]
async fn test_process_requests_use_configured_directory() {
    let dir = staging_dir();
    let service = service_in(dir.path());
    assert_eq!(service.process().temp_dir(), dir.path());

    let result = service
        .execute(ExecutionRequest::new(RuntimeKind::Bash, "echo \"$0\""))
        .await
        .unwrap();
    assert!(result.is_success());
    assert!(result.output().starts_with(dir.path().to_str().unwrap()));
    assert!(result.output().ends_with(".sh"));
    assert!(leftover_files(dir.path()).is_empty());
}

#[test]
fn test_config_file_round_trip() {
    let dir = staging_dir();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
temp_dir = "/var/tmp/snipx"
native_encoding = "gbk"
drain_grace = "250ms"

[programs]
bash = "/usr/local/bin/bash"
"#,
    )
    .unwrap();

    let config = SandboxConfig::load_from(&path).unwrap();
    assert_eq!(config.temp_dir(), std::path::PathBuf::from("/var/tmp/snipx"));
    assert_eq!(config.drain_grace, std::time::Duration::from_millis(250));
    assert_eq!(config.programs.bash.as_deref(), Some("/usr/local/bin/bash"));
    let native = config.normalizer().unwrap().native().map(|e| e.name());
    assert_eq!(native, Some("GBK"));
    assert!(SandboxService::new(&config).is_ok());
}

#[test]
fn test_unknown_encoding_is_config_error() {
    let config = SandboxConfig {
        native_encoding: Some("klingon".into()),
        ..Default::default()
    };
    let err = SandboxService::new(&config).unwrap_err();
    assert!(matches!(err, SandboxError::Config(_)));
}
