//! Common test utilities shared across integration and E2E tests

use snipx_sandbox::{ProcessScriptExecutor, SandboxConfig, SandboxService};
use std::path::Path;
use tempfile::TempDir;

/// Setup logging for tests
pub fn setup_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("snipx_sandbox=debug")
        .with_test_writer()
        .try_init();
}

/// Scratch staging directory that is removed with the returned guard
pub fn staging_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Service staging scripts under `dir`, with stdin detached
pub fn service_in(dir: &Path) -> SandboxService {
    let config = SandboxConfig {
        temp_dir: Some(dir.to_path_buf()),
        inherit_stdin: false,
        ..Default::default()
    };
    SandboxService::new(&config).expect("default config is valid")
}

/// Subprocess executor staging scripts under `dir`
pub fn process_in(dir: &Path) -> ProcessScriptExecutor {
    ProcessScriptExecutor::new()
        .with_temp_dir(dir)
        .with_inherit_stdin(false)
}

/// Files left behind in a staging directory
pub fn leftover_files(dir: &Path) -> Vec<std::path::PathBuf> {
    std::fs::read_dir(dir)
        .expect("staging dir readable")
        .map(|entry| entry.expect("dir entry").path())
        .collect()
}
