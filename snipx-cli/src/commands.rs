//! CLI command implementations

use anyhow::{Context, Result};
use snipx_common::{ExecutionRequest, ExecutionResult, RuntimeKind};
use snipx_sandbox::{SandboxConfig, SandboxService};
use std::path::Path;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tracing::{debug, info, warn};

/// Load the config file (explicit path or the default location) plus env overrides
pub fn load_config(path: Option<&Path>) -> Result<SandboxConfig> {
    let config = match path {
        Some(path) => {
            let mut config = SandboxConfig::load_from(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            config.apply_overrides(|key| std::env::var(key).ok());
            config
        }
        None => SandboxConfig::load().context("Failed to load config")?,
    };
    debug!(?config, "Configuration loaded");
    Ok(config)
}

/// Snippet from `--code`, `--file`, or stdin when neither is given
pub async fn read_snippet(code: Option<String>, file: Option<&Path>) -> Result<String> {
    if let Some(code) = code {
        return Ok(code);
    }
    if let Some(file) = file {
        return tokio::fs::read_to_string(file)
            .await
            .with_context(|| format!("Failed to read {}", file.display()));
    }
    let mut code = String::new();
    tokio::io::stdin()
        .read_to_string(&mut code)
        .await
        .context("Failed to read snippet from stdin")?;
    Ok(code)
}

/// Execute a single snippet
pub async fn execute_once(
    config: SandboxConfig,
    runtime: RuntimeKind,
    code: String,
) -> Result<ExecutionResult> {
    let service = SandboxService::new(&config)?;
    let result = service
        .execute(ExecutionRequest::new(runtime, code))
        .await
        .context("Execution could not start")?;
    Ok(result)
}

/// Process exit status for a `run` result: 0 on success, 1 on error
pub fn exit_status(result: &ExecutionResult) -> u8 {
    if result.is_success() {
        0
    } else {
        1
    }
}

/// Answer JSON-lines requests on stdin until EOF
///
/// One service (and therefore one embedded session) serves the whole run.
pub async fn serve(mut config: SandboxConfig) -> Result<()> {
    // stdin carries requests; children must not consume it
    config.inherit_stdin = false;
    let service = SandboxService::new(&config)?;

    info!("Serving requests on stdin");
    let served = serve_lines(
        &service,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await?;
    info!(served, "Input closed");
    Ok(())
}

/// Request loop over any line source and sink; returns the number of answers
pub async fn serve_lines<R, W>(service: &SandboxService, reader: R, mut writer: W) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut served = 0;

    while let Some(line) = lines.next_line().await.context("Failed to read request")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let result = match serde_json::from_str::<ExecutionRequest>(line) {
            Ok(request) => service.execute(request).await.unwrap_or_else(|e| {
                warn!(error = %e, "Request failed");
                ExecutionResult::error(e.to_string())
            }),
            Err(e) => {
                warn!(error = %e, "Malformed request");
                ExecutionResult::error(format!("Invalid request: {}", e))
            }
        };

        let mut encoded = serde_json::to_vec(&result)?;
        encoded.push(b'\n');
        writer.write_all(&encoded).await?;
        writer.flush().await?;
        served += 1;
    }

    Ok(served)
}
