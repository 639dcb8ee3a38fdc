mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use snipx_common::RuntimeKind;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "snipx")]
#[command(about = "Run code snippets in a persistent Python session or a shell")]
#[command(version)]
pub struct Cli {
    /// Config file (default: ~/.config/snipx/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Execute one snippet and print the result as JSON
    Run {
        /// Runtime (embedded, bash, powershell, batch)
        #[arg(short, long, default_value = "embedded")]
        runtime: RuntimeKind,

        /// Snippet text
        #[arg(long, conflicts_with = "file")]
        code: Option<String>,

        /// Read the snippet from a file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Read JSON requests from stdin, one per line, and answer each on stdout
    Serve,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    // Held until main returns so the file writer flushes on every exit path
    let _log_guard = init_logging(cli.verbose, cli.log_file.as_deref())?;

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            runtime,
            code,
            file,
        } => {
            let code = commands::read_snippet(code, file.as_deref()).await?;
            let result = commands::execute_once(config, runtime, code).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(ExitCode::from(commands::exit_status(&result)))
        }
        Commands::Serve => {
            commands::serve(config).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Logs go to stderr, so stdout carries only results
fn init_logging(
    verbose: bool,
    log_file: Option<&std::path::Path>,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = if verbose { "debug" } else { "warn" };

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("Invalid log file path: {}", path.display()))?;
            let file_appender = tracing_appender::rolling::never(dir, name);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(file_layer)
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(format!(
                    "snipx_cli={},snipx_sandbox={}",
                    log_level, log_level
                ))
            }),
        )
        .init();

    Ok(guard)
}
