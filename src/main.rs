//! pacwatch binary entrypoint: logging, argument parsing and dispatch.

use std::fmt;
use std::process::ExitCode;
use std::sync::{Arc, OnceLock};

use clap::Parser;

use pacwatch::args::{self, Args, Command};
use pacwatch::exec::{CommandExecutor, SystemExecutor};
use pacwatch::settings::Settings;

/// Log timestamps as local `YYYY-MM-DD-T HH:MM:SS`.
struct PacwatchTimer;

impl tracing_subscriber::fmt::time::FormatTime for PacwatchTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> fmt::Result {
        let ts = chrono::Local::now().format("%Y-%m-%d-T %H:%M:%S");
        write!(w, "{ts}")
    }
}

static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// Build the filter from `RUST_LOG`, falling back to the CLI level.
fn env_filter(default_level: &str) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level))
}

/// Initialize tracing to `~/.config/pacwatch/logs/pacwatch.log`, or stderr.
fn init_logging(level: &str) {
    let mut log_path = pacwatch::paths::logs_dir();
    log_path.push("pacwatch.log");
    match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::fmt()
                .with_env_filter(env_filter(level))
                .with_target(false)
                .with_ansi(false)
                .with_writer(non_blocking)
                .with_timer(PacwatchTimer)
                .init();
            let _ = LOG_GUARD.set(guard);
            tracing::info!(path = %log_path.display(), "logging initialized");
        }
        Err(e) => {
            // Fallback: stderr logger so startup never blocks on the log file
            tracing_subscriber::fmt()
                .with_env_filter(env_filter(level))
                .with_target(false)
                .with_ansi(true)
                .with_writer(std::io::stderr)
                .with_timer(PacwatchTimer)
                .init();
            tracing::warn!(error = %e, "failed to open log file; using stderr");
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Args::parse();
    init_logging(&args::determine_log_level(&cli));

    let settings = args::effective_settings(&cli, Settings::load());
    let executor: Arc<dyn CommandExecutor> = Arc::new(SystemExecutor);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "pacwatch starting");

    let ok = match cli.command.unwrap_or(Command::Notifier) {
        Command::Notifier => {
            pacwatch::notifier::run(&settings, executor).await;
            true
        }
        Command::Query { kind } => {
            let config = settings.dispatcher_config(Some(pacwatch::paths::news_cache_path()));
            match args::query::run_query(executor, config, &kind).await {
                Ok(text) => {
                    if !text.is_empty() {
                        println!("{text}");
                    }
                    true
                }
                Err(e) => {
                    tracing::error!(error = %e, "query failed");
                    eprintln!("{e}");
                    false
                }
            }
        }
        Command::Upgrade { noconfirm } => {
            args::upgrade::handle_upgrade(executor, &settings, noconfirm).await
        }
    };
    tracing::info!(ok, "pacwatch exited");
    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}
