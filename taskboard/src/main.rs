//! `Taskboard` command-line client.
//!
//! Configuration via CLI flags, environment variables, or config file
//! (`~/.config/taskboard/config.toml`).
//!
//! ```bash
//! taskboard user add alice Alice
//! taskboard --user alice add "Write report" --level hard
//! taskboard --user alice up 2
//! taskboard leaderboard --top 5
//!
//! # Or via environment variables
//! TASKBOARD_USER=alice TASKBOARD_STORE=/tmp/board.bin taskboard list
//! ```

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;

use taskboard::app;
use taskboard::config::{CliArgs, Config};
use taskboard::store::FileStore;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = CliArgs::parse();

    // CLI args > env > config file > defaults.
    let config = match Config::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    tracing::debug!(store = %config.store_path.display(), "taskboard starting");

    let result = match FileStore::open(config.store_path.clone()).await {
        Ok(store) => {
            let mut stdout = std::io::stdout().lock();
            app::run_command(Arc::new(store), &config, cli.command, &mut stdout).await
        }
        Err(e) => Err(app::AppError::from(e)),
    };

    // Flush buffered log lines before reporting.
    drop(log_guard);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging.
///
/// Logs go to stderr unless `file_path` is given, in which case they are
/// appended to that file through a non-blocking writer. The returned
/// [`WorkerGuard`] must be held until shutdown to flush buffered entries.
/// `RUST_LOG` takes precedence over `level`.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let target = file_path.and_then(|path| {
        let target = split_log_path(path);
        if target.is_none() {
            eprintln!(
                "warning: log file {} has no file name, logging to stderr",
                path.display()
            );
        }
        target
    });

    let Some((log_dir, file_name)) = target else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(env_filter)
            .init();
        return None;
    };

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

/// Splits a log file path into its directory and file name.
///
/// Returns `None` if the path names no file (e.g. `/tmp/` or `..`).
fn split_log_path(path: &Path) -> Option<(&Path, &str)> {
    let file_name = path.file_name()?.to_str()?;
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    Some((dir, file_name))
}
