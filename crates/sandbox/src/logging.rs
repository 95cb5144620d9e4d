//! Tracing subscriber setup.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Level used before the configuration has been read.
pub const BOOTSTRAP_LEVEL: &str = "info";

/// Pick the filter directive: `-v` wins, then the configured level.
pub fn filter_directive(verbose: bool, level: &str) -> String {
    if verbose {
        "debug".to_string()
    } else {
        level.to_lowercase()
    }
}

fn env_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive))
}

/// Run `f` with a temporary subscriber writing to `writer`.
///
/// Covers start-up work that happens before [`init`] can run, such as
/// loading the configuration that names the log level and log file.
pub fn scoped<W, T>(directive: &str, writer: W, f: impl FnOnce() -> T) -> T
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter(directive))
        .with_writer(writer)
        .finish();
    tracing::subscriber::with_default(subscriber, f)
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `directive` when set. With a `log_file`
/// the output goes to that file through a background writer; keep the
/// returned guard alive until exit so buffered lines are flushed.
pub fn init(directive: &str, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = env_filter(directive);

    match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .with_context(|| format!("log_file has no file name: {}", path.display()))?;

            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

            Ok(None)
        }
    }
}
