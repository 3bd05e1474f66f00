//! Tracing subscriber setup for the binary

use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use dep_inspector::config;

/// Environment variable holding the filter directives
pub const LOG_ENV: &str = "DEP_INSPECTOR_LOG";

const DEFAULT_DIRECTIVES: &str = "info";

/// Where log lines go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    /// JSON lines appended to `dep-inspector.log` in the data directory
    File,
    /// Human-readable lines on stderr
    Stderr,
}

fn env_filter() -> anyhow::Result<EnvFilter> {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(DEFAULT_DIRECTIVES))
        .map_err(|e| anyhow::anyhow!("Failed to create tracing filter: {e}"))
}

/// Install the global subscriber
///
/// The returned guard flushes the file writer on drop, so keep it alive for
/// the whole run.
pub fn init_logging(target: LogTarget) -> anyhow::Result<Option<WorkerGuard>> {
    let registry = tracing_subscriber::registry().with(env_filter()?);

    match target {
        LogTarget::Stderr => {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false);
            registry.with(layer).init();
            Ok(None)
        }
        LogTarget::File => {
            let path = config::log_path();
            let (writer, guard) = tracing_appender::non_blocking(file_appender(&path)?);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_current_span(true);
            registry.with(layer).init();

            tracing::info!(
                version = env!("CARGO_PKG_VERSION"),
                path = %path.display(),
                "Logging initialized"
            );
            Ok(Some(guard))
        }
    }
}

fn file_appender(path: &Path) -> anyhow::Result<tracing_appender::rolling::RollingFileAppender> {
    let dir = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Log path has no parent: {}", path.display()))?;
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Log path has no file name: {}", path.display()))?;
    std::fs::create_dir_all(dir)?;
    Ok(tracing_appender::rolling::never(dir, file_name))
}
