//! Logging initialization using `tracing` and `tracing-subscriber`.
//!
//! Engine code only emits events; installing a subscriber is left to the
//! binary (or to a library caller that wants one).

use std::path::Path;

use clap::ValueEnum;
use tracing::debug;
use tracing_subscriber::{fmt, util::SubscriberInitExt, EnvFilter};

use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Human,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Lower the default filter to `debug` when `RUST_LOG` is unset.
    pub debug: bool,
}

/// Summary of one engine operation, logged once the operation finishes.
#[derive(Debug, Clone, Copy, Default)]
pub struct IncrementStats {
    pub file_size: u64,
    pub diff_blocks: u32,
    pub pages_written: u64,
    pub pages_skipped: u64,
    pub bytes_written: u64,
}

/// Initialize global tracing subscriber. Safe to call multiple times; subsequent
/// calls will no-op.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let default_level = if config.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match config.format {
        LogFormat::Human => {
            let _ = builder.finish().try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().finish().try_init();
        }
    };

    Ok(())
}

/// Emit a structured summary for an apply/restore pass.
pub fn log_increment_stats(operation: &'static str, file: Option<&Path>, stats: IncrementStats) {
    let file = file.map(|p| p.display().to_string()).unwrap_or_default();
    debug!(
        target: "pgincr::increment",
        operation,
        file = %file,
        file_size = stats.file_size,
        diff_blocks = stats.diff_blocks,
        pages_written = stats.pages_written,
        pages_skipped = stats.pages_skipped,
        bytes_written = stats.bytes_written,
        "increment_stats"
    );
}
