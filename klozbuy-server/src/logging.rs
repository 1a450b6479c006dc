use crate::config::LoggingConfig;
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const DEFAULT_DIRECTIVE: &str = "klozbuy=info";

/// `RUST_LOG` when set and valid, otherwise [`DEFAULT_DIRECTIVE`].
fn env_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Initializes console logging and, when a directory is configured, a daily
/// rolling file log.
///
/// Keep the returned guard alive for the life of the process so buffered
/// file output is flushed on exit.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = env_filter(std::env::var("RUST_LOG").ok().as_deref());

    let Some(directory) = &config.directory else {
        // Create a formatted layer for console logging
        let console_layer = fmt::layer().with_writer(std::io::stdout);
        tracing_subscriber::registry()
            .with(filter)
            .with(console_layer)
            .try_init()?;
        return Ok(None);
    };

    fs::create_dir_all(directory)?;
    let file_appender = tracing_appender::rolling::daily(directory, &config.file_prefix);
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    // JSON lines for log shipping, plain text otherwise
    let file_layer = if config.json {
        fmt::layer()
            .json()
            .with_writer(non_blocking_writer)
            .boxed()
    } else {
        fmt::layer()
            .with_ansi(false)
            .with_writer(non_blocking_writer)
            .boxed()
    };

    let console_layer = fmt::layer().with_writer(std::io::stdout);
    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()?;
    Ok(Some(guard))
}
