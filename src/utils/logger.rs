use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::Error;

/// Parses a `logging.level` value.
pub fn parse_level(level: &str) -> Result<LevelFilter, Error> {
    match level.trim().to_lowercase().as_str() {
        "trace" => Ok(LevelFilter::TRACE),
        "debug" => Ok(LevelFilter::DEBUG),
        "info" => Ok(LevelFilter::INFO),
        "warn" => Ok(LevelFilter::WARN),
        "error" => Ok(LevelFilter::ERROR),
        other => Err(Error::Config(format!(
            "Invalid logging.level '{}'. Valid values: trace, debug, info, warn, error",
            other
        ))),
    }
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` directives are honoured on top of the configured level.
pub fn init_logging(logging_config: &LoggingConfig) -> Result<(), Error> {
    let level_filter = parse_level(&logging_config.level)?;
    let filter_layer = EnvFilter::builder()
        .with_default_directive(level_filter.into())
        .from_env_lossy();

    let registry = tracing_subscriber::registry().with(filter_layer);
    let result = match logging_config.format.to_lowercase().as_str() {
        "json" => registry
            .with(fmt::layer().json().flatten_event(true).with_current_span(false))
            .try_init(),
        // Anything else falls back to human-readable console output
        _ => registry.with(fmt::layer().pretty()).try_init(),
    };
    result.map_err(|e| Error::Config(format!("Failed to install logger: {}", e)))
}
