//! Logging configuration for the header-chain library.
//!
//! The library itself only emits `tracing` events; hosts that already run a
//! subscriber need nothing from here. Standalone hosts and integration tests
//! call [`init_console_logging`] once at startup.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{LoggingError, LoggingResult};

/// Guard returned by the init functions. Kept for API stability so a file
/// writer can be flushed on drop later without changing callers.
#[derive(Debug)]
pub struct LoggingGuard {
    _private: (),
}

/// Configuration for logging output.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter. If None, falls back to `RUST_LOG` and then INFO.
    pub level: Option<LevelFilter>,
    /// Whether to output logs to console (stderr).
    pub console: bool,
}

/// Initialize console-only logging with the given level.
pub fn init_console_logging(level: LevelFilter) -> LoggingResult<LoggingGuard> {
    init_logging(LoggingConfig {
        level: Some(level),
        console: true,
    })
}

/// Initialize logging with the given configuration.
///
/// With `console` false, tracing macros stay no-ops and Ok is returned.
///
/// # Errors
///
/// Returns an error if the tracing subscriber cannot be initialized, which
/// usually means a global subscriber is already set.
pub fn init_logging(config: LoggingConfig) -> LoggingResult<LoggingGuard> {
    if !config.console {
        return Ok(LoggingGuard {
            _private: (),
        });
    }

    let env_filter = match config.level {
        Some(level) => EnvFilter::new(level.to_string()),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(LevelFilter::INFO.to_string())),
    };

    let console_layer = fmt::layer().with_target(true).with_thread_ids(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .try_init()
        .map_err(|e| LoggingError::SubscriberInit(e.to_string()))?;

    Ok(LoggingGuard {
        _private: (),
    })
}
