//! # Logging & Tracing Infrastructure
//!
//! Configures the `tracing-subscriber` stack for the workspace.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::logging::{init_logging, LoggingConfig, LogFormat};
//!
//! init_logging(LoggingConfig::default().with_format(LogFormat::Pretty))
//!     .expect("Failed to initialize logging");
//!
//! tracing::info!("mirror started");
//! ```
//!
//! The filter honours `RUST_LOG` when set; otherwise the configured default
//! level applies, optionally narrowed by a module filter string such as
//! `"core_sync=debug,core_remote=trace"`.

use crate::error::{Result, RuntimeError};
use tracing_subscriber::{filter::EnvFilter, fmt};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable pretty format with colors
    Pretty,
    /// Compact single-line format for production
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        #[cfg(debug_assertions)]
        return Self::Pretty;

        #[cfg(not(debug_assertions))]
        return Self::Compact;
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Output format
    pub format: LogFormat,
    /// Default directive applied when `RUST_LOG` is unset (e.g. "info")
    pub default_level: String,
    /// Additional filter directives (e.g. "core_sync=debug")
    pub filter: Option<String>,
    /// Display target module in logs
    pub display_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            default_level: "info".to_string(),
            filter: None,
            display_target: true,
        }
    }
}

impl LoggingConfig {
    /// Set log format
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the default level directive
    pub fn with_default_level(mut self, level: impl Into<String>) -> Self {
        self.default_level = level.into();
        self
    }

    /// Set an additional module filter string
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }
}

/// Initialize the global tracing subscriber.
///
/// # Errors
///
/// Returns `RuntimeError::LoggingInit` if a subscriber is already installed
/// or the filter string cannot be parsed.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let mut directives = config.default_level.clone();
    if let Some(filter) = &config.filter {
        directives.push(',');
        directives.push_str(filter);
    }

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&directives))
        .map_err(|e| RuntimeError::LoggingInit(e.to_string()))?;

    let builder = fmt()
        .with_env_filter(env_filter)
        .with_target(config.display_target);

    let result = match config.format {
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };

    result.map_err(|e| RuntimeError::LoggingInit(e.to_string()))
}
