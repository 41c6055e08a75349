//! Logging configuration and setup.
//!
//! Built on `tracing-subscriber`. The worker runs embedded in a host process,
//! so initialization is idempotent: a second call is a no-op rather than a
//! panic, which also keeps test binaries happy.

use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// Single-line output for piping into other tools.
    Compact,
    /// JSON for structured log collection.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Maximum level emitted when no filter is given.
    pub level: Level,
    /// Output format.
    pub format: LogFormat,
    /// Explicit filter directive, e.g. `"portico=debug,reqwest=warn"`.
    /// Overrides `level` and the `RUST_LOG` environment variable.
    pub filter: Option<String>,
    /// Include the emitting module path in each line.
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Pretty,
            filter: None,
            include_target: true,
        }
    }
}

impl LogConfig {
    /// Verbose configuration for local debugging.
    pub fn debug() -> Self {
        Self {
            level: Level::DEBUG,
            ..Default::default()
        }
    }

    /// Structured output for production log collection.
    pub fn json() -> Self {
        Self {
            format: LogFormat::Json,
            ..Default::default()
        }
    }

    /// Set an explicit filter directive.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }
}

/// Initialize the global subscriber. Returns `false` if a subscriber was
/// already installed.
pub fn init_logging(config: &LogConfig) -> bool {
    let filter = match &config.filter {
        Some(directive) => EnvFilter::try_new(directive).ok(),
        None => EnvFilter::try_from_default_env().ok(),
    }
    .unwrap_or_else(|| EnvFilter::new(config.level.to_string()));

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(config.include_target);

    match config.format {
        LogFormat::Pretty => builder.try_init().is_ok(),
        LogFormat::Compact => builder.compact().try_init().is_ok(),
        LogFormat::Json => builder.json().try_init().is_ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.level, Level::INFO);
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.filter.is_none());
    }

    #[test]
    fn test_debug_config() {
        let config = LogConfig::debug();
        assert_eq!(config.level, Level::DEBUG);
    }

    #[test]
    fn test_with_filter() {
        let config = LogConfig::json().with_filter("portico=trace");
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.filter.as_deref(), Some("portico=trace"));
    }

    #[test]
    fn test_init_survives_invalid_filter_directive() {
        // An unparsable directive falls back to the configured level.
        let _ = init_logging(&LogConfig::default().with_filter("!!not a directive!!"));
    }

    #[test]
    fn test_init_is_idempotent() {
        // Whichever call wins the global slot, the second must not panic.
        let _ = init_logging(&LogConfig::default());
        let second = init_logging(&LogConfig::debug());
        assert!(!second);
    }
}
