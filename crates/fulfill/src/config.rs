//! Runtime configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use saga::RetryPolicy;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Runner configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `STOCK_DATABASE_PATH`: catalog JSON file (default: `"data/stock_database.json"`)
/// - `FLAGS_DIR`: directory holding the inventory flag files (default: `"."`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `json` for JSON lines, anything else for human-readable output
/// - `SAGA_ATTEMPT_TIMEOUT_MS` (default: `5000`)
/// - `SAGA_INITIAL_INTERVAL_MS` (default: `1000`)
/// - `SAGA_MAXIMUM_INTERVAL_MS` (default: `15000`)
/// - `SAGA_MAX_ATTEMPTS`: `0` means unbounded (default: `5`)
///
/// Unparseable numbers fall back to the default.
#[derive(Debug, Clone)]
pub struct Config {
    pub stock_database_path: PathBuf,
    pub flags_dir: PathBuf,
    pub log_level: String,
    pub log_format: LogFormat,
    pub attempt_timeout: Duration,
    pub initial_interval: Duration,
    pub maximum_interval: Duration,
    pub max_attempts: Option<u32>,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let millis = |key: &str, default: Duration| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(default)
        };

        Self {
            stock_database_path: lookup("STOCK_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.stock_database_path),
            flags_dir: lookup("FLAGS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.flags_dir),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: lookup("LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or(defaults.log_format),
            attempt_timeout: millis("SAGA_ATTEMPT_TIMEOUT_MS", defaults.attempt_timeout),
            initial_interval: millis("SAGA_INITIAL_INTERVAL_MS", defaults.initial_interval),
            maximum_interval: millis("SAGA_MAXIMUM_INTERVAL_MS", defaults.maximum_interval),
            max_attempts: match lookup("SAGA_MAX_ATTEMPTS").and_then(|v| v.trim().parse().ok()) {
                Some(0) => None,
                Some(n) => Some(n),
                None => defaults.max_attempts,
            },
        }
    }

    /// Builds the retry policy applied to every saga step.
    pub fn retry_policy(&self) -> saga::error::Result<RetryPolicy> {
        RetryPolicy::builder()
            .initial_interval(self.initial_interval)
            .maximum_interval(self.maximum_interval)
            .attempt_timeout(self.attempt_timeout)
            .max_attempts(self.max_attempts)
            .build()
    }
}

impl Default for Config {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            stock_database_path: PathBuf::from("data/stock_database.json"),
            flags_dir: PathBuf::from("."),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            attempt_timeout: policy.attempt_timeout(),
            initial_interval: policy.initial_interval(),
            maximum_interval: policy.maximum_interval(),
            max_attempts: policy.max_attempts(),
        }
    }
}
