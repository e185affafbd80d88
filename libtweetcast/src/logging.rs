//! Logging setup for applications embedding tweetcast
//!
//! The library itself only emits `tracing` events. Applications that have no
//! subscriber of their own can install one here:
//!
//! ```no_run
//! use libtweetcast::logging::{LogFormat, LoggingConfig};
//!
//! LoggingConfig::new(LogFormat::Json, "libtweetcast=debug".to_string()).init();
//!
//! // Or read TWEETCAST_LOG_FORMAT / TWEETCAST_LOG_LEVEL
//! libtweetcast::logging::init_default();
//! ```

use std::str::FromStr;

use tracing_subscriber::EnvFilter;

/// Boxed error returned by `tracing-subscriber` when a global subscriber is
/// already installed
pub type InitError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Plain text without span context
    Text,
    /// One JSON object per line
    Json,
    /// Multi-line, colored output for development
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            _ => Err(format!(
                "Invalid log format: '{}'. Valid options: text, json, pretty",
                s
            )),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
            LogFormat::Pretty => write!(f, "pretty"),
        }
    }
}

/// Subscriber settings
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// `EnvFilter` directive used when `RUST_LOG` is unset, e.g. "info"
    pub filter: String,
}

impl LoggingConfig {
    pub fn new(format: LogFormat, filter: String) -> Self {
        Self { format, filter }
    }

    /// Build from `TWEETCAST_LOG_FORMAT` and `TWEETCAST_LOG_LEVEL`, falling
    /// back to text at info level
    pub fn from_env() -> Self {
        let format = std::env::var("TWEETCAST_LOG_FORMAT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(LogFormat::Text);

        let filter = std::env::var("TWEETCAST_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Self::new(format, filter)
    }

    /// `RUST_LOG` wins over the configured directive
    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.filter))
    }

    /// Install the global subscriber, writing to stderr
    ///
    /// # Errors
    ///
    /// Fails if a global subscriber is already installed.
    pub fn try_init(&self) -> Result<(), InitError> {
        let filter = self.env_filter();

        match self.format {
            LogFormat::Json => tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_current_span(true)
                .flatten_event(true)
                .with_target(true)
                .try_init(),
            LogFormat::Pretty => tracing_subscriber::fmt()
                .pretty()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_line_number(true)
                .with_file(true)
                .try_init(),
            LogFormat::Text => tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .try_init(),
        }
    }

    /// Install the global subscriber, keeping any subscriber already installed
    pub fn init(&self) {
        if let Err(e) = self.try_init() {
            tracing::debug!(error = %e, "Logging already initialized");
        }
    }
}

/// Initialize logging from `TWEETCAST_LOG_FORMAT` and `TWEETCAST_LOG_LEVEL`
pub fn init_default() {
    LoggingConfig::from_env().init();
}
