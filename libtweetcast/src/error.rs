//! Error types for Tweetcast

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TweetcastError>;

/// Every error surfaced by the public API.
///
/// Callers can tell tweetcast failures apart from anything else with a single
/// match on this type.
#[derive(Error, Debug)]
pub enum TweetcastError {
    /// Local throttling rejected the action. Never produced by the transport.
    #[error("Rate limit: {0}")]
    RateLimit(String),

    /// The payload was rejected before any network call was made.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The credentials lack the OAuth scope the operation needs.
    #[error("{message}")]
    Permission { scope: String, message: String },

    /// Any other transport failure, with the transport's own diagnostic text.
    #[error("Transport error ({operation}): {message}")]
    Transport {
        operation: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl TweetcastError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            TweetcastError::Validation(_) => 3,
            TweetcastError::Permission { .. } => 2,
            TweetcastError::RateLimit(_) => 1,
            TweetcastError::Transport { .. } => 1,
            TweetcastError::Config(_) => 1,
        }
    }
}

/// Media and request validation failures.
///
/// The messages of the first variants are matched literally by callers, so
/// they carry no interpolated detail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Base64 media data too large")]
    EncodedTooLarge { len: usize, max: usize },

    #[error("Invalid base64 media data")]
    InvalidBase64,

    #[error("Media data is empty")]
    EmptyMedia,

    #[error("Media too large: {size} bytes exceeds the {max} byte limit")]
    MediaTooLarge { size: usize, max: usize },

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Too many media items: {count} given, at most {max} allowed per post")]
    TooManyMedia { count: usize, max: usize },

    #[error("Media rejected by platform as too large: {0}")]
    RejectedAsTooLarge(String),

    #[error("Search query cannot be empty")]
    EmptyQuery,

    #[error("Search max_results must be between {min} and {max} (got {got})")]
    MaxResultsOutOfRange { got: u32, min: u32, max: u32 },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Failure reported by an injected transport.
///
/// `status` carries the HTTP status when the transport knows it; translation
/// prefers it over inspecting `message`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportError {
    pub status: Option<u16>,
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }
}
