//! Tweetcast - a throttled, validating client for posting to X
//!
//! This library wraps an injected transport with local rate limiting, media
//! validation and typed error translation, so malformed or oversized payloads
//! and over-eager callers are stopped before anything reaches the network.

pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod media;
pub mod rate_limiter;
pub mod translate;
pub mod transport;
pub mod types;

// Re-export commonly used types
pub use client::PostingClient;
pub use config::{AuthType, Config};
pub use error::{Result, TransportError, TweetcastError, ValidationError};
pub use rate_limiter::RateLimiter;
pub use transport::{MediaUploadApi, Transport, TweetsApi};
pub use types::{ActionCategory, MediaItem, MediaType, TweetResult};
