//! Transport abstraction
//!
//! The posting client never speaks the wire protocol itself. It depends on two
//! narrow capability traits, and whatever constructs the concrete client from
//! credentials implements both:
//!
//! - [`MediaUploadApi`]: the legacy (v1.1) media upload endpoint
//! - [`TweetsApi`]: the modern (v2) tweet creation and search endpoints
//!
//! # Examples
//!
//! ```no_run
//! use libtweetcast::transport::mock::MockTransport;
//! use libtweetcast::PostingClient;
//!
//! # async fn example() -> libtweetcast::Result<()> {
//! let client = PostingClient::new(MockTransport::new());
//! let tweet = client.post_tweet("Hello from tweetcast", None).await?;
//! println!("Posted {}", tweet.id);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;
use crate::types::TweetResult;

// Mock transport is available for all builds (not just tests) to support integration tests
pub mod mock;

/// Upload target context the client always sends
pub const UPLOAD_TARGET: &str = "tweet";

/// Parameters accompanying an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadParams {
    /// MIME type of the bytes, e.g. "image/png"
    pub mime_type: String,
    /// Upload context; always [`UPLOAD_TARGET`]
    pub target: String,
    /// Platform media category derived from the type, e.g. "tweet_image"
    pub media_category: String,
}

/// Legacy upload capability
#[async_trait]
pub trait MediaUploadApi: Send + Sync {
    /// Upload media bytes and return the platform's opaque media id
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] for any failure, including missing
    /// permissions.
    async fn upload(&self, bytes: &[u8], params: UploadParams) -> Result<String, TransportError>;
}

/// Modern post/search capability
#[async_trait]
pub trait TweetsApi: Send + Sync {
    /// Create a tweet
    async fn post(&self, payload: &PostPayload) -> Result<PostResponse, TransportError>;

    /// Search tweets from the recent window
    async fn search_recent(&self, query: &SearchQuery) -> Result<SearchResponse, TransportError>;
}

/// Everything the posting client needs from a transport
pub trait Transport: MediaUploadApi + TweetsApi {}

impl<T: MediaUploadApi + TweetsApi> Transport for T {}

/// Body of a tweet creation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostPayload {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<ReplyTo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaIds>,
}

impl PostPayload {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            reply: None,
            media: None,
        }
    }

    pub fn in_reply_to(mut self, tweet_id: Option<&str>) -> Self {
        self.reply = tweet_id.map(|id| ReplyTo {
            in_reply_to_tweet_id: id.to_string(),
        });
        self
    }

    pub fn with_media_ids(mut self, media_ids: Vec<String>) -> Self {
        self.media = Some(MediaIds { media_ids });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyTo {
    pub in_reply_to_tweet_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaIds {
    pub media_ids: Vec<String>,
}

/// Tweet object as returned by the platform
///
/// Fields beyond `id` and `text` are kept in `extra` so transports can
/// deserialize full responses; they are dropped during normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TweetData {
    pub id: String,
    pub text: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TweetData {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            extra: serde_json::Map::new(),
        }
    }
}

impl From<TweetData> for TweetResult {
    fn from(data: TweetData) -> Self {
        TweetResult {
            id: data.id,
            text: data.text,
        }
    }
}

/// Response to a tweet creation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostResponse {
    pub data: TweetData,
}

/// Recent search request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    pub max_results: u32,
}

/// Response to a recent search; `data` is absent when nothing matched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub data: Option<Vec<TweetData>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}
