//! Posting client
//!
//! Orchestrates every public operation as one sequence: local rate-limit
//! check, media validation, uploads, the post itself, and response
//! normalization. Transport failures are translated before they surface and
//! are never retried.

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Result, ValidationError};
use crate::media::{self, ValidatedMedia};
use crate::rate_limiter::RateLimiter;
use crate::transport::{PostPayload, SearchQuery, Transport, UploadParams, UPLOAD_TARGET};
use crate::translate::{translate, Operation};
use crate::types::{ActionCategory, MediaItem, MediaType, TweetResult};

/// Smallest `max_results` the recent search endpoint accepts
pub const SEARCH_MIN_RESULTS: u32 = 10;
/// Largest `max_results` the recent search endpoint accepts
pub const SEARCH_MAX_RESULTS: u32 = 100;

/// Client for posting tweets and media through an injected transport
///
/// Each instance owns its own rate-limit state; two clients never throttle
/// each other.
pub struct PostingClient<T> {
    transport: T,
    limiter: RateLimiter,
}

impl<T: Transport> PostingClient<T> {
    /// Create a client with the default one-second spacing per category
    pub fn new(transport: T) -> Self {
        Self::with_rate_limiter(transport, RateLimiter::default())
    }

    pub fn with_rate_limiter(transport: T, limiter: RateLimiter) -> Self {
        Self { transport, limiter }
    }

    /// Create a client using the `[rate_limit]` section of `config`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if an interval does not parse.
    pub fn from_config(transport: T, config: &Config) -> Result<Self> {
        let limiter = RateLimiter::from_config(&config.rate_limit)?;
        Ok(Self::with_rate_limiter(transport, limiter))
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Post a text tweet, optionally as a reply
    ///
    /// # Errors
    ///
    /// - `RateLimit` if a tweet was posted less than the interval ago
    /// - `Permission` or `Transport` if the transport fails
    pub async fn post_tweet(&self, text: &str, reply_to_id: Option<&str>) -> Result<TweetResult> {
        self.limiter.check_and_record(ActionCategory::Tweet)?;

        let payload = PostPayload::text(text).in_reply_to(reply_to_id);
        self.send_post(&payload).await
    }

    /// Upload raw media bytes and return the platform's media id
    ///
    /// # Errors
    ///
    /// - `RateLimit` if media was uploaded less than the interval ago
    /// - `Validation` if the bytes are empty, oversized or of an unsupported
    ///   type; the transport is not called
    /// - `Permission` naming `media.write` if the credentials lack it
    /// - `Transport` for any other transport failure
    pub async fn upload_media(&self, bytes: &[u8], mime_type: &str) -> Result<String> {
        self.limiter.check_and_record(ActionCategory::Media)?;

        let media_type = media::validate_bytes(bytes, mime_type)?;
        self.send_upload(bytes, media_type).await
    }

    /// Post a tweet with attached media
    ///
    /// Without media this is exactly [`post_tweet`](Self::post_tweet). With
    /// media, every item is validated before the first upload, uploads run one
    /// at a time in input order, and the post references the resulting ids in
    /// that order. Any failure stops the sequence; nothing after it is sent.
    pub async fn post_tweet_with_media(
        &self,
        text: &str,
        reply_to_id: Option<&str>,
        media_items: Option<&[MediaItem]>,
    ) -> Result<TweetResult> {
        let items = match media_items {
            Some(items) if !items.is_empty() => items,
            _ => return self.post_tweet(text, reply_to_id).await,
        };

        self.limiter
            .check_all(&[ActionCategory::Media, ActionCategory::Tweet])?;

        let validated = media::validate_batch(items).inspect_err(|e| {
            warn!(error = %e, "Rejected media before upload");
        })?;

        let mut media_ids = Vec::with_capacity(validated.len());
        for ValidatedMedia { bytes, media_type } in &validated {
            media_ids.push(self.send_upload(bytes, *media_type).await?);
        }

        let payload = PostPayload::text(text)
            .in_reply_to(reply_to_id)
            .with_media_ids(media_ids);
        self.send_post(&payload).await
    }

    /// Search recent tweets
    ///
    /// # Errors
    ///
    /// - `RateLimit` if a search ran less than the interval ago
    /// - `Validation` for an empty query or `max_results` outside 10..=100
    /// - `Permission` or `Transport` if the transport fails
    pub async fn search_recent(&self, query: &str, max_results: u32) -> Result<Vec<TweetResult>> {
        self.limiter.check_and_record(ActionCategory::Search)?;

        let query = query.trim();
        if query.is_empty() {
            return Err(ValidationError::EmptyQuery.into());
        }
        if !(SEARCH_MIN_RESULTS..=SEARCH_MAX_RESULTS).contains(&max_results) {
            return Err(ValidationError::MaxResultsOutOfRange {
                got: max_results,
                min: SEARCH_MIN_RESULTS,
                max: SEARCH_MAX_RESULTS,
            }
            .into());
        }

        let request = SearchQuery {
            query: query.to_string(),
            max_results,
        };
        let response = self
            .transport
            .search_recent(&request)
            .await
            .map_err(|e| translate(e, Operation::SearchTweets))?;

        let results: Vec<TweetResult> = response
            .data
            .unwrap_or_default()
            .into_iter()
            .map(TweetResult::from)
            .collect();

        debug!(query = %request.query, count = results.len(), "Search completed");
        Ok(results)
    }

    async fn send_upload(&self, bytes: &[u8], media_type: MediaType) -> Result<String> {
        let params = UploadParams {
            mime_type: media_type.as_str().to_string(),
            target: UPLOAD_TARGET.to_string(),
            media_category: media_type.media_category().to_string(),
        };

        let media_id = self
            .transport
            .upload(bytes, params)
            .await
            .map_err(|e| translate(e, Operation::UploadMedia))?;

        info!(
            media_id = %media_id,
            size = bytes.len(),
            media_type = %media_type,
            "Uploaded media"
        );
        Ok(media_id)
    }

    async fn send_post(&self, payload: &PostPayload) -> Result<TweetResult> {
        let media_count = payload.media.as_ref().map_or(0, |m| m.media_ids.len());

        let response = self
            .transport
            .post(payload)
            .await
            .map_err(|e| translate(e, Operation::PostTweet))?;

        let result = TweetResult::from(response.data);
        info!(
            tweet_id = %result.id,
            reply = payload.reply.is_some(),
            media_count,
            "Posted tweet"
        );
        Ok(result)
    }
}
