//! Core types for Tweetcast

use serde::{Deserialize, Serialize};

/// Normalized view of a created or retrieved tweet.
///
/// Only built from successful transport responses; everything beyond `id`
/// and `text` is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TweetResult {
    pub id: String,
    pub text: String,
}

/// Media to attach to a post, as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    /// Base64-encoded media bytes
    pub data: String,
    /// MIME type such as "image/png"
    pub media_type: String,
}

impl MediaItem {
    pub fn new(data: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            media_type: media_type.into(),
        }
    }
}

/// Supported media MIME types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MediaType {
    Jpeg,
    Png,
    Gif,
    WebP,
    Mp4,
}

impl MediaType {
    /// Parse from a MIME string (e.g., "image/jpeg")
    pub fn from_mime_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/gif" => Some(Self::Gif),
            "image/webp" => Some(Self::WebP),
            "video/mp4" => Some(Self::Mp4),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::WebP => "image/webp",
            Self::Mp4 => "video/mp4",
        }
    }

    /// Upload category the platform expects for this kind of media
    pub fn media_category(&self) -> &'static str {
        match self {
            Self::Jpeg | Self::Png | Self::WebP => "tweet_image",
            Self::Gif => "tweet_gif",
            Self::Mp4 => "tweet_video",
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rate-limit bucket an action belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionCategory {
    Tweet,
    Media,
    Search,
}

impl ActionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tweet => "tweet",
            Self::Media => "media",
            Self::Search => "search",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "tweet" => Some(Self::Tweet),
            "media" => Some(Self::Media),
            "search" => Some(Self::Search),
            _ => None,
        }
    }
}

impl std::fmt::Display for ActionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
