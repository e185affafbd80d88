//! Translation of transport failures into [`TweetcastError`]
//!
//! Transports report failures as a [`TransportError`] with an optional HTTP
//! status and a free-form message. A status code, when present, is trusted
//! first; the message is only inspected when the status is missing or
//! consistent with the failure kind being tested.
//!
//! # Error Mapping
//!
//! - Missing OAuth scope (401/403 or no status, with scope wording) →
//!   `TweetcastError::Permission` naming the scope the operation needs
//! - Payload too large (413 or size wording) → `TweetcastError::Validation`
//! - Anything else → `TweetcastError::Transport` with the original message

use tracing::debug;

use crate::error::{TransportError, TweetcastError, ValidationError};

/// Transport call a failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    UploadMedia,
    PostTweet,
    SearchTweets,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UploadMedia => "upload media",
            Self::PostTweet => "post tweet",
            Self::SearchTweets => "search tweets",
        }
    }

    /// OAuth 2.0 scope the operation needs
    pub fn required_scope(&self) -> &'static str {
        match self {
            Self::UploadMedia => "media.write",
            Self::PostTweet => "tweet.write",
            Self::SearchTweets => "tweet.read",
        }
    }

    fn permission_message(&self) -> String {
        let scope = self.required_scope();
        let action = match self {
            Self::UploadMedia => "Media upload",
            Self::PostTweet => "Posting",
            Self::SearchTweets => "Searching",
        };
        format!(
            "{} requires the {} scope. Suggestion: re-authorize the app with the {} scope, \
             or use OAuth 1.0a user-context credentials with read and write access.",
            action, scope, scope
        )
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a transport failure to the public error type
pub fn translate(error: TransportError, operation: Operation) -> TweetcastError {
    let status = error.status.or_else(|| extract_http_status(&error.message));
    let lower = error.message.to_lowercase();

    if is_scope_denial(status, &lower) {
        debug!(
            operation = %operation,
            status = ?status,
            raw = %error.message,
            "Transport reported missing permission"
        );
        return TweetcastError::Permission {
            scope: operation.required_scope().to_string(),
            message: operation.permission_message(),
        };
    }

    // Only an upload carries media the platform could reject for size
    if operation == Operation::UploadMedia && is_size_rejection(status, &lower) {
        return ValidationError::RejectedAsTooLarge(error.message).into();
    }

    TweetcastError::Transport {
        operation: operation.to_string(),
        status,
        message: error.message,
    }
}

fn is_scope_denial(status: Option<u16>, lower: &str) -> bool {
    if !matches!(status, None | Some(401) | Some(403)) {
        return false;
    }

    lower.contains("scope")
        || lower.contains("permission")
        || lower.contains("not permitted")
        || lower.contains("oauth1 app permissions")
}

fn is_size_rejection(status: Option<u16>, lower: &str) -> bool {
    match status {
        Some(413) => true,
        None | Some(400) => {
            lower.contains("too large")
                || lower.contains("file size")
                || lower.contains("payload too big")
        }
        Some(_) => false,
    }
}

/// Extract an HTTP status code from an error message
///
/// Looks for patterns like "HTTP 403", "status 413", "code: 401" or a
/// standalone "403:" / "403 ".
fn extract_http_status(message: &str) -> Option<u16> {
    let prefixes = ["HTTP ", "status ", "code: ", "status_code: "];

    for prefix in &prefixes {
        if let Some(pos) = message.find(prefix) {
            let after_prefix = &message[pos + prefix.len()..];
            if let Some(code) = after_prefix.get(0..3).and_then(parse_status) {
                return Some(code);
            }
        }
    }

    let bytes = message.as_bytes();
    for (i, window) in bytes.windows(4).enumerate() {
        let digits = window[..3].iter().all(u8::is_ascii_digit);
        let separated = window[3] == b':' || window[3] == b' ';
        // Not part of a larger number
        let standalone = i == 0 || !bytes[i - 1].is_ascii_digit();

        if digits && separated && standalone {
            if let Some(code) = std::str::from_utf8(&window[..3]).ok().and_then(parse_status) {
                return Some(code);
            }
        }
    }

    None
}

fn parse_status(s: &str) -> Option<u16> {
    s.parse::<u16>()
        .ok()
        .filter(|code| (100..=599).contains(code))
}
