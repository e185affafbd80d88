//! Media validation and decoding
//!
//! Media arrives either as base64 text ([`MediaItem`]) or as raw bytes. Both
//! paths are checked against the decoded-size ceiling and the supported MIME
//! types before anything reaches the transport. Base64 text is additionally
//! checked against an encoded-size ceiling *before* decoding, so an inflated
//! string is rejected without paying for the decode.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use tracing::debug;

use crate::error::ValidationError;
use crate::types::{MediaItem, MediaType};

/// Largest accepted media payload after decoding (5 MiB)
pub const MAX_MEDIA_BYTES: usize = 5 * 1024 * 1024;

/// Largest accepted base64 text: the padded encoding of `MAX_MEDIA_BYTES`
pub const MAX_BASE64_LEN: usize = encoded_len(MAX_MEDIA_BYTES);

/// Most media items a single post may carry
pub const MAX_MEDIA_PER_POST: usize = 4;

const fn encoded_len(decoded: usize) -> usize {
    decoded.div_ceil(3) * 4
}

/// Media that passed validation and is ready for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedMedia {
    pub bytes: Vec<u8>,
    pub media_type: MediaType,
}

/// Validate a base64 media item and decode it
///
/// Checks run in a fixed order: encoded length, decode, decoded length,
/// media type. Surrounding whitespace, embedded line breaks and a
/// `data:<mime>;base64,` prefix are tolerated.
pub fn validate_and_decode(item: &MediaItem) -> Result<ValidatedMedia, ValidationError> {
    if item.data.len() > MAX_BASE64_LEN {
        return Err(ValidationError::EncodedTooLarge {
            len: item.data.len(),
            max: MAX_BASE64_LEN,
        });
    }

    let payload = strip_data_url(item.data.trim());
    let compact: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    let bytes = BASE64
        .decode(compact.as_bytes())
        .map_err(|_| ValidationError::InvalidBase64)?;
    if bytes.is_empty() {
        return Err(ValidationError::InvalidBase64);
    }

    check_decoded_size(bytes.len())?;
    let media_type = parse_media_type(&item.media_type)?;

    debug!(
        size = bytes.len(),
        media_type = %media_type,
        "Decoded media item"
    );

    Ok(ValidatedMedia { bytes, media_type })
}

/// Validate raw media bytes supplied directly by the caller
///
/// Skips the base64 checks and applies the decoded-size and media type guards.
pub fn validate_bytes(bytes: &[u8], mime_type: &str) -> Result<MediaType, ValidationError> {
    if bytes.is_empty() {
        return Err(ValidationError::EmptyMedia);
    }
    check_decoded_size(bytes.len())?;
    parse_media_type(mime_type)
}

/// Validate every item of a post before anything is uploaded
///
/// Returns the decoded media in input order, or the first failure.
pub fn validate_batch(items: &[MediaItem]) -> Result<Vec<ValidatedMedia>, ValidationError> {
    if items.len() > MAX_MEDIA_PER_POST {
        return Err(ValidationError::TooManyMedia {
            count: items.len(),
            max: MAX_MEDIA_PER_POST,
        });
    }

    items.iter().map(validate_and_decode).collect()
}

fn check_decoded_size(size: usize) -> Result<(), ValidationError> {
    if size > MAX_MEDIA_BYTES {
        return Err(ValidationError::MediaTooLarge {
            size,
            max: MAX_MEDIA_BYTES,
        });
    }
    Ok(())
}

fn parse_media_type(mime_type: &str) -> Result<MediaType, ValidationError> {
    MediaType::from_mime_str(mime_type)
        .ok_or_else(|| ValidationError::UnsupportedMediaType(mime_type.to_string()))
}

/// Strip a `data:<mime>;base64,` prefix if present
fn strip_data_url(data: &str) -> &str {
    if !data.starts_with("data:") {
        return data;
    }

    match data.split_once(',') {
        Some((header, rest)) if header.ends_with(";base64") => rest,
        _ => data,
    }
}
