//! Shared helpers: continuation tokens, name encoding, ETag shaping and
//! request-value parsing.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use flatstack_s3_model::types::ObjectEntry;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::error::S3ServiceError;

// ---------------------------------------------------------------------------
// Continuation tokens
// ---------------------------------------------------------------------------

/// Encode a listing position as an opaque continuation token.
///
/// ```
/// use flatstack_s3_core::utils::{decode_continuation_token, encode_continuation_token};
///
/// let token = encode_continuation_token("photos/2024/img.jpg");
/// assert_eq!(decode_continuation_token(&token).unwrap(), "photos/2024/img.jpg");
/// ```
#[must_use]
pub fn encode_continuation_token(name: &str) -> String {
    BASE64_STANDARD.encode(name.as_bytes())
}

/// Decode a continuation token back to the name it encodes.
///
/// # Errors
///
/// Returns [`S3ServiceError::InvalidArgument`] naming `continuation-token` if
/// the token is not base64 or does not decode to UTF-8.
pub fn decode_continuation_token(token: &str) -> Result<String, S3ServiceError> {
    let invalid = || S3ServiceError::InvalidArgument {
        name: "continuation-token".to_owned(),
        value: token.to_owned(),
        message: "The continuation token provided is incorrect".to_owned(),
    };
    let bytes = BASE64_STANDARD.decode(token).map_err(|_| invalid())?;
    String::from_utf8(bytes).map_err(|_| invalid())
}

// ---------------------------------------------------------------------------
// Name encoding
// ---------------------------------------------------------------------------

/// Bytes left untouched by `encoding-type=url`: alphanumerics and `/-._~`.
const NAME_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode an object or prefix name for `encoding-type=url`.
///
/// ```
/// use flatstack_s3_core::utils::url_encode_name;
///
/// assert_eq!(url_encode_name("a b/ü.txt"), "a%20b/%C3%BC.txt");
/// ```
#[must_use]
pub fn url_encode_name(name: &str) -> String {
    utf8_percent_encode(name, NAME_ENCODE_SET).to_string()
}

// ---------------------------------------------------------------------------
// ETags
// ---------------------------------------------------------------------------

/// The ETag a listing reports for an object row.
///
/// A precomputed composite ETag wins, then a segmented aggregate hash
/// (rendered as `"<hash>-N"` since the part count is unknown), then the raw
/// content hash, quote-wrapped unless it already is.
#[must_use]
pub fn listing_etag(entry: &ObjectEntry) -> String {
    if let Some(etag) = &entry.s3_etag {
        return etag.clone();
    }
    if let Some(aggregate) = &entry.slo_etag {
        return format!("\"{}-N\"", aggregate.trim_matches('"'));
    }
    if is_quoted(&entry.hash) {
        entry.hash.clone()
    } else {
        format!("\"{}\"", entry.hash)
    }
}

fn is_quoted(value: &str) -> bool {
    value.len() >= 2 && value.starts_with('"') && value.ends_with('"')
}

/// Strip surrounding double quotes from an ETag.
fn normalize_etag(etag: &str) -> &str {
    etag.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(etag)
}

/// Whether an `If-None-Match` header value matches the stored hash.
///
/// Accepts `*` and comma-separated, optionally quoted, ETags.
///
/// ```
/// use flatstack_s3_core::utils::if_none_match_matches;
///
/// assert!(if_none_match_matches("*", "abc"));
/// assert!(if_none_match_matches("\"xyz\", \"abc\"", "abc"));
/// assert!(!if_none_match_matches("\"xyz\"", "abc"));
/// ```
#[must_use]
pub fn if_none_match_matches(if_none_match: &str, hash: &str) -> bool {
    let hash = normalize_etag(hash);
    if_none_match
        .split(',')
        .map(str::trim)
        .any(|candidate| candidate == "*" || normalize_etag(candidate) == hash)
}

// ---------------------------------------------------------------------------
// Request values
// ---------------------------------------------------------------------------

/// Whether a version id looks like a backend timestamp: a non-negative
/// decimal, optionally followed by `_<hex offset>`.
///
/// ```
/// use flatstack_s3_core::utils::is_valid_version_id;
///
/// assert!(is_valid_version_id("1709288430.12345"));
/// assert!(is_valid_version_id("1709288430.12345_0000000000000001"));
/// assert!(!is_valid_version_id("abc"));
/// ```
#[must_use]
pub fn is_valid_version_id(value: &str) -> bool {
    let (timestamp, offset) = match value.split_once('_') {
        Some((ts, off)) => (ts, Some(off)),
        None => (value, None),
    };
    if let Some(off) = offset {
        if off.is_empty() || !off.bytes().all(|b| b.is_ascii_hexdigit()) {
            return false;
        }
    }
    if timestamp.is_empty() || !timestamp.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return false;
    }
    timestamp.parse::<f64>().is_ok_and(|ts| ts.is_finite() && ts >= 0.0)
}

/// Truthy strings accepted for boolean request parameters.
///
/// ```
/// use flatstack_s3_core::utils::is_truthy;
///
/// assert!(is_truthy("Yes"));
/// assert!(!is_truthy("0"));
/// ```
#[must_use]
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on" | "t" | "y"
    )
}
