//! Listing Request Parser.
//!
//! Turns the raw query string of `GET /{bucket}` into one normalized backend
//! [`ListingRequest`] plus the [`ListingVariant`] that governs the response.

use flatstack_s3_model::types::{ListingRequest, ListingVariant, NULL_VERSION_ID};

use crate::error::S3ServiceError;
use crate::utils::{decode_continuation_token, is_truthy, is_valid_version_id};

/// The only accepted `encoding-type` value.
pub const URL_ENCODING: &str = "url";

/// A parsed listing request.
///
/// The echo fields keep the raw client values so the response can mirror
/// them; `request` holds what the backend is actually asked for.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedListing {
    /// Selected listing contract.
    pub variant: ListingVariant,
    /// Backend query, `limit` = `page_size + 1`.
    pub request: ListingRequest,
    /// Effective page size after applying the server cap.
    pub page_size: usize,
    /// Whether names are percent-encoded in the response.
    pub encode_names: bool,
    /// Whether `Owner` is emitted for paginated listings.
    pub fetch_owner: bool,
    /// `prefix` as sent.
    pub prefix: Option<String>,
    /// `delimiter` as sent.
    pub delimiter: Option<String>,
    /// `marker` as sent (legacy).
    pub marker: Option<String>,
    /// `key-marker` as sent (versioned).
    pub key_marker: Option<String>,
    /// `version-id-marker` as sent (versioned).
    pub version_id_marker: Option<String>,
    /// `continuation-token` as sent (paginated).
    pub continuation_token: Option<String>,
    /// `start-after` as sent (paginated).
    pub start_after: Option<String>,
}

/// First value of a query parameter.
fn param<'a>(query: &'a [(String, String)], name: &str) -> Option<&'a str> {
    query
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

fn owned(query: &[(String, String)], name: &str) -> Option<String> {
    param(query, name).map(str::to_owned)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_owned)
}

/// Parse the listing query parameters.
///
/// `max_bucket_listing` caps the page size; `default_bucket_listing` is used
/// when the client does not send `max-keys`.
///
/// ```
/// use flatstack_s3_core::listing::parse_listing_request;
/// use flatstack_s3_model::ListingVariant;
///
/// let query = vec![
///     ("list-type".to_owned(), "2".to_owned()),
///     ("max-keys".to_owned(), "5000".to_owned()),
/// ];
/// let parsed = parse_listing_request(&query, 1000, 1000).unwrap();
/// assert_eq!(parsed.variant, ListingVariant::Paginated);
/// assert_eq!(parsed.page_size, 1000);
/// assert_eq!(parsed.request.limit, 1001);
/// ```
pub fn parse_listing_request(
    query: &[(String, String)],
    max_bucket_listing: usize,
    default_bucket_listing: usize,
) -> Result<ParsedListing, S3ServiceError> {
    let page_size = parse_max_keys(param(query, "max-keys"), default_bucket_listing)?
        .min(max_bucket_listing);

    let encode_names = match param(query, "encoding-type") {
        None => false,
        Some(URL_ENCODING) => true,
        Some(other) => {
            return Err(S3ServiceError::InvalidArgument {
                name: "encoding-type".to_owned(),
                value: other.to_owned(),
                message: "Invalid Encoding Method specified in Request".to_owned(),
            });
        }
    };

    let mut parsed = ParsedListing {
        page_size,
        encode_names,
        prefix: owned(query, "prefix"),
        delimiter: owned(query, "delimiter"),
        request: ListingRequest {
            limit: page_size.saturating_add(1),
            prefix: owned(query, "prefix"),
            delimiter: owned(query, "delimiter"),
            ..ListingRequest::default()
        },
        ..ParsedListing::default()
    };

    if param(query, "versions").is_some() {
        parse_versioned(query, &mut parsed)?;
    } else if param(query, "list-type") == Some("2") {
        parse_paginated(query, &mut parsed)?;
    } else {
        parsed.variant = ListingVariant::Legacy;
        parsed.marker = owned(query, "marker");
        parsed.request.marker = non_empty(param(query, "marker"));
    }

    Ok(parsed)
}

/// `max-keys` must be a non-negative 32-bit integer.
fn parse_max_keys(raw: Option<&str>, default: usize) -> Result<usize, S3ServiceError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    raw.trim()
        .parse::<i32>()
        .ok()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| S3ServiceError::InvalidArgument {
            name: "max-keys".to_owned(),
            value: raw.to_owned(),
            message: "Provided max-keys not an integer or within integer range".to_owned(),
        })
}

fn parse_versioned(
    query: &[(String, String)],
    parsed: &mut ParsedListing,
) -> Result<(), S3ServiceError> {
    parsed.variant = ListingVariant::Versioned;
    parsed.request.include_versions = true;
    parsed.key_marker = owned(query, "key-marker");
    parsed.version_id_marker = owned(query, "version-id-marker");

    let version_marker = non_empty(param(query, "version-id-marker"));
    let Some(key_marker) = param(query, "key-marker") else {
        if let Some(value) = version_marker {
            return Err(S3ServiceError::InvalidArgument {
                name: "version-id-marker".to_owned(),
                value,
                message: "A version-id marker cannot be specified without a key marker."
                    .to_owned(),
            });
        }
        return Ok(());
    };

    parsed.request.marker = non_empty(Some(key_marker));
    if let Some(value) = version_marker {
        if value != NULL_VERSION_ID && !is_valid_version_id(&value) {
            return Err(S3ServiceError::InvalidArgument {
                name: "version-id-marker".to_owned(),
                value,
                message: "Invalid version id specified".to_owned(),
            });
        }
        // A version cursor only resumes inside a named key.
        if parsed.request.marker.is_some() {
            parsed.request.version_marker = Some(value);
        }
    }
    Ok(())
}

fn parse_paginated(
    query: &[(String, String)],
    parsed: &mut ParsedListing,
) -> Result<(), S3ServiceError> {
    parsed.variant = ListingVariant::Paginated;
    parsed.start_after = owned(query, "start-after");
    parsed.continuation_token = owned(query, "continuation-token");
    parsed.fetch_owner = param(query, "fetch-owner").is_some_and(is_truthy);

    parsed.request.marker = non_empty(param(query, "start-after"));
    if let Some(token) = param(query, "continuation-token") {
        parsed.request.marker = non_empty(Some(decode_continuation_token(token)?.as_str()));
    }
    Ok(())
}
