//! Operation outputs and listing response documents.

use chrono::{DateTime, Utc};

use crate::types::{CorsHeaders, ListingVariant};

/// Owner block attached to listed entries.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Owner {
    /// `ID`.
    pub id: String,
    /// `DisplayName`.
    pub display_name: String,
}

/// Per-entry fields shared by `Contents`, `Version`, and `DeleteMarker`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObjectItem {
    pub key: String,
    /// Present only in version listings.
    pub version_id: Option<String>,
    /// Present only in version listings.
    pub is_latest: Option<bool>,
    pub last_modified: DateTime<Utc>,
    pub etag: Option<String>,
    pub size: Option<u64>,
    pub owner: Option<Owner>,
    pub storage_class: Option<String>,
}

/// One element of a listing body, in backend order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingItem {
    /// `<Contents>` in `ListObjects`/`ListObjectsV2`.
    Contents(ObjectItem),
    /// `<Version>` in `ListObjectVersions`.
    Version(ObjectItem),
    /// `<DeleteMarker>` in `ListObjectVersions`.
    DeleteMarker(ObjectItem),
    /// `<CommonPrefixes><Prefix>..</Prefix></CommonPrefixes>`.
    CommonPrefix(String),
}

impl ListingItem {
    /// The key or prefix this item renders.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Contents(item) | Self::Version(item) | Self::DeleteMarker(item) => &item.key,
            Self::CommonPrefix(prefix) => prefix,
        }
    }
}

/// Variant-specific root fields of a listing document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingRoot {
    /// `ListBucketResult` for `ListObjects`.
    Legacy {
        marker: String,
        next_marker: Option<String>,
    },
    /// `ListBucketResult` for `ListObjectsV2`.
    Paginated {
        next_continuation_token: Option<String>,
        continuation_token: Option<String>,
        start_after: Option<String>,
        key_count: usize,
    },
    /// `ListVersionsResult`.
    Versioned {
        key_marker: String,
        version_id_marker: String,
        next_key_marker: Option<String>,
        next_version_id_marker: Option<String>,
    },
}

impl ListingRoot {
    /// The variant this root belongs to.
    #[must_use]
    pub fn variant(&self) -> ListingVariant {
        match self {
            Self::Legacy { .. } => ListingVariant::Legacy,
            Self::Paginated { .. } => ListingVariant::Paginated,
            Self::Versioned { .. } => ListingVariant::Versioned,
        }
    }
}

/// A fully assembled listing response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingDocument {
    /// Bucket name.
    pub name: String,
    /// Requested prefix, URL-encoded when requested; empty when absent.
    pub prefix: String,
    /// Variant-specific root fields.
    pub root: ListingRoot,
    /// Effective page size.
    pub max_keys: usize,
    /// Echoed delimiter.
    pub delimiter: Option<String>,
    /// `url` when URL-encoding was requested.
    pub encoding_type: Option<String>,
    /// Whether more entries remain.
    pub is_truncated: bool,
    /// Entries in backend order.
    pub items: Vec<ListingItem>,
}

/// Output of the listing operations.
#[derive(Debug, Clone)]
pub struct ListBucketOutput {
    /// The listing document.
    pub document: ListingDocument,
    /// CORS headers for a matching `Origin`.
    pub cors: Option<CorsHeaders>,
}

/// Output of `HEAD /{bucket}`.
#[derive(Debug, Clone, Default)]
pub struct HeadBucketOutput {
    /// `x-rgw-object-count`.
    pub object_count: u64,
    /// `x-rgw-bytes-used`.
    pub bytes_used: u64,
}

/// Output of `PUT /{bucket}`.
#[derive(Debug, Clone, Default)]
pub struct CreateBucketOutput {
    /// `Location` header.
    pub location: String,
}

/// Output of `OPTIONS /{bucket}`.
#[derive(Debug, Clone, Default)]
pub struct OptionsBucketOutput {
    /// Headers of the matching rule.
    pub cors: CorsHeaders,
}
