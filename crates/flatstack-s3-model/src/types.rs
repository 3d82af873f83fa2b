//! Listing data types shared by the parser, the backend, and the assembler.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Content type the backend stores on delete-marker rows.
pub const DELETE_MARKER_CONTENT_TYPE: &str = "application/x-deleted;swift_versions_deleted=1";

/// Literal used for the version id of unversioned entries and prefixes.
pub const NULL_VERSION_ID: &str = "null";

/// The client-facing listing contract selected for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ListingVariant {
    /// Marker-based `ListObjects`.
    #[default]
    Legacy,
    /// Continuation-token based `ListObjectsV2`.
    Paginated,
    /// Version-aware `ListObjectVersions`.
    Versioned,
}

impl ListingVariant {
    /// Returns the string value of this variant.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Legacy => "Legacy",
            Self::Paginated => "Paginated",
            Self::Versioned => "Versioned",
        }
    }
}

impl std::fmt::Display for ListingVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized backend listing query.
///
/// `limit` already includes the one-entry lookahead used to detect
/// truncation. A `version_marker` is only meaningful together with `marker`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingRequest {
    /// Maximum number of rows the backend may return.
    pub limit: usize,
    /// Only names starting with this prefix.
    pub prefix: Option<String>,
    /// Roll names up to the first occurrence of this delimiter after the prefix.
    pub delimiter: Option<String>,
    /// Resume strictly after this name.
    pub marker: Option<String>,
    /// Return every version and delete marker.
    pub include_versions: bool,
    /// Resume after this version of `marker` (a version id or `"null"`).
    pub version_marker: Option<String>,
}

impl ListingRequest {
    /// Whether the request respects the `version_marker => marker` invariant.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.version_marker.is_none() || self.marker.is_some()
    }
}

/// A live object row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    /// Object name.
    pub name: String,
    /// Last modification time.
    pub last_modified: DateTime<Utc>,
    /// Size in bytes.
    pub size: u64,
    /// Content hash as stored by the backend (may already be quoted).
    pub hash: String,
    /// Precomputed composite ETag, used verbatim.
    pub s3_etag: Option<String>,
    /// Aggregate hash of a segmented object.
    pub slo_etag: Option<String>,
    /// Version identifier, absent for unversioned objects.
    pub version_id: Option<String>,
    /// Whether this row is the current version.
    pub is_latest: bool,
    /// Stored content type.
    pub content_type: String,
}

/// A delete-marker row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteMarkerEntry {
    /// Object name the marker hides.
    pub name: String,
    /// When the marker was written.
    pub last_modified: DateTime<Utc>,
    /// Version identifier of the marker.
    pub version_id: Option<String>,
    /// Whether the marker is the current version.
    pub is_latest: bool,
}

/// A common-prefix rollup row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixEntry {
    /// The rolled-up prefix, ending with the delimiter.
    pub subdir: String,
}

/// One backend listing row.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawListingRow")]
pub enum Entry {
    /// A live object.
    Object(ObjectEntry),
    /// A delete marker.
    DeleteMarker(DeleteMarkerEntry),
    /// A common prefix.
    CommonPrefix(PrefixEntry),
}

impl Entry {
    /// Object name or common-prefix name of this row.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Object(o) => &o.name,
            Self::DeleteMarker(d) => &d.name,
            Self::CommonPrefix(p) => &p.subdir,
        }
    }

    /// Version id of this row, if it has one.
    #[must_use]
    pub fn version_id(&self) -> Option<&str> {
        match self {
            Self::Object(o) => o.version_id.as_deref(),
            Self::DeleteMarker(d) => d.version_id.as_deref(),
            Self::CommonPrefix(_) => None,
        }
    }

    /// Whether this row is a common-prefix rollup.
    #[must_use]
    pub fn is_common_prefix(&self) -> bool {
        matches!(self, Self::CommonPrefix(_))
    }
}

/// The row shape the backend actually emits.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawListingRow {
    name: Option<String>,
    subdir: Option<String>,
    hash: Option<String>,
    bytes: Option<u64>,
    last_modified: Option<String>,
    content_type: Option<String>,
    s3_etag: Option<String>,
    slo_etag: Option<String>,
    version_id: Option<String>,
    is_latest: Option<bool>,
}

impl TryFrom<RawListingRow> for Entry {
    type Error = String;

    fn try_from(row: RawListingRow) -> Result<Self, Self::Error> {
        if let Some(subdir) = row.subdir {
            return Ok(Self::CommonPrefix(PrefixEntry { subdir }));
        }
        let name = row
            .name
            .ok_or_else(|| "listing row has neither name nor subdir".to_owned())?;
        let last_modified = match row.last_modified.as_deref() {
            Some(raw) => parse_backend_timestamp(raw)?,
            None => DateTime::<Utc>::UNIX_EPOCH,
        };
        let is_latest = row.is_latest.unwrap_or(true);
        let content_type = row.content_type.unwrap_or_default();
        if content_type == DELETE_MARKER_CONTENT_TYPE {
            return Ok(Self::DeleteMarker(DeleteMarkerEntry {
                name,
                last_modified,
                version_id: row.version_id,
                is_latest,
            }));
        }
        Ok(Self::Object(ObjectEntry {
            name,
            last_modified,
            size: row.bytes.unwrap_or(0),
            hash: row.hash.unwrap_or_default(),
            s3_etag: row.s3_etag,
            slo_etag: row.slo_etag,
            version_id: row.version_id,
            is_latest,
            content_type,
        }))
    }
}

/// Parse a backend timestamp: RFC 3339, or a naive UTC `YYYY-MM-DDTHH:MM:SS[.ffffff]`.
fn parse_backend_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("invalid last_modified {raw:?}: {e}"))
}

/// One page of backend rows after lookahead trimming.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Page {
    /// Rows in backend order.
    pub entries: Vec<Entry>,
    /// Whether more rows remain after this page.
    pub truncated: bool,
}

impl Page {
    /// The row next-page cursors are derived from.
    #[must_use]
    pub fn next_cursor_source(&self) -> Option<&Entry> {
        self.entries.last()
    }
}

/// CORS response headers produced by a matching rule.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorsHeaders {
    /// `Access-Control-Allow-Origin`.
    pub allow_origin: String,
    /// `Access-Control-Allow-Methods`.
    pub allow_methods: String,
    /// `Access-Control-Allow-Headers`.
    pub allow_headers: Option<String>,
    /// `Access-Control-Expose-Headers`.
    pub expose_headers: Option<String>,
    /// `Access-Control-Max-Age`.
    pub max_age_seconds: Option<u32>,
}

/// Parsed `CreateBucketConfiguration` request body.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBucketConfiguration {
    /// Requested region.
    pub location_constraint: Option<String>,
}
