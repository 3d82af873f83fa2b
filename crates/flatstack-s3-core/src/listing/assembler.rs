//! Result Assembler.
//!
//! One assembler serves all three listing contracts. The per-variant
//! differences are confined to a small dispatch table: which cursor a
//! truncated page advertises, and which root fields the document carries.
//! Shared steps (echoed fields, name encoding, ETag shaping, owner and
//! storage-class emission) run the same way for every variant.

use flatstack_s3_model::output::{ListingDocument, ListingItem, ListingRoot, ObjectItem, Owner};
use flatstack_s3_model::types::{
    DeleteMarkerEntry, Entry, ListingVariant, NULL_VERSION_ID, ObjectEntry, Page,
};

use super::parser::{ParsedListing, URL_ENCODING};
use crate::config::S3Config;
use crate::utils::{encode_continuation_token, listing_etag, url_encode_name};

/// Cursor a truncated page advertises for the next request.
#[derive(Debug, Clone, PartialEq, Eq)]
struct NextCursor {
    key: String,
    version_id: Option<String>,
}

/// Per-variant behavior.
struct VariantStrategy {
    next_cursor: fn(&ParsedListing, &Entry) -> Option<NextCursor>,
    root: fn(&ParsedListing, &Page, Option<NextCursor>) -> ListingRoot,
}

const LEGACY: VariantStrategy = VariantStrategy {
    next_cursor: legacy_next_cursor,
    root: legacy_root,
};

const PAGINATED: VariantStrategy = VariantStrategy {
    next_cursor: paginated_next_cursor,
    root: paginated_root,
};

const VERSIONED: VariantStrategy = VariantStrategy {
    next_cursor: versioned_next_cursor,
    root: versioned_root,
};

fn strategy(variant: ListingVariant) -> &'static VariantStrategy {
    match variant {
        ListingVariant::Legacy => &LEGACY,
        ListingVariant::Paginated => &PAGINATED,
        ListingVariant::Versioned => &VERSIONED,
    }
}

fn encode_if(parsed: &ParsedListing, name: &str) -> String {
    if parsed.encode_names {
        url_encode_name(name)
    } else {
        name.to_owned()
    }
}

// `NextMarker` is only advertised when a delimiter was requested.
fn legacy_next_cursor(parsed: &ParsedListing, last: &Entry) -> Option<NextCursor> {
    parsed.delimiter.as_ref()?;
    Some(NextCursor {
        key: encode_if(parsed, last.name()),
        version_id: None,
    })
}

fn legacy_root(parsed: &ParsedListing, _page: &Page, next: Option<NextCursor>) -> ListingRoot {
    ListingRoot::Legacy {
        marker: parsed.marker.clone().unwrap_or_default(),
        next_marker: next.map(|c| c.key),
    }
}

fn paginated_next_cursor(_parsed: &ParsedListing, last: &Entry) -> Option<NextCursor> {
    Some(NextCursor {
        key: encode_continuation_token(last.name()),
        version_id: None,
    })
}

fn paginated_root(parsed: &ParsedListing, page: &Page, next: Option<NextCursor>) -> ListingRoot {
    ListingRoot::Paginated {
        next_continuation_token: next.map(|c| c.key),
        continuation_token: parsed.continuation_token.clone(),
        start_after: parsed.start_after.clone(),
        key_count: page.entries.len(),
    }
}

fn versioned_next_cursor(_parsed: &ParsedListing, last: &Entry) -> Option<NextCursor> {
    Some(NextCursor {
        key: last.name().to_owned(),
        version_id: Some(last.version_id().unwrap_or(NULL_VERSION_ID).to_owned()),
    })
}

fn versioned_root(parsed: &ParsedListing, _page: &Page, next: Option<NextCursor>) -> ListingRoot {
    let (next_key_marker, next_version_id_marker) = match next {
        Some(c) => (Some(c.key), c.version_id),
        None => (None, None),
    };
    ListingRoot::Versioned {
        key_marker: parsed.key_marker.clone().unwrap_or_default(),
        version_id_marker: parsed.version_id_marker.clone().unwrap_or_default(),
        next_key_marker,
        next_version_id_marker,
    }
}

/// Builds listing documents from backend pages.
///
/// Backend capabilities are fixed at construction.
#[derive(Debug, Clone)]
pub struct ResultAssembler {
    version_tracking: bool,
    storage_class: String,
}

impl ResultAssembler {
    /// Create an assembler.
    ///
    /// Without `version_tracking` every entry of a version listing is
    /// reported as the latest one.
    #[must_use]
    pub fn new(version_tracking: bool, storage_class: impl Into<String>) -> Self {
        Self {
            version_tracking,
            storage_class: storage_class.into(),
        }
    }

    /// Create an assembler from the bucket-layer configuration.
    #[must_use]
    pub fn from_config(config: &S3Config) -> Self {
        Self::new(config.object_versioning, config.storage_class.clone())
    }

    /// Assemble the response document for `page`.
    #[must_use]
    pub fn assemble(
        &self,
        bucket: &str,
        identity: &str,
        parsed: &ParsedListing,
        page: &Page,
    ) -> ListingDocument {
        let strategy = strategy(parsed.variant);
        let next = if page.truncated {
            page.next_cursor_source()
                .and_then(|last| (strategy.next_cursor)(parsed, last))
        } else {
            None
        };

        let with_owner = parsed.variant != ListingVariant::Paginated || parsed.fetch_owner;
        let owner = with_owner.then(|| Owner {
            id: identity.to_owned(),
            display_name: identity.to_owned(),
        });

        ListingDocument {
            name: bucket.to_owned(),
            prefix: parsed.prefix.clone().unwrap_or_default(),
            root: (strategy.root)(parsed, page, next),
            max_keys: parsed.page_size,
            delimiter: parsed.delimiter.clone(),
            encoding_type: parsed.encode_names.then(|| URL_ENCODING.to_owned()),
            is_truncated: page.truncated,
            items: page
                .entries
                .iter()
                .map(|entry| self.item(parsed, owner.as_ref(), entry))
                .collect(),
        }
    }

    fn item(&self, parsed: &ParsedListing, owner: Option<&Owner>, entry: &Entry) -> ListingItem {
        let versioned = parsed.variant == ListingVariant::Versioned;
        match entry {
            Entry::CommonPrefix(prefix) => {
                ListingItem::CommonPrefix(encode_if(parsed, &prefix.subdir))
            }
            Entry::Object(object) => {
                let item = self.object_item(parsed, owner, object, versioned);
                if versioned {
                    ListingItem::Version(item)
                } else {
                    ListingItem::Contents(item)
                }
            }
            Entry::DeleteMarker(marker) => {
                let item = self.delete_marker_item(parsed, owner, marker, versioned);
                if versioned {
                    ListingItem::DeleteMarker(item)
                } else {
                    ListingItem::Contents(item)
                }
            }
        }
    }

    fn object_item(
        &self,
        parsed: &ParsedListing,
        owner: Option<&Owner>,
        object: &ObjectEntry,
        versioned: bool,
    ) -> ObjectItem {
        ObjectItem {
            key: encode_if(parsed, &object.name),
            version_id: versioned.then(|| {
                object
                    .version_id
                    .clone()
                    .unwrap_or_else(|| NULL_VERSION_ID.to_owned())
            }),
            is_latest: versioned.then(|| self.is_latest(object.is_latest)),
            last_modified: object.last_modified,
            etag: Some(listing_etag(object)),
            size: Some(object.size),
            owner: owner.cloned(),
            storage_class: Some(self.storage_class.clone()),
        }
    }

    fn delete_marker_item(
        &self,
        parsed: &ParsedListing,
        owner: Option<&Owner>,
        marker: &DeleteMarkerEntry,
        versioned: bool,
    ) -> ObjectItem {
        ObjectItem {
            key: encode_if(parsed, &marker.name),
            version_id: versioned.then(|| {
                marker
                    .version_id
                    .clone()
                    .unwrap_or_else(|| NULL_VERSION_ID.to_owned())
            }),
            is_latest: versioned.then(|| self.is_latest(marker.is_latest)),
            last_modified: marker.last_modified,
            etag: None,
            size: None,
            owner: owner.cloned(),
            storage_class: None,
        }
    }

    fn is_latest(&self, reported: bool) -> bool {
        !self.version_tracking || reported
    }
}
