//! Listing document serialization.
//!
//! Element order follows what S3 clients expect for each root:
//!
//! - `ListBucketResult` (v1): `Name`, `Prefix`, `Marker`, `NextMarker?`
//! - `ListBucketResult` (v2): `Name`, `Prefix`, `NextContinuationToken?`,
//!   `ContinuationToken?`, `StartAfter?`, `KeyCount`
//! - `ListVersionsResult`: `Name`, `Prefix`, `KeyMarker`, `VersionIdMarker`,
//!   `NextKeyMarker?`, `NextVersionIdMarker?`
//!
//! followed in every case by `MaxKeys`, `Delimiter?`, `EncodingType?`,
//! `IsTruncated` and the entries in backend order.

use std::io::{self, Write};

use flatstack_s3_model::output::{ListingDocument, ListingItem, ListingRoot, ObjectItem, Owner};
use flatstack_s3_model::types::ListingVariant;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesText, Event};

use crate::error::XmlError;

/// The S3 XML namespace.
pub const S3_NAMESPACE: &str = "http://s3.amazonaws.com/doc/2006-03-01/";

/// Trait for serializing S3 types to XML.
///
/// Implementors write their content as child elements inside the current XML
/// context. The root element and namespace are handled by [`to_xml`].
pub trait S3Serialize {
    /// Serialize this value as XML child elements into the given writer.
    ///
    /// # Errors
    ///
    /// Returns `io::Error` if writing to the underlying writer fails.
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()>;
}

/// Serialize a value as a complete XML document with declaration and namespace.
///
/// # Errors
///
/// Returns `XmlError` if serialization fails.
pub fn to_xml<T: S3Serialize>(root_element: &str, value: &T) -> Result<Vec<u8>, XmlError> {
    let mut buf = Vec::with_capacity(512);
    let mut writer = Writer::new(&mut buf);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    writer
        .create_element(root_element)
        .with_attribute(("xmlns", S3_NAMESPACE))
        .write_inner_content(|w| value.serialize_xml(w))?;

    Ok(buf)
}

/// Root element name for a listing variant.
#[must_use]
pub fn listing_root_element(variant: ListingVariant) -> &'static str {
    match variant {
        ListingVariant::Legacy | ListingVariant::Paginated => "ListBucketResult",
        ListingVariant::Versioned => "ListVersionsResult",
    }
}

/// Serialize a listing document under the root element its variant requires.
///
/// # Errors
///
/// Returns `XmlError` if serialization fails.
pub fn listing_to_xml(document: &ListingDocument) -> Result<Vec<u8>, XmlError> {
    to_xml(listing_root_element(document.root.variant()), document)
}

fn write_text_element<W: Write>(writer: &mut Writer<W>, tag: &str, text: &str) -> io::Result<()> {
    writer
        .create_element(tag)
        .write_text_content(BytesText::new(text))?;
    Ok(())
}

fn write_optional_text<W: Write>(
    writer: &mut Writer<W>,
    tag: &str,
    value: Option<&str>,
) -> io::Result<()> {
    if let Some(v) = value {
        write_text_element(writer, tag, v)?;
    }
    Ok(())
}

fn write_bool<W: Write>(writer: &mut Writer<W>, tag: &str, value: bool) -> io::Result<()> {
    write_text_element(writer, tag, if value { "true" } else { "false" })
}

/// Format a `DateTime<Utc>` as ISO 8601 with milliseconds and `Z` suffix.
fn format_timestamp(dt: &chrono::DateTime<chrono::Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

impl S3Serialize for ListingDocument {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_text_element(writer, "Name", &self.name)?;
        write_text_element(writer, "Prefix", &self.prefix)?;
        match &self.root {
            ListingRoot::Legacy {
                marker,
                next_marker,
            } => {
                write_text_element(writer, "Marker", marker)?;
                write_optional_text(writer, "NextMarker", next_marker.as_deref())?;
            }
            ListingRoot::Paginated {
                next_continuation_token,
                continuation_token,
                start_after,
                key_count,
            } => {
                write_optional_text(
                    writer,
                    "NextContinuationToken",
                    next_continuation_token.as_deref(),
                )?;
                write_optional_text(writer, "ContinuationToken", continuation_token.as_deref())?;
                write_optional_text(writer, "StartAfter", start_after.as_deref())?;
                write_text_element(writer, "KeyCount", &key_count.to_string())?;
            }
            ListingRoot::Versioned {
                key_marker,
                version_id_marker,
                next_key_marker,
                next_version_id_marker,
            } => {
                write_text_element(writer, "KeyMarker", key_marker)?;
                write_text_element(writer, "VersionIdMarker", version_id_marker)?;
                write_optional_text(writer, "NextKeyMarker", next_key_marker.as_deref())?;
                write_optional_text(
                    writer,
                    "NextVersionIdMarker",
                    next_version_id_marker.as_deref(),
                )?;
            }
        }
        write_text_element(writer, "MaxKeys", &self.max_keys.to_string())?;
        write_optional_text(writer, "Delimiter", self.delimiter.as_deref())?;
        write_optional_text(writer, "EncodingType", self.encoding_type.as_deref())?;
        write_bool(writer, "IsTruncated", self.is_truncated)?;
        for item in &self.items {
            item.serialize_xml(writer)?;
        }
        Ok(())
    }
}

impl S3Serialize for ListingItem {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        let (tag, item) = match self {
            Self::Contents(item) => ("Contents", item),
            Self::Version(item) => ("Version", item),
            Self::DeleteMarker(item) => ("DeleteMarker", item),
            Self::CommonPrefix(prefix) => {
                writer
                    .create_element("CommonPrefixes")
                    .write_inner_content(|w| write_text_element(w, "Prefix", prefix))?;
                return Ok(());
            }
        };
        writer
            .create_element(tag)
            .write_inner_content(|w| item.serialize_xml(w))?;
        Ok(())
    }
}

impl S3Serialize for ObjectItem {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_text_element(writer, "Key", &self.key)?;
        write_optional_text(writer, "VersionId", self.version_id.as_deref())?;
        if let Some(is_latest) = self.is_latest {
            write_bool(writer, "IsLatest", is_latest)?;
        }
        write_text_element(writer, "LastModified", &format_timestamp(&self.last_modified))?;
        write_optional_text(writer, "ETag", self.etag.as_deref())?;
        if let Some(size) = self.size {
            write_text_element(writer, "Size", &size.to_string())?;
        }
        if let Some(owner) = &self.owner {
            writer
                .create_element("Owner")
                .write_inner_content(|w| owner.serialize_xml(w))?;
        }
        write_optional_text(writer, "StorageClass", self.storage_class.as_deref())?;
        Ok(())
    }
}

impl S3Serialize for Owner {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_text_element(writer, "ID", &self.id)?;
        write_text_element(writer, "DisplayName", &self.display_name)?;
        Ok(())
    }
}
