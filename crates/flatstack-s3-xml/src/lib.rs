//! S3 XML layer for FlatStack.
//!
//! - [`listing_to_xml`] renders the three listing documents
//!   (`ListBucketResult` v1/v2 and `ListVersionsResult`)
//! - [`from_xml`] parses request bodies such as `CreateBucketConfiguration`
//! - [`error_to_xml`] formats flat `<Error>` responses
//!
//! Booleans are lowercase `true`/`false`, timestamps are ISO 8601 with
//! milliseconds (`2006-02-03T16:45:09.000Z`), and every document starts with
//! `<?xml version="1.0" encoding="UTF-8"?>`.

pub mod deserialize;
pub mod error;
pub mod serialize;

pub use deserialize::{S3Deserialize, from_xml};
pub use error::{XmlError, error_to_xml};
pub use serialize::{S3_NAMESPACE, S3Serialize, listing_to_xml, to_xml};
