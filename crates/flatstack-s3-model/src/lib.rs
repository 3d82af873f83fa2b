//! Data model for the FlatStack S3 bucket layer.
//!
//! Protocol errors, the supported bucket operations, backend listing rows,
//! and the listing documents returned to clients.
#![allow(missing_docs)]

pub mod error;
pub mod input;
pub mod operations;
pub mod output;
pub mod types;

pub use error::{S3Error, S3ErrorCode};
pub use operations::S3Operation;
pub use types::{Entry, ListingRequest, ListingVariant, Page};
