//! Bucket listing and lifecycle for FlatStack S3.
//!
//! Emulates S3 bucket semantics on top of a flat, cursor-based object store
//! whose only listing primitive is "list entries after marker, limited to N".
//!
//! # Architecture
//!
//! ```text
//! BucketController (capability check, CORS)
//!        |
//!        v
//! InterceptorChain (backend failure -> protocol error)
//!        |
//!        v
//! parse_listing_request -> invoke_listing -> ResultAssembler
//! SegmentTeardown (drain `<bucket>+segments` before delete)
//!        |
//!        v
//!   ObjectBackend (MemoryBackend in-process)
//! ```

// S3Error is returned by value from every operation handler.
#![allow(clippy::result_large_err)]

pub mod access;
pub mod backend;
pub mod config;
pub mod controller;
pub mod cors;
pub mod error;
pub mod interceptor;
pub mod listing;
pub mod ops;
pub mod teardown;
pub mod utils;
pub mod validation;

pub use config::S3Config;
pub use controller::BucketController;
