//! HTTP layer for the FlatStack S3 bucket service.
//!
//! - [`router`] resolves the bucket (path-style or virtual-hosted) and
//!   identifies one of the bucket-level operations
//! - [`request`] extracts typed inputs, including the requesting identity
//! - [`response`] turns outputs and errors into HTTP responses
//! - [`dispatch`] is the seam to the business logic ([`S3Handler`])
//! - [`service`] is the hyper `Service` tying it together
//!
//! # Architecture
//!
//! ```text
//! HTTP Request
//!   -> S3HttpService (hyper Service)
//!     -> health check interception
//!     -> S3Router (bucket resolution + operation identification)
//!     -> body collection
//!     -> dispatch_operation (S3Handler trait)
//!     -> common response headers (x-amz-request-id, x-amz-id-2, Server)
//!   <- HTTP Response
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use flatstack_s3_http::dispatch::NotImplementedHandler;
//! use flatstack_s3_http::service::{S3HttpConfig, S3HttpService};
//!
//! let service = S3HttpService::new(NotImplementedHandler, S3HttpConfig::default());
//! // Serve `service` with hyper.
//! ```

// S3Error is returned by value across the request pipeline.
#![allow(clippy::result_large_err)]

pub mod body;
pub mod dispatch;
pub mod request;
pub mod response;
pub mod router;
pub mod service;

pub use body::S3ResponseBody;
pub use dispatch::{NotImplementedHandler, S3Handler};
pub use request::FromS3Request;
pub use response::IntoS3Response;
pub use router::{RoutingContext, S3Router};
pub use service::{S3HttpConfig, S3HttpService};
