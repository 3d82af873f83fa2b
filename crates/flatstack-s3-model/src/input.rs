//! Operation inputs, as extracted from HTTP requests.

use crate::types::CreateBucketConfiguration;

/// Input for `HEAD /{bucket}`.
#[derive(Debug, Clone, Default)]
pub struct HeadBucketInput {
    /// HTTP label (URI path).
    pub bucket: String,
    /// Requesting identity.
    pub identity: String,
}

/// Input for the three `GET /{bucket}` listing operations.
#[derive(Debug, Clone, Default)]
pub struct ListBucketInput {
    /// HTTP label (URI path).
    pub bucket: String,
    /// Requesting identity, echoed as the owner of listed entries.
    pub identity: String,
    /// Raw, already percent-decoded query parameters in request order.
    pub query: Vec<(String, String)>,
    /// HTTP header: `Origin`.
    pub origin: Option<String>,
}

/// Input for `PUT /{bucket}`.
#[derive(Debug, Clone, Default)]
pub struct CreateBucketInput {
    /// HTTP label (URI path).
    pub bucket: String,
    /// Requesting identity.
    pub identity: String,
    /// HTTP payload body.
    pub configuration: Option<CreateBucketConfiguration>,
}

/// Input for `DELETE /{bucket}`.
#[derive(Debug, Clone, Default)]
pub struct DeleteBucketInput {
    /// HTTP label (URI path).
    pub bucket: String,
    /// Requesting identity.
    pub identity: String,
}

/// Input for `OPTIONS /{bucket}`.
#[derive(Debug, Clone, Default)]
pub struct OptionsBucketInput {
    /// HTTP label (URI path).
    pub bucket: String,
    /// HTTP header: `Origin`.
    pub origin: Option<String>,
    /// HTTP header: `Access-Control-Request-Method`.
    pub request_method: Option<String>,
    /// HTTP header: `Access-Control-Request-Headers`, split on commas.
    pub request_headers: Vec<String>,
}
