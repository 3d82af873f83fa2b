//! Bucket-layer configuration.
//!
//! Provides [`S3Config`]. Values are loaded from environment variables with
//! defaults suitable for a local single-region deployment.

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Bucket-layer configuration.
///
/// # Examples
///
/// ```
/// use flatstack_s3_core::config::S3Config;
///
/// let config = S3Config::default();
/// assert_eq!(config.gateway_listen, "0.0.0.0:4566");
/// assert_eq!(config.max_bucket_listing, 1000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct S3Config {
    /// Bind address for the gateway (e.g. `"0.0.0.0:4566"`).
    #[builder(default = String::from("0.0.0.0:4566"))]
    pub gateway_listen: String,

    /// Whether virtual-hosted-style bucket addressing is enabled.
    #[builder(default = true)]
    pub s3_virtual_hosting: bool,

    /// Domain for virtual-hosted bucket resolution.
    #[builder(default = String::from("s3.localhost"))]
    pub s3_domain: String,

    /// Server cap on the listing page size.
    #[builder(default = 1000)]
    pub max_bucket_listing: usize,

    /// Page size used when the client sends no `max-keys`, and by teardown.
    #[builder(default = 1000)]
    pub default_bucket_listing: usize,

    /// The only accepted `LocationConstraint`.
    #[builder(default = String::from("us-east-1"))]
    pub location: String,

    /// Whether multipart uploads keep their parts in a segments container.
    #[builder(default = true)]
    pub allow_multipart_uploads: bool,

    /// Whether the backend tracks object versions.
    #[builder(default = false)]
    pub object_versioning: bool,

    /// Suffix naming a bucket's segments container.
    #[builder(default = String::from("+segments"))]
    pub segments_suffix: String,

    /// Storage class reported for every live entry.
    #[builder(default = String::from("STANDARD"))]
    pub storage_class: String,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            gateway_listen: String::from("0.0.0.0:4566"),
            s3_virtual_hosting: true,
            s3_domain: String::from("s3.localhost"),
            max_bucket_listing: 1000,
            default_bucket_listing: 1000,
            location: String::from("us-east-1"),
            allow_multipart_uploads: true,
            object_versioning: false,
            segments_suffix: String::from("+segments"),
            storage_class: String::from("STANDARD"),
            log_level: String::from("info"),
        }
    }
}

impl S3Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `GATEWAY_LISTEN` | `0.0.0.0:4566` |
    /// | `S3_VIRTUAL_HOSTING` | `true` |
    /// | `S3_DOMAIN` | `s3.localhost` |
    /// | `S3_MAX_BUCKET_LISTING` | `1000` |
    /// | `S3_DEFAULT_BUCKET_LISTING` | `1000` |
    /// | `S3_LOCATION` | `us-east-1` |
    /// | `S3_ALLOW_MULTIPART_UPLOADS` | `true` |
    /// | `S3_OBJECT_VERSIONING` | `false` |
    /// | `S3_SEGMENTS_SUFFIX` | `+segments` |
    /// | `S3_STORAGE_CLASS` | `STANDARD` |
    /// | `LOG_LEVEL` | `info` |
    ///
    /// Numbers that fail to parse keep their default.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("GATEWAY_LISTEN") {
            config.gateway_listen = v;
        }
        if let Ok(v) = std::env::var("S3_VIRTUAL_HOSTING") {
            config.s3_virtual_hosting = parse_bool(&v);
        }
        if let Ok(v) = std::env::var("S3_DOMAIN") {
            config.s3_domain = v;
        }
        if let Ok(v) = std::env::var("S3_MAX_BUCKET_LISTING") {
            if let Ok(n) = v.parse::<usize>() {
                config.max_bucket_listing = n;
            }
        }
        if let Ok(v) = std::env::var("S3_DEFAULT_BUCKET_LISTING") {
            if let Ok(n) = v.parse::<usize>() {
                config.default_bucket_listing = n;
            }
        }
        if let Ok(v) = std::env::var("S3_LOCATION") {
            config.location = v;
        }
        if let Ok(v) = std::env::var("S3_ALLOW_MULTIPART_UPLOADS") {
            config.allow_multipart_uploads = parse_bool(&v);
        }
        if let Ok(v) = std::env::var("S3_OBJECT_VERSIONING") {
            config.object_versioning = parse_bool(&v);
        }
        if let Ok(v) = std::env::var("S3_SEGMENTS_SUFFIX") {
            config.segments_suffix = v;
        }
        if let Ok(v) = std::env::var("S3_STORAGE_CLASS") {
            config.storage_class = v;
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }

    /// Name of the segments container belonging to `bucket`.
    #[must_use]
    pub fn segments_container(&self, bucket: &str) -> String {
        format!("{bucket}{}", self.segments_suffix)
    }
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
