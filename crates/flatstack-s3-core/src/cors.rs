//! CORS rule lookup.
//!
//! CORS configurations are owned by an external store; the bucket layer only
//! consults them through [`CorsLookup`]. [`CorsIndex`] is the in-process
//! implementation used by the server and the tests.

use dashmap::DashMap;
use flatstack_s3_model::types::CorsHeaders;

/// Methods a preflight may ask about.
pub const CORS_ALLOWED_METHODS: [&str; 5] = ["GET", "PUT", "HEAD", "POST", "DELETE"];

/// Read access to per-bucket CORS rules.
pub trait CorsLookup: Send + Sync + std::fmt::Debug {
    /// Headers for an actual request from `origin` using `method`.
    fn match_request(&self, bucket: &str, origin: &str, method: &str) -> Option<CorsHeaders>;

    /// Headers for a preflight from `origin` asking for `method` and `request_headers`.
    fn match_preflight(
        &self,
        bucket: &str,
        origin: &str,
        method: &str,
        request_headers: &[String],
    ) -> Option<CorsHeaders>;
}

/// A single CORS rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsRule {
    /// Allowed origins; one `*` wildcard per pattern.
    pub allowed_origins: Vec<String>,
    /// Allowed methods.
    pub allowed_methods: Vec<String>,
    /// Allowed request headers (`*` allows any).
    pub allowed_headers: Vec<String>,
    /// Response headers exposed to the browser.
    pub expose_headers: Vec<String>,
    /// Preflight cache lifetime.
    pub max_age_seconds: Option<u32>,
}

impl CorsRule {
    fn allows(&self, origin: &str, method: &str) -> bool {
        self.allowed_origins.iter().any(|p| match_origin(p, origin))
            && self
                .allowed_methods
                .iter()
                .any(|m| m.eq_ignore_ascii_case(method))
    }

    fn headers_for(&self, origin: &str) -> CorsHeaders {
        CorsHeaders {
            allow_origin: resolve_origin(&self.allowed_origins, origin),
            allow_methods: self.allowed_methods.join(", "),
            allow_headers: (!self.allowed_headers.is_empty())
                .then(|| self.allowed_headers.join(", ")),
            expose_headers: (!self.expose_headers.is_empty())
                .then(|| self.expose_headers.join(", ")),
            max_age_seconds: self.max_age_seconds,
        }
    }
}

/// Thread-safe, per-bucket CORS rule index.
///
/// ```
/// use flatstack_s3_core::cors::{CorsIndex, CorsLookup, CorsRule};
///
/// let index = CorsIndex::new();
/// index.set_rules("my-bucket", vec![CorsRule {
///     allowed_origins: vec!["*".to_owned()],
///     allowed_methods: vec!["GET".to_owned()],
///     allowed_headers: vec![],
///     expose_headers: vec![],
///     max_age_seconds: None,
/// }]);
///
/// assert!(index.match_request("my-bucket", "https://example.com", "GET").is_some());
/// ```
#[derive(Debug, Default)]
pub struct CorsIndex {
    rules: DashMap<String, Vec<CorsRule>>,
}

impl CorsIndex {
    /// Create a new empty CORS index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set CORS rules for a bucket, replacing any existing rules.
    pub fn set_rules(&self, bucket: &str, rules: Vec<CorsRule>) {
        self.rules.insert(bucket.to_owned(), rules);
    }

    /// Delete all CORS rules for a bucket.
    pub fn delete_rules(&self, bucket: &str) {
        self.rules.remove(bucket);
    }
}

impl CorsLookup for CorsIndex {
    fn match_request(&self, bucket: &str, origin: &str, method: &str) -> Option<CorsHeaders> {
        let rules = self.rules.get(bucket)?;
        rules
            .iter()
            .find(|rule| rule.allows(origin, method))
            .map(|rule| rule.headers_for(origin))
    }

    fn match_preflight(
        &self,
        bucket: &str,
        origin: &str,
        method: &str,
        request_headers: &[String],
    ) -> Option<CorsHeaders> {
        let rules = self.rules.get(bucket)?;
        rules
            .iter()
            .find(|rule| {
                rule.allows(origin, method) && headers_allowed(&rule.allowed_headers, request_headers)
            })
            .map(|rule| rule.headers_for(origin))
    }
}

/// Match an origin pattern containing at most one `*` against an origin.
#[must_use]
pub fn match_origin(pattern: &str, origin: &str) -> bool {
    match pattern.split_once('*') {
        None => pattern == origin,
        Some((head, tail)) => {
            origin.len() >= head.len() + tail.len()
                && origin.starts_with(head)
                && origin.ends_with(tail)
        }
    }
}

/// `*` when any allowed origin is the bare wildcard, else the request origin.
fn resolve_origin(allowed_origins: &[String], origin: &str) -> String {
    if allowed_origins.iter().any(|o| o == "*") {
        "*".to_owned()
    } else {
        origin.to_owned()
    }
}

fn headers_allowed(allowed: &[String], requested: &[String]) -> bool {
    requested
        .iter()
        .all(|req| allowed.iter().any(|a| match_header(a, req)))
}

fn match_header(pattern: &str, header: &str) -> bool {
    match pattern.split_once('*') {
        None => pattern.eq_ignore_ascii_case(header),
        Some((head, tail)) => {
            let header = header.to_ascii_lowercase();
            header.len() >= head.len() + tail.len()
                && header.starts_with(&head.to_ascii_lowercase())
                && header.ends_with(&tail.to_ascii_lowercase())
        }
    }
}
