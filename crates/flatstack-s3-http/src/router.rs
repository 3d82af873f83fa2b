//! Request routing: bucket resolution and operation identification.
//!
//! The bucket comes from the `Host` header when virtual hosting is enabled
//! and the host is `<bucket>.<domain>`, otherwise from the first path
//! segment. Only bucket-level requests are served; anything addressing the
//! service root or an object is rejected here.

use flatstack_s3_model::error::{S3Error, S3ErrorCode};
use flatstack_s3_model::operations::S3Operation;
use http::Method;
use percent_encoding::percent_decode_str;

/// Bucket resolution settings.
#[derive(Debug, Clone)]
pub struct S3Router {
    /// The base domain for virtual-hosted-style requests (e.g. `s3.localhost`).
    pub domain: String,
    /// Whether to enable virtual-hosted-style bucket addressing.
    pub virtual_hosting: bool,
}

/// The result of routing one request.
#[derive(Debug, Clone)]
pub struct RoutingContext {
    /// The resolved bucket name.
    pub bucket: String,
    /// The identified operation.
    pub operation: S3Operation,
    /// Percent-decoded query parameters, in request order.
    pub query_params: Vec<(String, String)>,
}

impl S3Router {
    /// Create a router for `domain`.
    #[must_use]
    pub fn new(domain: impl Into<String>, virtual_hosting: bool) -> Self {
        Self {
            domain: domain.into(),
            virtual_hosting,
        }
    }

    /// Resolve a request to a bucket-level operation.
    ///
    /// # Errors
    ///
    /// - `NotImplemented` for service-level listings and object requests
    /// - `MethodNotAllowed` for methods no bucket operation accepts
    pub fn resolve<B>(&self, req: &http::Request<B>) -> Result<RoutingContext, S3Error> {
        let method = req.method();
        let uri = req.uri();
        let query_params = parse_query_params(uri.query().unwrap_or(""));

        let virtual_bucket = if self.virtual_hosting {
            extract_virtual_host_bucket(req.headers(), &self.domain)
        } else {
            None
        };

        let path = uri.path();
        let (bucket, key) = match virtual_bucket {
            Some(bucket) => {
                let rest = path.trim_start_matches('/');
                (Some(bucket), (!rest.is_empty()).then(|| decode_uri_component(rest)))
            }
            None => parse_path(path),
        };

        let Some(bucket) = bucket else {
            return Err(identify_service_request(method));
        };
        if key.is_some() {
            return Err(S3Error::not_implemented("object operations"));
        }

        let operation = identify_bucket_operation(method, &query_params)?;
        Ok(RoutingContext {
            bucket,
            operation,
            query_params,
        })
    }
}

fn identify_service_request(method: &Method) -> S3Error {
    if *method == Method::GET {
        S3Error::not_implemented("ListBuckets")
    } else {
        S3Error::with_message(
            S3ErrorCode::MethodNotAllowed,
            "Only GET is allowed at the service level",
        )
        .with_resource(method.as_str())
    }
}

/// Identify a bucket-level operation.
///
/// `GET` selects the listing variant with the same priority the listing
/// parser uses: `versions` first, then `list-type=2`, then the legacy
/// listing.
fn identify_bucket_operation(
    method: &Method,
    params: &[(String, String)],
) -> Result<S3Operation, S3Error> {
    match *method {
        Method::GET => {
            if query_has_key(params, "versions") {
                Ok(S3Operation::ListObjectVersions)
            } else if query_value(params, "list-type") == Some("2") {
                Ok(S3Operation::ListObjectsV2)
            } else {
                Ok(S3Operation::ListObjects)
            }
        }
        Method::HEAD => Ok(S3Operation::HeadBucket),
        Method::PUT => Ok(S3Operation::CreateBucket),
        Method::DELETE => Ok(S3Operation::DeleteBucket),
        Method::POST => Ok(S3Operation::PostBucket),
        Method::OPTIONS => Ok(S3Operation::OptionsBucket),
        _ => Err(S3Error::method_not_allowed(method.as_str())),
    }
}

/// Extract the bucket name from a `<bucket>.<domain>[:port]` Host header.
fn extract_virtual_host_bucket(headers: &http::HeaderMap, domain: &str) -> Option<String> {
    let host = headers
        .get(http::header::HOST)
        .and_then(|v| v.to_str().ok())?;
    let host = host.split(':').next().unwrap_or(host);

    let bucket = host.strip_suffix(domain)?.strip_suffix('.')?;
    (!bucket.is_empty()).then(|| bucket.to_owned())
}

/// Split `/{bucket}[/{key...}]` into its decoded parts.
fn parse_path(path: &str) -> (Option<String>, Option<String>) {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    if trimmed.is_empty() {
        return (None, None);
    }

    match trimmed.split_once('/') {
        Some((bucket, key)) => (
            Some(decode_uri_component(bucket)),
            (!key.is_empty()).then(|| decode_uri_component(key)),
        ),
        None => (Some(decode_uri_component(trimmed)), None),
    }
}

fn decode_uri_component(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}

/// Parse a query string into decoded key-value pairs.
///
/// A parameter without `=` gets an empty value, so `?versions` yields
/// `("versions", "")`.
#[must_use]
pub fn parse_query_params(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (decode_uri_component(k), decode_uri_component(v)),
            None => (decode_uri_component(pair), String::new()),
        })
        .collect()
}

fn query_has_key(params: &[(String, String)], key: &str) -> bool {
    params.iter().any(|(k, _)| k == key)
}

fn query_value<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}
