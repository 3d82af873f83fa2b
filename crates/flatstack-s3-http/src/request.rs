//! HTTP request to operation input extraction.
//!
//! [`FromS3Request`] populates the typed inputs of `flatstack-s3-model` from
//! the request head, the [`RoutingContext`], and the collected body. Every
//! input that needs one carries the requesting identity, taken from the
//! access key of the request's credentials (see [`request_identity`]).

use bytes::Bytes;
use flatstack_s3_model::error::S3Error;
use flatstack_s3_model::input::{
    CreateBucketInput, DeleteBucketInput, HeadBucketInput, ListBucketInput, OptionsBucketInput,
};
use flatstack_s3_model::types::CreateBucketConfiguration;
use flatstack_s3_xml::{XmlError, from_xml};

use crate::router::RoutingContext;

/// Identity reported for requests without credentials.
pub const ANONYMOUS_IDENTITY: &str = "anonymous";

/// Largest accepted `CreateBucketConfiguration` body, in bytes.
pub const MAX_CREATE_BUCKET_BODY: usize = 10 * 1024;

/// Extracts an operation input from HTTP request components.
pub trait FromS3Request: Sized {
    /// Build the input from the request head, routing result, and body.
    ///
    /// # Errors
    ///
    /// Returns an `S3Error` if the body cannot be parsed.
    fn from_s3_request(
        parts: &http::request::Parts,
        ctx: &RoutingContext,
        body: Bytes,
    ) -> Result<Self, S3Error>;
}

/// Request body failures, all reported to the client as `MalformedXML`.
#[derive(Debug, thiserror::Error)]
pub enum BodyError {
    /// The body exceeds [`MAX_CREATE_BUCKET_BODY`].
    #[error("request body of {size} bytes exceeds the {limit} byte limit")]
    TooLarge {
        /// Received body size.
        size: usize,
        /// Accepted maximum.
        limit: usize,
    },
    /// The body is not a valid document.
    #[error("failed to parse XML body: {0}")]
    Xml(#[from] XmlError),
}

impl From<BodyError> for S3Error {
    fn from(err: BodyError) -> Self {
        S3Error::malformed_xml().with_source(err)
    }
}

/// Extract a header value as a string.
#[must_use]
pub fn header_str(parts: &http::request::Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToOwned::to_owned)
}

fn query_value<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// The access key identifying the caller.
///
/// Recognizes the SigV4 `Authorization` header
/// (`AWS4-HMAC-SHA256 Credential=<key>/<scope>, ...`), the SigV2 header
/// (`AWS <key>:<signature>`), and the presigned URL equivalents
/// (`X-Amz-Credential`, `AWSAccessKeyId`). Signatures are not verified.
/// Requests without credentials are [`ANONYMOUS_IDENTITY`].
#[must_use]
pub fn request_identity(parts: &http::request::Parts, query_params: &[(String, String)]) -> String {
    let from_header = parts
        .headers
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(access_key_from_authorization);
    let from_query = || {
        query_value(query_params, "X-Amz-Credential")
            .and_then(|credential| credential.split('/').next())
            .or_else(|| query_value(query_params, "AWSAccessKeyId"))
            .filter(|key| !key.is_empty())
    };

    from_header
        .or_else(from_query)
        .unwrap_or(ANONYMOUS_IDENTITY)
        .to_owned()
}

fn access_key_from_authorization(value: &str) -> Option<&str> {
    let key = if let Some(rest) = value.strip_prefix("AWS4-HMAC-SHA256") {
        rest.split(',')
            .map(str::trim)
            .find_map(|field| field.strip_prefix("Credential="))
            .and_then(|credential| credential.split('/').next())
    } else if let Some(rest) = value.strip_prefix("AWS ") {
        rest.split(':').next()
    } else {
        None
    }?;
    (!key.is_empty()).then_some(key)
}

/// Parse an optional `CreateBucketConfiguration` body.
///
/// An empty body means no configuration.
pub fn parse_create_bucket_configuration(
    body: &Bytes,
) -> Result<Option<CreateBucketConfiguration>, BodyError> {
    if body.is_empty() {
        return Ok(None);
    }
    if body.len() > MAX_CREATE_BUCKET_BODY {
        return Err(BodyError::TooLarge {
            size: body.len(),
            limit: MAX_CREATE_BUCKET_BODY,
        });
    }
    Ok(Some(from_xml("CreateBucketConfiguration", body)?))
}

impl FromS3Request for HeadBucketInput {
    fn from_s3_request(
        parts: &http::request::Parts,
        ctx: &RoutingContext,
        _body: Bytes,
    ) -> Result<Self, S3Error> {
        Ok(Self {
            bucket: ctx.bucket.clone(),
            identity: request_identity(parts, &ctx.query_params),
        })
    }
}

impl FromS3Request for ListBucketInput {
    fn from_s3_request(
        parts: &http::request::Parts,
        ctx: &RoutingContext,
        _body: Bytes,
    ) -> Result<Self, S3Error> {
        Ok(Self {
            bucket: ctx.bucket.clone(),
            identity: request_identity(parts, &ctx.query_params),
            query: ctx.query_params.clone(),
            origin: header_str(parts, "origin"),
        })
    }
}

impl FromS3Request for CreateBucketInput {
    fn from_s3_request(
        parts: &http::request::Parts,
        ctx: &RoutingContext,
        body: Bytes,
    ) -> Result<Self, S3Error> {
        Ok(Self {
            bucket: ctx.bucket.clone(),
            identity: request_identity(parts, &ctx.query_params),
            configuration: parse_create_bucket_configuration(&body)?,
        })
    }
}

impl FromS3Request for DeleteBucketInput {
    fn from_s3_request(
        parts: &http::request::Parts,
        ctx: &RoutingContext,
        _body: Bytes,
    ) -> Result<Self, S3Error> {
        Ok(Self {
            bucket: ctx.bucket.clone(),
            identity: request_identity(parts, &ctx.query_params),
        })
    }
}

impl FromS3Request for OptionsBucketInput {
    fn from_s3_request(
        parts: &http::request::Parts,
        ctx: &RoutingContext,
        _body: Bytes,
    ) -> Result<Self, S3Error> {
        let request_headers = header_str(parts, "access-control-request-headers")
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|h| !h.is_empty())
                    .map(ToOwned::to_owned)
                    .collect()
            })
            .unwrap_or_default();
        Ok(Self {
            bucket: ctx.bucket.clone(),
            origin: header_str(parts, "origin"),
            request_method: header_str(parts, "access-control-request-method"),
            request_headers,
        })
    }
}

#[cfg(test)]
mod tests {
    use flatstack_s3_model::S3ErrorCode;
    use flatstack_s3_model::operations::S3Operation;

    use super::*;

    fn parts(headers: &[(&str, &str)]) -> http::request::Parts {
        let mut builder = http::Request::builder().uri("/photos");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).expect("valid request").into_parts().0
    }

    fn ctx(operation: S3Operation, query: &[(&str, &str)]) -> RoutingContext {
        RoutingContext {
            bucket: "photos".to_owned(),
            operation,
            query_params: query
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
        }
    }

    #[test]
    fn test_should_take_identity_from_sigv4_credential() {
        let parts = parts(&[(
            "authorization",
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20240301/us-east-1/s3/aws4_request, \
             SignedHeaders=host;x-amz-date, Signature=abcdef",
        )]);
        assert_eq!(request_identity(&parts, &[]), "AKIDEXAMPLE");
    }

    #[test]
    fn test_should_take_identity_from_sigv2_header() {
        let parts = parts(&[("authorization", "AWS alice:c2lnbmF0dXJl")]);
        assert_eq!(request_identity(&parts, &[]), "alice");
    }

    #[test]
    fn test_should_take_identity_from_presigned_query() {
        let ctx = ctx(
            S3Operation::ListObjects,
            &[("X-Amz-Credential", "bob/20240301/us-east-1/s3/aws4_request")],
        );
        assert_eq!(request_identity(&parts(&[]), &ctx.query_params), "bob");
    }

    #[test]
    fn test_should_default_to_anonymous_identity() {
        assert_eq!(request_identity(&parts(&[]), &[]), ANONYMOUS_IDENTITY);
        let parts = parts(&[("authorization", "Bearer token")]);
        assert_eq!(request_identity(&parts, &[]), ANONYMOUS_IDENTITY);
    }

    #[test]
    fn test_should_build_listing_input_with_origin_and_query() {
        let ctx = ctx(S3Operation::ListObjectsV2, &[("list-type", "2"), ("prefix", "a/")]);
        let parts = parts(&[("origin", "https://app.example.com")]);
        let input = ListBucketInput::from_s3_request(&parts, &ctx, Bytes::new()).expect("input");
        assert_eq!(input.bucket, "photos");
        assert_eq!(input.query.len(), 2);
        assert_eq!(input.origin.as_deref(), Some("https://app.example.com"));
        assert_eq!(input.identity, ANONYMOUS_IDENTITY);
    }

    #[test]
    fn test_should_treat_empty_create_body_as_no_configuration() {
        let ctx = ctx(S3Operation::CreateBucket, &[]);
        let input =
            CreateBucketInput::from_s3_request(&parts(&[]), &ctx, Bytes::new()).expect("input");
        assert!(input.configuration.is_none());
    }

    #[test]
    fn test_should_parse_location_constraint() {
        let body = Bytes::from_static(
            b"<CreateBucketConfiguration xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">\
              <LocationConstraint>us-east-1</LocationConstraint>\
              </CreateBucketConfiguration>",
        );
        let ctx = ctx(S3Operation::CreateBucket, &[]);
        let input = CreateBucketInput::from_s3_request(&parts(&[]), &ctx, body).expect("input");
        assert_eq!(
            input.configuration.and_then(|c| c.location_constraint).as_deref(),
            Some("us-east-1")
        );
    }

    #[test]
    fn test_should_reject_oversized_create_body() {
        let body = Bytes::from(vec![b' '; MAX_CREATE_BUCKET_BODY + 1]);
        let err = parse_create_bucket_configuration(&body).expect_err("too large");
        assert!(matches!(err, BodyError::TooLarge { size: 10241, limit: 10240 }));
        let s3_err = S3Error::from(err);
        assert_eq!(s3_err.code, S3ErrorCode::MalformedXML);
    }

    #[test]
    fn test_should_reject_malformed_create_body() {
        let ctx = ctx(S3Operation::CreateBucket, &[]);
        let body = Bytes::from_static(b"<Wrong><LocationConstraint>x</LocationConstraint></Wrong>");
        let err = CreateBucketInput::from_s3_request(&parts(&[]), &ctx, body).expect_err("bad");
        assert_eq!(err.code, S3ErrorCode::MalformedXML);
        assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_should_split_preflight_request_headers() {
        let ctx = ctx(S3Operation::OptionsBucket, &[]);
        let parts = parts(&[
            ("origin", "https://app.example.com"),
            ("access-control-request-method", "PUT"),
            ("access-control-request-headers", "content-type, x-amz-date,,"),
        ]);
        let input = OptionsBucketInput::from_s3_request(&parts, &ctx, Bytes::new()).expect("input");
        assert_eq!(input.request_method.as_deref(), Some("PUT"));
        assert_eq!(input.request_headers, vec!["content-type", "x-amz-date"]);
    }
}
