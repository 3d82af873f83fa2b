//! Output and error to HTTP response serialization.
//!
//! Response shapes:
//! - **XML body**: the three listings (`application/xml`)
//! - **Header-only**: HEAD (`x-rgw-*` counters), PUT (`Location`),
//!   OPTIONS (CORS headers, no `Content-Type`)
//! - **Empty**: DELETE (204)
//! - **Errors**: `<Error>` documents plus the error's extra headers;
//!   304 and bare 404 responses carry no body

use flatstack_s3_model::error::{S3Error, S3ErrorCode};
use flatstack_s3_model::output::{
    CreateBucketOutput, HeadBucketOutput, ListBucketOutput, OptionsBucketOutput,
};
use flatstack_s3_model::types::CorsHeaders;
use http::header::HeaderValue;

use crate::body::S3ResponseBody;

/// Converts an operation output into an HTTP response.
pub trait IntoS3Response {
    /// Convert this output into an HTTP response.
    ///
    /// # Errors
    ///
    /// Returns an `S3Error` if the body cannot be serialized or a header
    /// value is invalid.
    fn into_s3_response(self) -> Result<http::Response<S3ResponseBody>, S3Error>;
}

fn set_optional_header(
    builder: http::response::Builder,
    name: &str,
    value: Option<&str>,
) -> http::response::Builder {
    if let Some(v) = value {
        if let Ok(hv) = HeaderValue::from_str(v) {
            return builder.header(name, hv);
        }
    }
    builder
}

/// Add the headers of a matched CORS rule.
fn set_cors_headers(
    builder: http::response::Builder,
    cors: &CorsHeaders,
) -> http::response::Builder {
    let builder = set_optional_header(
        builder,
        "Access-Control-Allow-Origin",
        Some(cors.allow_origin.as_str()),
    );
    let builder = set_optional_header(
        builder,
        "Access-Control-Allow-Methods",
        Some(cors.allow_methods.as_str()),
    );
    let builder = set_optional_header(
        builder,
        "Access-Control-Allow-Headers",
        cors.allow_headers.as_deref(),
    );
    let builder = set_optional_header(
        builder,
        "Access-Control-Expose-Headers",
        cors.expose_headers.as_deref(),
    );
    match cors.max_age_seconds {
        Some(max_age) => builder.header("Access-Control-Max-Age", max_age),
        None => builder,
    }
}

fn build_response(
    builder: http::response::Builder,
    body: S3ResponseBody,
) -> Result<http::Response<S3ResponseBody>, S3Error> {
    builder
        .body(body)
        .map_err(|e| S3Error::internal_error(format!("failed to build response: {e}")))
}

impl IntoS3Response for ListBucketOutput {
    fn into_s3_response(self) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let xml = flatstack_s3_xml::listing_to_xml(&self.document).map_err(|e| {
            S3Error::internal_error(format!("failed to serialize listing: {e}")).with_source(e)
        })?;
        let mut builder = http::Response::builder()
            .status(http::StatusCode::OK)
            .header("Content-Type", "application/xml");
        if let Some(cors) = &self.cors {
            builder = set_cors_headers(builder, cors);
        }
        build_response(builder, S3ResponseBody::from_bytes(xml))
    }
}

impl IntoS3Response for HeadBucketOutput {
    fn into_s3_response(self) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let builder = http::Response::builder()
            .status(http::StatusCode::OK)
            .header("x-rgw-object-count", self.object_count)
            .header("x-rgw-bytes-used", self.bytes_used);
        build_response(builder, S3ResponseBody::empty())
    }
}

impl IntoS3Response for CreateBucketOutput {
    fn into_s3_response(self) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let location = HeaderValue::from_str(&self.location).map_err(|e| {
            S3Error::internal_error(format!("invalid Location header: {e}")).with_source(e)
        })?;
        let builder = http::Response::builder()
            .status(http::StatusCode::OK)
            .header("Location", location)
            .header("Content-Length", 0);
        build_response(builder, S3ResponseBody::empty())
    }
}

impl IntoS3Response for OptionsBucketOutput {
    fn into_s3_response(self) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let builder = set_cors_headers(
            http::Response::builder().status(http::StatusCode::OK),
            &self.cors,
        );
        build_response(builder, S3ResponseBody::empty())
    }
}

/// A `204 No Content` response for operations without output.
pub fn no_content_response() -> Result<http::Response<S3ResponseBody>, S3Error> {
    build_response(
        http::Response::builder().status(http::StatusCode::NO_CONTENT),
        S3ResponseBody::empty(),
    )
}

/// Whether an error is sent without an `<Error>` document.
fn is_bodiless(err: &S3Error) -> bool {
    matches!(err.code, S3ErrorCode::NotModified | S3ErrorCode::NotFound)
}

/// Convert an `S3Error` into an HTTP response.
///
/// The error's extra headers (`Retry-After`, `Allow`) are copied in order.
#[must_use]
pub fn error_to_response(err: &S3Error, request_id: &str) -> http::Response<S3ResponseBody> {
    let mut builder = http::Response::builder().status(err.status_code);
    for (name, value) in &err.headers {
        builder = set_optional_header(builder, name, Some(value.as_str()));
    }

    let body = if is_bodiless(err) {
        S3ResponseBody::empty()
    } else {
        builder = builder.header("Content-Type", "application/xml");
        S3ResponseBody::from_bytes(flatstack_s3_xml::error_to_xml(err, request_id))
    };

    builder.body(body).unwrap_or_else(|_| {
        http::Response::builder()
            .status(http::StatusCode::INTERNAL_SERVER_ERROR)
            .body(S3ResponseBody::empty())
            .expect("static response should be valid")
    })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use flatstack_s3_model::output::{ListingDocument, ListingItem, ListingRoot, ObjectItem};
    use http_body_util::BodyExt;

    use super::*;

    fn header<'a>(resp: &'a http::Response<S3ResponseBody>, name: &str) -> Option<&'a str> {
        resp.headers().get(name).and_then(|v| v.to_str().ok())
    }

    async fn body_string(resp: http::Response<S3ResponseBody>) -> String {
        let bytes = resp
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes();
        String::from_utf8(bytes.to_vec()).expect("utf-8 body")
    }

    fn cors() -> CorsHeaders {
        CorsHeaders {
            allow_origin: "https://app.example.com".to_owned(),
            allow_methods: "GET, PUT".to_owned(),
            allow_headers: Some("content-type".to_owned()),
            expose_headers: None,
            max_age_seconds: Some(600),
        }
    }

    fn listing() -> ListingDocument {
        ListingDocument {
            name: "photos".to_owned(),
            prefix: String::new(),
            root: ListingRoot::Legacy {
                marker: String::new(),
                next_marker: None,
            },
            max_keys: 1000,
            delimiter: None,
            encoding_type: None,
            is_truncated: false,
            items: vec![ListingItem::Contents(ObjectItem {
                key: "cat.jpg".to_owned(),
                last_modified: Utc
                    .with_ymd_and_hms(2024, 3, 1, 10, 20, 30)
                    .single()
                    .expect("valid timestamp"),
                etag: Some("\"abc\"".to_owned()),
                size: Some(3),
                storage_class: Some("STANDARD".to_owned()),
                ..ObjectItem::default()
            })],
        }
    }

    #[tokio::test]
    async fn test_should_render_listing_as_xml_with_cors() {
        let output = ListBucketOutput {
            document: listing(),
            cors: Some(cors()),
        };
        let resp = output.into_s3_response().expect("response");
        assert_eq!(resp.status(), http::StatusCode::OK);
        assert_eq!(header(&resp, "Content-Type"), Some("application/xml"));
        assert_eq!(
            header(&resp, "Access-Control-Allow-Origin"),
            Some("https://app.example.com")
        );
        assert_eq!(header(&resp, "Access-Control-Max-Age"), Some("600"));
        assert!(header(&resp, "Access-Control-Expose-Headers").is_none());
        let body = body_string(resp).await;
        assert!(body.contains("<ListBucketResult"));
        assert!(body.contains("<Key>cat.jpg</Key>"));
    }

    #[test]
    fn test_should_report_container_counters_on_head() {
        let output = HeadBucketOutput {
            object_count: 12,
            bytes_used: 4096,
        };
        let resp = output.into_s3_response().expect("response");
        assert_eq!(header(&resp, "x-rgw-object-count"), Some("12"));
        assert_eq!(header(&resp, "x-rgw-bytes-used"), Some("4096"));
        assert!(resp.body().is_empty());
    }

    #[test]
    fn test_should_set_location_on_create() {
        let output = CreateBucketOutput {
            location: "/photos".to_owned(),
        };
        let resp = output.into_s3_response().expect("response");
        assert_eq!(header(&resp, "Location"), Some("/photos"));
    }

    #[test]
    fn test_should_omit_content_type_on_preflight() {
        let resp = OptionsBucketOutput { cors: cors() }
            .into_s3_response()
            .expect("response");
        assert_eq!(resp.status(), http::StatusCode::OK);
        assert!(header(&resp, "Content-Type").is_none());
        assert_eq!(header(&resp, "Access-Control-Allow-Methods"), Some("GET, PUT"));
    }

    #[test]
    fn test_should_return_no_content() {
        let resp = no_content_response().expect("response");
        assert_eq!(resp.status(), http::StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_should_render_error_document_with_extra_headers() {
        let err = S3Error::service_unavailable("backend busy");
        let resp = error_to_response(&err, "req-1");
        assert_eq!(resp.status(), http::StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(header(&resp, "Retry-After"), Some("1"));
        assert_eq!(header(&resp, "Content-Type"), Some("application/xml"));
        let body = body_string(resp).await;
        assert!(body.contains("<Code>ServiceUnavailable</Code>"));
        assert!(body.contains("<RequestId>req-1</RequestId>"));
    }

    #[tokio::test]
    async fn test_should_render_invalid_argument_fields() {
        let err = S3Error::invalid_argument(
            "max-keys",
            "-1",
            "Argument maxKeys must be an integer between 0 and 2147483647",
        );
        let body = body_string(error_to_response(&err, "req-2")).await;
        assert!(body.contains("<ArgumentName>max-keys</ArgumentName>"));
        assert!(body.contains("<ArgumentValue>-1</ArgumentValue>"));
    }

    #[test]
    fn test_should_send_not_modified_without_body() {
        let resp = error_to_response(&S3Error::not_modified(), "req-3");
        assert_eq!(resp.status(), http::StatusCode::NOT_MODIFIED);
        assert!(resp.body().is_empty());
        assert!(header(&resp, "Content-Type").is_none());
    }

    #[test]
    fn test_should_send_bare_not_found_without_body() {
        let resp = error_to_response(&S3Error::not_found("photos"), "req-4");
        assert_eq!(resp.status(), http::StatusCode::NOT_FOUND);
        assert!(resp.body().is_empty());
    }

    #[test]
    fn test_should_copy_allow_header_for_method_not_allowed() {
        let err = S3Error::method_not_allowed("DELETE").with_header("Allow", "GET, HEAD, PUT");
        let resp = error_to_response(&err, "req-5");
        assert_eq!(resp.status(), http::StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(header(&resp, "Allow"), Some("GET, HEAD, PUT"));
    }
}
