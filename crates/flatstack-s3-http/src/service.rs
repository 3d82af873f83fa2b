//! The S3 HTTP service implementing hyper's `Service` trait.
//!
//! [`S3HttpService`] runs each request through:
//!
//! 1. Health check interception (`GET /_health`)
//! 2. Routing via [`S3Router`]
//! 3. Request body collection
//! 4. Dispatch to the [`S3Handler`]
//! 5. Error response formatting
//! 6. Common response headers (`x-amz-request-id`, `x-amz-id-2`, `Server`)

use std::convert::Infallible;
use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use flatstack_s3_model::error::S3Error;
use http::header::HeaderValue;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::service::Service;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::body::S3ResponseBody;
use crate::dispatch::{S3Handler, dispatch_operation};
use crate::response::error_to_response;
use crate::router::S3Router;

/// Value of the `Server` response header.
pub const SERVER_NAME: &str = "FlatStackS3";

/// Configuration for the S3 HTTP service.
#[derive(Debug, Clone)]
pub struct S3HttpConfig {
    /// The base domain for virtual-hosted-style requests (e.g. `s3.localhost`).
    pub domain: String,
    /// Whether to enable virtual-hosted-style bucket addressing.
    pub virtual_hosting: bool,
}

impl Default for S3HttpConfig {
    fn default() -> Self {
        Self {
            domain: "s3.localhost".to_owned(),
            virtual_hosting: true,
        }
    }
}

/// The S3 HTTP service.
///
/// Cloning is cheap; every connection gets its own clone.
#[derive(Debug)]
pub struct S3HttpService<H: S3Handler> {
    handler: Arc<H>,
    router: S3Router,
}

impl<H: S3Handler> S3HttpService<H> {
    /// Create a service owning `handler`.
    #[must_use]
    pub fn new(handler: H, config: S3HttpConfig) -> Self {
        Self::from_shared(Arc::new(handler), config)
    }

    /// Create a service from a shared handler.
    #[must_use]
    pub fn from_shared(handler: Arc<H>, config: S3HttpConfig) -> Self {
        Self {
            handler,
            router: S3Router::new(config.domain, config.virtual_hosting),
        }
    }
}

impl<H: S3Handler> Clone for S3HttpService<H> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            router: self.router.clone(),
        }
    }
}

impl<H: S3Handler> Service<http::Request<Incoming>> for S3HttpService<H> {
    type Response = http::Response<S3ResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let handler = Arc::clone(&self.handler);
        let router = self.router.clone();

        Box::pin(async move {
            let request_id = Uuid::new_v4().to_string();
            let response = process_request(req, handler.as_ref(), &router, &request_id).await;
            Ok(add_common_headers(response, &request_id))
        })
    }
}

/// Run one request through the pipeline.
async fn process_request<H, B>(
    req: http::Request<B>,
    handler: &H,
    router: &S3Router,
    request_id: &str,
) -> http::Response<S3ResponseBody>
where
    H: S3Handler,
    B: http_body::Body<Data = Bytes>,
    B::Error: Display,
{
    let method = req.method().clone();
    let uri = req.uri().clone();
    debug!(%method, %uri, request_id, "processing S3 request");

    if is_health_check(&method, uri.path()) {
        return health_check_response();
    }

    let ctx = match router.resolve(&req) {
        Ok(ctx) => ctx,
        Err(err) => {
            warn!(%method, %uri, error = %err, request_id, "failed to route S3 request");
            return finish(&method, error_to_response(&err, request_id));
        }
    };

    info!(
        operation = %ctx.operation,
        bucket = %ctx.bucket,
        request_id,
        "routed S3 request"
    );

    let (parts, incoming) = req.into_parts();
    let body = match incoming.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            error!(error = %err, request_id, "failed to collect request body");
            let s3_err = S3Error::internal_error("Failed to read request body");
            return finish(&method, error_to_response(&s3_err, request_id));
        }
    };

    let response = match dispatch_operation(handler, parts, body, ctx).await {
        Ok(response) => response,
        Err(err) => {
            debug!(
                error = %err,
                status = err.status_code.as_u16(),
                request_id,
                "S3 operation returned error"
            );
            error_to_response(&err, request_id)
        }
    };
    finish(&method, response)
}

/// Drop the payload of responses to `HEAD` requests.
fn finish(
    method: &http::Method,
    mut response: http::Response<S3ResponseBody>,
) -> http::Response<S3ResponseBody> {
    if *method == http::Method::HEAD {
        *response.body_mut() = S3ResponseBody::empty();
    }
    response
}

fn is_health_check(method: &http::Method, path: &str) -> bool {
    *method == http::Method::GET && (path == "/_health" || path == "/health")
}

fn health_check_response() -> http::Response<S3ResponseBody> {
    http::Response::builder()
        .status(http::StatusCode::OK)
        .header("Content-Type", "application/json")
        .body(S3ResponseBody::from_string(
            r#"{"status":"running","services":{"s3":"running"}}"#,
        ))
        .expect("static health response should be valid")
}

/// Add `x-amz-request-id`, `x-amz-id-2`, and `Server`.
fn add_common_headers(
    mut response: http::Response<S3ResponseBody>,
    request_id: &str,
) -> http::Response<S3ResponseBody> {
    let headers = response.headers_mut();
    if let Ok(hv) = HeaderValue::from_str(request_id) {
        headers.insert("x-amz-request-id", hv.clone());
        headers.insert("x-amz-id-2", hv);
    }
    headers.insert("Server", HeaderValue::from_static(SERVER_NAME));
    response
}
