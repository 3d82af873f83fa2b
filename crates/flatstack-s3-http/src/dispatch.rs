//! Operation dispatch: hands a routed request to the business logic.
//!
//! The HTTP layer knows nothing about backends or listings. It identifies the
//! operation and passes the request to an [`S3Handler`], which extracts the
//! typed input ([`FromS3Request`](crate::request::FromS3Request)), runs the
//! operation, and serializes the output
//! ([`IntoS3Response`](crate::response::IntoS3Response)).

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use flatstack_s3_model::S3Operation;
use flatstack_s3_model::error::S3Error;

use crate::body::S3ResponseBody;
use crate::router::RoutingContext;

/// Boxed response future returned by [`S3Handler::handle_operation`].
pub type HandlerFuture =
    Pin<Box<dyn Future<Output = Result<http::Response<S3ResponseBody>, S3Error>> + Send>>;

/// The boundary between the HTTP layer and the bucket logic.
///
/// The future is boxed so the handler can be held as `Arc<H>` by the
/// service and shared across connection tasks.
pub trait S3Handler: Send + Sync + 'static {
    /// Handle one bucket operation and produce a complete HTTP response.
    fn handle_operation(
        &self,
        op: S3Operation,
        parts: http::request::Parts,
        body: Bytes,
        ctx: RoutingContext,
    ) -> HandlerFuture;
}

/// Dispatch a routed request to the handler.
pub async fn dispatch_operation<H: S3Handler>(
    handler: &H,
    parts: http::request::Parts,
    body: Bytes,
    ctx: RoutingContext,
) -> Result<http::Response<S3ResponseBody>, S3Error> {
    let op = ctx.operation;
    tracing::debug!(operation = %op, bucket = %ctx.bucket, "dispatching bucket operation");
    handler.handle_operation(op, parts, body, ctx).await
}

/// A handler that answers every operation with `NotImplemented`.
///
/// Useful for exercising routing and the service pipeline in isolation.
#[derive(Debug, Clone, Default)]
pub struct NotImplementedHandler;

impl S3Handler for NotImplementedHandler {
    fn handle_operation(
        &self,
        op: S3Operation,
        _parts: http::request::Parts,
        _body: Bytes,
        _ctx: RoutingContext,
    ) -> HandlerFuture {
        Box::pin(async move { Err(S3Error::not_implemented(op.as_str())) })
    }
}
