//! [`S3Handler`] implementation over the [`BucketController`].
//!
//! Each routed operation is extracted with [`FromS3Request`], handed to the
//! matching `handle_*` method, and serialized with [`IntoS3Response`].

use std::future::Future;

use bytes::Bytes;
use flatstack_s3_core::BucketController;
use flatstack_s3_http::body::S3ResponseBody;
use flatstack_s3_http::dispatch::{HandlerFuture, S3Handler};
use flatstack_s3_http::request::FromS3Request;
use flatstack_s3_http::response::{IntoS3Response, no_content_response};
use flatstack_s3_http::router::RoutingContext;
use flatstack_s3_model::S3Operation;
use flatstack_s3_model::error::S3Error;

/// Wrapper that implements [`S3Handler`] by delegating to [`BucketController`].
#[derive(Debug, Clone)]
pub struct FlatStackHandler(pub BucketController);

impl S3Handler for FlatStackHandler {
    fn handle_operation(
        &self,
        op: S3Operation,
        parts: http::request::Parts,
        body: Bytes,
        ctx: RoutingContext,
    ) -> HandlerFuture {
        let controller = self.0.clone();
        Box::pin(async move {
            match op {
                S3Operation::ListObjects
                | S3Operation::ListObjectsV2
                | S3Operation::ListObjectVersions => {
                    dispatch_output(&parts, &ctx, body, |input| {
                        controller.handle_list_bucket(input)
                    })
                    .await
                }
                S3Operation::HeadBucket => {
                    dispatch_output(&parts, &ctx, body, |input| {
                        controller.handle_head_bucket(input)
                    })
                    .await
                }
                S3Operation::CreateBucket => {
                    dispatch_output(&parts, &ctx, body, |input| {
                        controller.handle_create_bucket(input)
                    })
                    .await
                }
                S3Operation::DeleteBucket => {
                    dispatch_void(&parts, &ctx, body, |input| {
                        controller.handle_delete_bucket(input)
                    })
                    .await
                }
                S3Operation::OptionsBucket => {
                    dispatch_output(&parts, &ctx, body, |input| async {
                        controller.handle_options_bucket(input)
                    })
                    .await
                }
                S3Operation::PostBucket => {
                    controller.handle_post_bucket(&ctx.bucket)?;
                    no_content_response()
                }
            }
        })
    }
}

/// Extract the input, run the operation, and serialize its output.
async fn dispatch_output<I, O, F, Fut>(
    parts: &http::request::Parts,
    ctx: &RoutingContext,
    body: Bytes,
    handler_fn: F,
) -> Result<http::Response<S3ResponseBody>, S3Error>
where
    I: FromS3Request,
    O: IntoS3Response,
    F: FnOnce(I) -> Fut,
    Fut: Future<Output = Result<O, S3Error>>,
{
    let input = I::from_s3_request(parts, ctx, body)?;
    let output = handler_fn(input).await?;
    output.into_s3_response()
}

/// Like [`dispatch_output`] for operations without output; answers 204.
async fn dispatch_void<I, F, Fut>(
    parts: &http::request::Parts,
    ctx: &RoutingContext,
    body: Bytes,
    handler_fn: F,
) -> Result<http::Response<S3ResponseBody>, S3Error>
where
    I: FromS3Request,
    F: FnOnce(I) -> Fut,
    Fut: Future<Output = Result<(), S3Error>>,
{
    let input = I::from_s3_request(parts, ctx, body)?;
    handler_fn(input).await?;
    no_content_response()
}
