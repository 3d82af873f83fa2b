//! Bucket lifecycle handlers.
//!
//! Implements `head_bucket`, `create_bucket`, `delete_bucket`, `post_bucket`
//! and the `OPTIONS` CORS preflight.

use flatstack_s3_model::S3Error;
use flatstack_s3_model::input::{
    CreateBucketInput, DeleteBucketInput, HeadBucketInput, OptionsBucketInput,
};
use flatstack_s3_model::output::{CreateBucketOutput, HeadBucketOutput, OptionsBucketOutput};
use http::Method;
use tracing::{debug, info};

use super::bucket_error;
use crate::access::BucketAction;
use crate::controller::BucketController;
use crate::cors::CORS_ALLOWED_METHODS;
use crate::error::S3ServiceError;
use crate::interceptor::RequestContext;
use crate::teardown::SegmentTeardown;
use crate::validation::{validate_bucket_name, validate_location};

impl BucketController {
    /// Probe a bucket. An absent bucket is a bare 404.
    pub async fn handle_head_bucket(
        &self,
        input: HeadBucketInput,
    ) -> Result<HeadBucketOutput, S3Error> {
        let bucket = input.bucket.as_str();
        self.access
            .check(&input.identity, BucketAction::ListBucket, bucket)
            .map_err(S3ServiceError::into_s3_error)?;

        let ctx = RequestContext::new(Method::HEAD, bucket);
        let backend = self.backend.as_ref();
        let meta = self
            .head_chain
            .run(&ctx, backend, || async {
                backend
                    .container_metadata(bucket)
                    .await
                    .map_err(S3ServiceError::from)
            })
            .await?;

        debug!(bucket, count = meta.object_count, "head_bucket completed");
        Ok(HeadBucketOutput {
            object_count: meta.object_count,
            bytes_used: meta.bytes_used,
        })
    }

    /// Create a bucket.
    pub async fn handle_create_bucket(
        &self,
        input: CreateBucketInput,
    ) -> Result<CreateBucketOutput, S3Error> {
        let bucket = input.bucket.as_str();
        self.access
            .check(&input.identity, BucketAction::CreateBucket, bucket)
            .map_err(S3ServiceError::into_s3_error)?;
        validate_bucket_name(bucket).map_err(S3ServiceError::into_s3_error)?;
        validate_location(input.configuration.as_ref(), &self.config.location)
            .map_err(S3ServiceError::into_s3_error)?;

        let ctx = RequestContext::new(Method::PUT, bucket);
        let backend = self.backend.as_ref();
        self.chain
            .run(&ctx, backend, || async {
                backend
                    .create_container(bucket)
                    .await
                    .map_err(|e| bucket_error(bucket, e))
            })
            .await?;

        info!(bucket, "bucket created");
        Ok(CreateBucketOutput {
            location: format!("/{bucket}"),
        })
    }

    /// Delete a bucket, tearing down its segments container first when
    /// multipart uploads are enabled.
    pub async fn handle_delete_bucket(&self, input: DeleteBucketInput) -> Result<(), S3Error> {
        let bucket = input.bucket.as_str();
        self.access
            .check(&input.identity, BucketAction::DeleteBucket, bucket)
            .map_err(S3ServiceError::into_s3_error)?;

        let ctx = RequestContext::new(Method::DELETE, bucket);
        let backend = self.backend.as_ref();
        let segments = self.config.segments_container(bucket);
        self.chain
            .run(&ctx, backend, || async {
                if self.config.allow_multipart_uploads {
                    SegmentTeardown::new(
                        backend,
                        bucket,
                        &segments,
                        self.config.default_bucket_listing,
                    )
                    .run()
                    .await?;
                }
                backend
                    .delete_container(bucket)
                    .await
                    .map_err(|e| bucket_error(bucket, e))
            })
            .await?;

        info!(bucket, "bucket deleted");
        Ok(())
    }

    /// `POST /{bucket}` is not supported.
    #[allow(clippy::unused_self)]
    pub fn handle_post_bucket(&self, bucket: &str) -> Result<(), S3Error> {
        debug!(bucket, "post_bucket rejected");
        Err(S3ServiceError::NotImplemented.into_s3_error())
    }

    /// Answer a CORS preflight.
    pub fn handle_options_bucket(
        &self,
        input: OptionsBucketInput,
    ) -> Result<OptionsBucketOutput, S3Error> {
        let origin = input
            .origin
            .as_deref()
            .filter(|o| !o.is_empty())
            .ok_or_else(|| S3ServiceError::CorsOriginMissing.into_s3_error())?;

        let method = input.request_method.unwrap_or_default();
        if !CORS_ALLOWED_METHODS.contains(&method.as_str()) {
            return Err(S3ServiceError::CorsInvalidAccessControlRequest { method }.into_s3_error());
        }

        let cors = self
            .cors
            .match_preflight(&input.bucket, origin, &method, &input.request_headers)
            .ok_or_else(|| S3ServiceError::CorsForbidden {
                method: method.clone(),
            })
            .map_err(S3ServiceError::into_s3_error)?;

        debug!(bucket = %input.bucket, origin, method = %method, "preflight allowed");
        Ok(OptionsBucketOutput { cors })
    }
}
