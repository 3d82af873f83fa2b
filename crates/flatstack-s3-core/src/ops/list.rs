//! Listing handler for `ListObjects`, `ListObjectsV2` and
//! `ListObjectVersions`.

use flatstack_s3_model::input::ListBucketInput;
use flatstack_s3_model::output::ListBucketOutput;
use flatstack_s3_model::{ListingVariant, S3Error, S3Operation};
use http::Method;
use tracing::debug;

use super::bucket_error;
use crate::access::BucketAction;
use crate::controller::BucketController;
use crate::error::S3ServiceError;
use crate::interceptor::RequestContext;
use crate::listing::{invoke_listing, parse_listing_request};

/// The operation name a listing variant is reported under.
#[must_use]
pub fn listing_operation(variant: ListingVariant) -> S3Operation {
    match variant {
        ListingVariant::Legacy => S3Operation::ListObjects,
        ListingVariant::Paginated => S3Operation::ListObjectsV2,
        ListingVariant::Versioned => S3Operation::ListObjectVersions,
    }
}

impl BucketController {
    /// List a bucket.
    ///
    /// Parses the query, fetches one page with lookahead inside the
    /// interceptor chain, and assembles the variant's document. CORS headers
    /// are attached when `Origin` matches a `GET` rule.
    pub async fn handle_list_bucket(
        &self,
        input: ListBucketInput,
    ) -> Result<ListBucketOutput, S3Error> {
        let bucket = input.bucket.as_str();
        self.access
            .check(&input.identity, BucketAction::ListBucket, bucket)
            .map_err(S3ServiceError::into_s3_error)?;

        let parsed = parse_listing_request(
            &input.query,
            self.config.max_bucket_listing,
            self.config.default_bucket_listing,
        )
        .map_err(S3ServiceError::into_s3_error)?;

        let ctx = RequestContext::new(Method::GET, bucket);
        let backend = self.backend.as_ref();
        let page = self
            .chain
            .run(&ctx, backend, || async {
                invoke_listing(backend, bucket, &parsed.request, parsed.page_size)
                    .await
                    .map_err(|e| bucket_error(bucket, e))
            })
            .await?;

        let document = self
            .assembler
            .assemble(bucket, &input.identity, &parsed, &page);
        let cors = input
            .origin
            .as_deref()
            .filter(|origin| !origin.is_empty())
            .and_then(|origin| self.cors.match_request(bucket, origin, "GET"));

        debug!(
            bucket,
            operation = %listing_operation(parsed.variant),
            count = page.entries.len(),
            is_truncated = page.truncated,
            "listing completed"
        );

        Ok(ListBucketOutput { document, cors })
    }
}
