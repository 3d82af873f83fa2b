//! Bucket lifecycle integration tests.

#[cfg(test)]
mod tests {
    use aws_sdk_s3::error::ProvideErrorMetadata;
    use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};

    use crate::{
        cleanup_bucket, create_test_bucket, endpoint_url, http_client, s3_client,
        test_bucket_name,
    };

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_create_and_delete_bucket() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "create").await;

        let head = client.head_bucket().bucket(&bucket).send().await;
        assert!(head.is_ok(), "head_bucket should succeed");

        client
            .delete_bucket()
            .bucket(&bucket)
            .send()
            .await
            .expect("delete_bucket");

        let head = client.head_bucket().bucket(&bucket).send().await;
        assert!(head.is_err(), "head_bucket should fail after delete");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_report_container_counters_on_head() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "counters").await;

        let resp = http_client()
            .head(format!("{}/{bucket}", endpoint_url()))
            .send()
            .await
            .expect("head request");
        assert_eq!(resp.status().as_u16(), 200);
        assert_eq!(
            resp.headers()
                .get("x-rgw-object-count")
                .and_then(|v| v.to_str().ok()),
            Some("0")
        );
        assert!(resp.headers().contains_key("x-rgw-bytes-used"));
        assert!(resp.headers().contains_key("x-amz-request-id"));

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_duplicate_bucket() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "dup").await;

        let err = client
            .create_bucket()
            .bucket(&bucket)
            .send()
            .await
            .expect_err("second create should fail");
        assert_eq!(
            err.as_service_error().and_then(|e| e.code()),
            Some("BucketAlreadyOwnedByYou")
        );

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_foreign_location_constraint() {
        let client = s3_client();
        let bucket = test_bucket_name("region");

        let config = CreateBucketConfiguration::builder()
            .location_constraint(BucketLocationConstraint::EuWest1)
            .build();
        let err = client
            .create_bucket()
            .bucket(&bucket)
            .create_bucket_configuration(config)
            .send()
            .await
            .expect_err("foreign region should fail");
        assert_eq!(
            err.as_service_error().and_then(|e| e.code()),
            Some("InvalidLocationConstraint")
        );
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_invalid_bucket_name() {
        let resp = http_client()
            .put(format!("{}/Invalid_Bucket", endpoint_url()))
            .send()
            .await
            .expect("put request");
        assert_eq!(resp.status().as_u16(), 400);
        let body = resp.text().await.expect("body");
        assert!(body.contains("<Code>InvalidBucketName</Code>"));
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_return_no_such_bucket_on_delete() {
        let client = s3_client();
        let err = client
            .delete_bucket()
            .bucket(test_bucket_name("missing"))
            .send()
            .await
            .expect_err("missing bucket");
        assert_eq!(
            err.as_service_error().and_then(|e| e.code()),
            Some("NoSuchBucket")
        );
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_refuse_form_upload() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "post").await;

        let resp = http_client()
            .post(format!("{}/{bucket}", endpoint_url()))
            .send()
            .await
            .expect("post request");
        assert_eq!(resp.status().as_u16(), 501);

        cleanup_bucket(&client, &bucket).await;
    }
}
