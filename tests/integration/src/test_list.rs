//! Listing integration tests.
//!
//! The server only exposes bucket-level operations, so these tests cover
//! empty listings, echoed parameters, and argument validation.

#[cfg(test)]
mod tests {
    use aws_sdk_s3::error::ProvideErrorMetadata;
    use aws_sdk_s3::types::EncodingType;

    use crate::{
        cleanup_bucket, create_test_bucket, endpoint_url, http_client, s3_client,
        test_bucket_name,
    };

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_list_empty_bucket_v1() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "list-v1").await;

        let resp = client
            .list_objects()
            .bucket(&bucket)
            .prefix("photos/")
            .delimiter("/")
            .max_keys(10)
            .send()
            .await
            .expect("list_objects");
        assert_eq!(resp.name(), Some(bucket.as_str()));
        assert_eq!(resp.prefix(), Some("photos/"));
        assert_eq!(resp.delimiter(), Some("/"));
        assert_eq!(resp.max_keys(), Some(10));
        assert_eq!(resp.is_truncated(), Some(false));
        assert!(resp.contents().is_empty());
        assert!(resp.next_marker().is_none());

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_list_empty_bucket_v2() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "list-v2").await;

        let resp = client
            .list_objects_v2()
            .bucket(&bucket)
            .start_after("a")
            .send()
            .await
            .expect("list_objects_v2");
        assert_eq!(resp.key_count(), Some(0));
        assert_eq!(resp.start_after(), Some("a"));
        assert_eq!(resp.is_truncated(), Some(false));
        assert!(resp.next_continuation_token().is_none());

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_list_empty_bucket_versions() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "versions").await;

        let resp = client
            .list_object_versions()
            .bucket(&bucket)
            .key_marker("k")
            .send()
            .await
            .expect("list_object_versions");
        assert_eq!(resp.key_marker(), Some("k"));
        assert!(resp.versions().is_empty());
        assert!(resp.delete_markers().is_empty());

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_echo_url_encoding_type() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "encoding").await;

        let resp = client
            .list_objects_v2()
            .bucket(&bucket)
            .encoding_type(EncodingType::Url)
            .send()
            .await
            .expect("list_objects_v2");
        assert_eq!(resp.encoding_type(), Some(&EncodingType::Url));

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_negative_max_keys() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "maxkeys").await;

        let resp = http_client()
            .get(format!("{}/{bucket}?max-keys=-1", endpoint_url()))
            .send()
            .await
            .expect("list request");
        assert_eq!(resp.status().as_u16(), 400);
        let body = resp.text().await.expect("body");
        assert!(body.contains("<Code>InvalidArgument</Code>"));
        assert!(body.contains("<ArgumentName>max-keys</ArgumentName>"));

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_unknown_encoding_type() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "badenc").await;

        let resp = http_client()
            .get(format!("{}/{bucket}?encoding-type=gzip", endpoint_url()))
            .send()
            .await
            .expect("list request");
        assert_eq!(resp.status().as_u16(), 400);
        let body = resp.text().await.expect("body");
        assert!(body.contains("<ArgumentName>encoding-type</ArgumentName>"));

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_version_marker_without_key_marker() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "vmarker").await;

        let resp = http_client()
            .get(format!("{}/{bucket}?versions&version-id-marker=abc", endpoint_url()))
            .send()
            .await
            .expect("list request");
        assert_eq!(resp.status().as_u16(), 400);

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_return_no_such_bucket_on_listing() {
        let client = s3_client();
        let err = client
            .list_objects_v2()
            .bucket(test_bucket_name("absent"))
            .send()
            .await
            .expect_err("missing bucket");
        assert_eq!(
            err.as_service_error().and_then(|e| e.code()),
            Some("NoSuchBucket")
        );
    }
}
