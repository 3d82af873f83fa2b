//! CORS preflight integration tests.
//!
//! The running server starts without CORS rules, so well-formed preflights
//! are refused and malformed ones are rejected before any lookup.

#[cfg(test)]
mod tests {
    use crate::{cleanup_bucket, create_test_bucket, endpoint_url, http_client, s3_client};

    async fn preflight(bucket: &str, headers: &[(&str, &str)]) -> reqwest::Response {
        let mut req = http_client().request(
            reqwest::Method::OPTIONS,
            format!("{}/{bucket}", endpoint_url()),
        );
        for (name, value) in headers {
            req = req.header(*name, *value);
        }
        req.send().await.expect("preflight request")
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_require_origin_on_preflight() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "cors-origin").await;

        let resp = preflight(&bucket, &[("Access-Control-Request-Method", "GET")]).await;
        assert_eq!(resp.status().as_u16(), 400);
        let body = resp.text().await.expect("body");
        assert!(body.contains("<Code>CORSOriginMissing</Code>"));

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_unknown_request_method() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "cors-method").await;

        let resp = preflight(
            &bucket,
            &[
                ("Origin", "https://app.example.com"),
                ("Access-Control-Request-Method", "PATCH"),
            ],
        )
        .await;
        assert_eq!(resp.status().as_u16(), 400);
        let body = resp.text().await.expect("body");
        assert!(body.contains("<Code>CORSInvalidAccessControlRequest</Code>"));

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_forbid_preflight_without_matching_rule() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "cors-forbid").await;

        let resp = preflight(
            &bucket,
            &[
                ("Origin", "https://app.example.com"),
                ("Access-Control-Request-Method", "GET"),
            ],
        )
        .await;
        assert_eq!(resp.status().as_u16(), 403);
        let body = resp.text().await.expect("body");
        assert!(body.contains("<Code>CORSForbidden</Code>"));

        cleanup_bucket(&client, &bucket).await;
    }
}
