//! Service-level responses: health, routing errors, common headers.

#[cfg(test)]
mod tests {
    use crate::{endpoint_url, http_client};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_report_health() {
        let resp = http_client()
            .get(format!("{}/_health", endpoint_url()))
            .send()
            .await
            .expect("health request");
        assert_eq!(resp.status().as_u16(), 200);
        let body: serde_json::Value = resp.json().await.expect("json body");
        assert_eq!(body["services"]["s3"], "running");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_not_implement_object_requests() {
        let resp = http_client()
            .get(format!("{}/some-bucket/some-key", endpoint_url()))
            .send()
            .await
            .expect("object request");
        assert_eq!(resp.status().as_u16(), 501);
        assert!(resp.headers().contains_key("x-amz-request-id"));
        assert_eq!(
            resp.headers().get("server").and_then(|v| v.to_str().ok()),
            Some("FlatStackS3")
        );
        let body = resp.text().await.expect("body");
        assert!(body.contains("<Code>NotImplemented</Code>"));
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_not_allow_service_level_writes() {
        let resp = http_client()
            .put(format!("{}/", endpoint_url()))
            .send()
            .await
            .expect("service put");
        assert_eq!(resp.status().as_u16(), 405);
    }
}
