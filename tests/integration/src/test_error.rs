//! Error document and status code tests against the raw HTTP surface.

#[cfg(test)]
mod tests {
    use aws_sdk_s3::error::ProvideErrorMetadata;

    use crate::{cleanup_bucket, create_test_bucket, endpoint_url, s3_client, test_bucket_name};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_answer_no_such_bucket_code() {
        let client = s3_client();
        let name = test_bucket_name("missing");

        let err = client
            .list_objects()
            .bucket(&name)
            .send()
            .await
            .expect_err("missing bucket");
        assert_eq!(err.code(), Some("NoSuchBucket"));
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_answer_no_such_key_code() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "nokey").await;

        let err = client
            .get_object()
            .bucket(&bucket)
            .key("absent.txt")
            .send()
            .await
            .expect_err("missing key");
        assert_eq!(err.code(), Some("NoSuchKey"));

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_stamp_request_id_headers() {
        let resp = reqwest::Client::new()
            .get(format!("{}/{}", endpoint_url(), test_bucket_name("hdr")))
            .send()
            .await
            .expect("raw get");

        assert!(resp.headers().contains_key("x-amz-request-id"));
        assert!(resp.headers().contains_key("x-amz-id-2"));
        assert_eq!(
            resp.headers().get("server").and_then(|v| v.to_str().ok()),
            Some("Stratus")
        );
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_serve_health_endpoint() {
        let resp = reqwest::Client::new()
            .get(format!("{}/_stratus/health", endpoint_url()))
            .send()
            .await
            .expect("health get");

        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let body: serde_json::Value = resp.json().await.expect("json body");
        assert_eq!(body["status"], "running");
        assert_eq!(body["service"], "stratus");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_answer_not_implemented_for_website() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "web").await;

        let err = client
            .get_bucket_website()
            .bucket(&bucket)
            .send()
            .await
            .expect_err("website is unsupported");
        assert_eq!(err.code(), Some("NotImplemented"));

        cleanup_bucket(&client, &bucket).await;
    }
}
