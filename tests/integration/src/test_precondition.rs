//! Conditional request integration tests.

#[cfg(test)]
mod tests {
    use aws_sdk_s3::primitives::ByteStream;

    use crate::{cleanup_bucket, create_test_bucket, s3_client};

    async fn put_fixture(client: &aws_sdk_s3::Client, bucket: &str) -> String {
        let resp = client
            .put_object()
            .bucket(bucket)
            .key("guarded.txt")
            .body(ByteStream::from_static(b"conditional"))
            .send()
            .await
            .expect("put_object");
        resp.e_tag().expect("etag").to_owned()
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_serve_when_if_match_matches() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "ifmatch").await;
        let etag = put_fixture(&client, &bucket).await;

        client
            .get_object()
            .bucket(&bucket)
            .key("guarded.txt")
            .if_match(&etag)
            .send()
            .await
            .expect("matching If-Match should serve");

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_fail_when_if_match_differs() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "ifmatch-miss").await;
        put_fixture(&client, &bucket).await;

        let result = client
            .get_object()
            .bucket(&bucket)
            .key("guarded.txt")
            .if_match("\"00000000000000000000000000000000\"")
            .send()
            .await;
        assert!(result.is_err(), "stale If-Match should answer 412");

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_answer_not_modified_for_fresh_if_none_match() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "inm").await;
        let etag = put_fixture(&client, &bucket).await;

        let result = client
            .get_object()
            .bucket(&bucket)
            .key("guarded.txt")
            .if_none_match(&etag)
            .send()
            .await;
        // The SDK surfaces the empty 304 as an error without an S3 code.
        assert!(result.is_err(), "fresh copy should answer 304");

        cleanup_bucket(&client, &bucket).await;
    }
}
