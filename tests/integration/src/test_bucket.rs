//! Bucket lifecycle integration tests.

#[cfg(test)]
mod tests {
    use crate::{cleanup_bucket, create_test_bucket, s3_client, test_bucket_name};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_create_and_head_bucket() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "lifecycle").await;

        client
            .head_bucket()
            .bucket(&bucket)
            .send()
            .await
            .expect("head_bucket");

        cleanup_bucket(&client, &bucket).await;

        let result = client.head_bucket().bucket(&bucket).send().await;
        assert!(result.is_err(), "head after delete should fail");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_list_own_buckets() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "listing").await;

        let resp = client.list_buckets().send().await.expect("list_buckets");
        let names: Vec<_> = resp.buckets().iter().filter_map(|b| b.name()).collect();
        assert!(names.contains(&bucket.as_str()), "new bucket should appear");

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_duplicate_bucket_name() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "dup").await;

        let result = client.create_bucket().bucket(&bucket).send().await;
        assert!(result.is_err(), "second create should conflict");

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_invalid_bucket_name() {
        let client = s3_client();

        let result = client.create_bucket().bucket("ab").send().await;
        assert!(result.is_err(), "two-character name is invalid");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_report_bucket_location() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "loc").await;

        let resp = client
            .get_bucket_location()
            .bucket(&bucket)
            .send()
            .await
            .expect("get_bucket_location");
        // us-east-1 renders as the classic empty constraint.
        assert!(resp.location_constraint().is_none());

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_refuse_to_delete_missing_bucket() {
        let client = s3_client();
        let name = test_bucket_name("ghost");

        let result = client.delete_bucket().bucket(&name).send().await;
        assert!(result.is_err(), "deleting a missing bucket should fail");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_refuse_to_delete_non_empty_bucket() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "occupied").await;

        client
            .put_object()
            .bucket(&bucket)
            .key("keeper.txt")
            .body(aws_sdk_s3::primitives::ByteStream::from_static(b"stay"))
            .send()
            .await
            .expect("put_object");

        let result = client.delete_bucket().bucket(&bucket).send().await;
        assert!(result.is_err(), "non-empty bucket delete should fail");

        cleanup_bucket(&client, &bucket).await;
    }
}
