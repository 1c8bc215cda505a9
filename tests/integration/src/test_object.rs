//! Object CRUD integration tests.

#[cfg(test)]
mod tests {
    use aws_sdk_s3::primitives::ByteStream;
    use aws_sdk_s3::types::{Delete, ObjectIdentifier};
    use base64::Engine;

    use crate::{cleanup_bucket, create_test_bucket, s3_client};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_put_and_get_object() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "putget").await;

        let body = b"hello, stratus!";
        client
            .put_object()
            .bucket(&bucket)
            .key("greeting.txt")
            .body(ByteStream::from_static(body))
            .content_type("text/plain")
            .send()
            .await
            .expect("put_object");

        let resp = client
            .get_object()
            .bucket(&bucket)
            .key("greeting.txt")
            .send()
            .await
            .expect("get_object");

        assert_eq!(resp.content_type(), Some("text/plain"));
        assert_eq!(resp.content_length(), Some(15));

        let data = resp
            .body
            .collect()
            .await
            .expect("collect body")
            .into_bytes();
        assert_eq!(data.as_ref(), body);

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_round_trip_user_metadata() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "meta").await;

        client
            .put_object()
            .bucket(&bucket)
            .key("annotated.bin")
            .body(ByteStream::from_static(b"payload"))
            .metadata("owner-team", "storage")
            .metadata("revision", "42")
            .send()
            .await
            .expect("put_object");

        let resp = client
            .head_object()
            .bucket(&bucket)
            .key("annotated.bin")
            .send()
            .await
            .expect("head_object");

        let metadata = resp.metadata().expect("metadata present");
        assert_eq!(metadata.get("owner-team").map(String::as_str), Some("storage"));
        assert_eq!(metadata.get("revision").map(String::as_str), Some("42"));

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_mismatched_content_md5() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "digest").await;

        let wrong = base64::engine::general_purpose::STANDARD.encode([0u8; 16]);
        let result = client
            .put_object()
            .bucket(&bucket)
            .key("checked.bin")
            .body(ByteStream::from_static(b"payload"))
            .content_md5(wrong)
            .send()
            .await;
        assert!(result.is_err(), "bad digest should be rejected");

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_serve_byte_range() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "range").await;

        client
            .put_object()
            .bucket(&bucket)
            .key("alphabet.txt")
            .body(ByteStream::from_static(b"abcdefghij"))
            .send()
            .await
            .expect("put_object");

        let resp = client
            .get_object()
            .bucket(&bucket)
            .key("alphabet.txt")
            .range("bytes=2-5")
            .send()
            .await
            .expect("ranged get");

        assert_eq!(resp.content_range(), Some("bytes 2-5/10"));
        let data = resp.body.collect().await.expect("collect").into_bytes();
        assert_eq!(data.as_ref(), b"cdef");

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_delete_object() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "del").await;

        client
            .put_object()
            .bucket(&bucket)
            .key("delete-me.txt")
            .body(ByteStream::from_static(b"temp"))
            .send()
            .await
            .expect("put_object");

        client
            .delete_object()
            .bucket(&bucket)
            .key("delete-me.txt")
            .send()
            .await
            .expect("delete_object");

        let result = client
            .get_object()
            .bucket(&bucket)
            .key("delete-me.txt")
            .send()
            .await;
        assert!(result.is_err(), "get after delete should fail");

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_delete_objects_batch() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "batch").await;

        for key in ["a.txt", "b.txt", "c.txt"] {
            client
                .put_object()
                .bucket(&bucket)
                .key(key)
                .body(ByteStream::from_static(b"x"))
                .send()
                .await
                .expect("put_object");
        }

        let delete = Delete::builder()
            .set_objects(Some(
                ["a.txt", "b.txt"]
                    .iter()
                    .map(|k| {
                        ObjectIdentifier::builder()
                            .key(*k)
                            .build()
                            .expect("identifier")
                    })
                    .collect(),
            ))
            .build()
            .expect("delete request");

        let resp = client
            .delete_objects()
            .bucket(&bucket)
            .delete(delete)
            .send()
            .await
            .expect("delete_objects");
        assert_eq!(resp.deleted().len(), 2);
        assert!(resp.errors().is_empty());

        let remaining = client
            .list_objects()
            .bucket(&bucket)
            .send()
            .await
            .expect("list_objects");
        assert_eq!(remaining.contents().len(), 1);

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_copy_object_between_buckets() {
        let client = s3_client();
        let source = create_test_bucket(&client, "copy-src").await;
        let target = create_test_bucket(&client, "copy-dst").await;

        client
            .put_object()
            .bucket(&source)
            .key("original.txt")
            .body(ByteStream::from_static(b"copy me"))
            .content_type("text/plain")
            .send()
            .await
            .expect("put_object");

        client
            .copy_object()
            .bucket(&target)
            .key("replica.txt")
            .copy_source(format!("{source}/original.txt"))
            .send()
            .await
            .expect("copy_object");

        let resp = client
            .get_object()
            .bucket(&target)
            .key("replica.txt")
            .send()
            .await
            .expect("get copy");
        let data = resp.body.collect().await.expect("collect").into_bytes();
        assert_eq!(data.as_ref(), b"copy me");

        cleanup_bucket(&client, &source).await;
        cleanup_bucket(&client, &target).await;
    }
}
