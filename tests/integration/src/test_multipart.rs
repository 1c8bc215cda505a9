//! Multipart upload integration tests.

#[cfg(test)]
mod tests {
    use aws_sdk_s3::primitives::ByteStream;
    use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};

    use crate::{cleanup_bucket, create_test_bucket, s3_client};

    /// Parts other than the last must be at least 5 MiB.
    const PART_SIZE: usize = 5 * 1024 * 1024;

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_complete_multipart_upload() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "mpu").await;

        let create = client
            .create_multipart_upload()
            .bucket(&bucket)
            .key("large.bin")
            .content_type("application/octet-stream")
            .send()
            .await
            .expect("create_multipart_upload");
        let upload_id = create.upload_id().expect("upload id").to_owned();

        let mut completed = Vec::new();
        for (number, fill) in [(1, b'a'), (2, b'b')] {
            let size = if number == 1 { PART_SIZE } else { 128 };
            let resp = client
                .upload_part()
                .bucket(&bucket)
                .key("large.bin")
                .upload_id(&upload_id)
                .part_number(number)
                .body(ByteStream::from(vec![fill; size]))
                .send()
                .await
                .expect("upload_part");
            completed.push(
                CompletedPart::builder()
                    .part_number(number)
                    .e_tag(resp.e_tag().expect("part etag"))
                    .build(),
            );
        }

        let done = client
            .complete_multipart_upload()
            .bucket(&bucket)
            .key("large.bin")
            .upload_id(&upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(completed))
                    .build(),
            )
            .send()
            .await
            .expect("complete_multipart_upload");
        // Aggregate ETags carry the part count suffix.
        assert!(done.e_tag().expect("etag").contains("-2"));

        let head = client
            .head_object()
            .bucket(&bucket)
            .key("large.bin")
            .send()
            .await
            .expect("head_object");
        assert_eq!(head.content_length(), Some((PART_SIZE + 128) as i64));
        assert_eq!(head.content_type(), Some("application/octet-stream"));

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_abort_multipart_upload() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "mpu-abort").await;

        let create = client
            .create_multipart_upload()
            .bucket(&bucket)
            .key("abandoned.bin")
            .send()
            .await
            .expect("create_multipart_upload");
        let upload_id = create.upload_id().expect("upload id").to_owned();

        client
            .upload_part()
            .bucket(&bucket)
            .key("abandoned.bin")
            .upload_id(&upload_id)
            .part_number(1)
            .body(ByteStream::from_static(b"partial"))
            .send()
            .await
            .expect("upload_part");

        client
            .abort_multipart_upload()
            .bucket(&bucket)
            .key("abandoned.bin")
            .upload_id(&upload_id)
            .send()
            .await
            .expect("abort_multipart_upload");

        let uploads = client
            .list_multipart_uploads()
            .bucket(&bucket)
            .send()
            .await
            .expect("list_multipart_uploads");
        assert!(uploads.uploads().is_empty());

        let result = client
            .list_parts()
            .bucket(&bucket)
            .key("abandoned.bin")
            .upload_id(&upload_id)
            .send()
            .await;
        assert!(result.is_err(), "aborted upload id is gone");

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_list_parts_in_number_order() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "mpu-parts").await;

        let create = client
            .create_multipart_upload()
            .bucket(&bucket)
            .key("ordered.bin")
            .send()
            .await
            .expect("create_multipart_upload");
        let upload_id = create.upload_id().expect("upload id").to_owned();

        for number in [3, 1, 2] {
            client
                .upload_part()
                .bucket(&bucket)
                .key("ordered.bin")
                .upload_id(&upload_id)
                .part_number(number)
                .body(ByteStream::from_static(b"chunk"))
                .send()
                .await
                .expect("upload_part");
        }

        let parts = client
            .list_parts()
            .bucket(&bucket)
            .key("ordered.bin")
            .upload_id(&upload_id)
            .send()
            .await
            .expect("list_parts");
        let numbers: Vec<_> = parts
            .parts()
            .iter()
            .filter_map(aws_sdk_s3::types::Part::part_number)
            .collect();
        assert_eq!(numbers, [1, 2, 3]);

        client
            .abort_multipart_upload()
            .bucket(&bucket)
            .key("ordered.bin")
            .upload_id(&upload_id)
            .send()
            .await
            .expect("abort");

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_completion_with_unknown_part() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "mpu-bad").await;

        let create = client
            .create_multipart_upload()
            .bucket(&bucket)
            .key("broken.bin")
            .send()
            .await
            .expect("create_multipart_upload");
        let upload_id = create.upload_id().expect("upload id").to_owned();

        let manifest = CompletedMultipartUpload::builder()
            .parts(
                CompletedPart::builder()
                    .part_number(1)
                    .e_tag("\"deadbeefdeadbeefdeadbeefdeadbeef\"")
                    .build(),
            )
            .build();

        let result = client
            .complete_multipart_upload()
            .bucket(&bucket)
            .key("broken.bin")
            .upload_id(&upload_id)
            .multipart_upload(manifest)
            .send()
            .await;
        assert!(result.is_err(), "manifest names a part never uploaded");

        cleanup_bucket(&client, &bucket).await;
    }
}
