//! Versioning integration tests.

#[cfg(test)]
mod tests {
    use aws_sdk_s3::primitives::ByteStream;
    use aws_sdk_s3::types::{
        BucketVersioningStatus, VersioningConfiguration as SdkVersioningConfiguration,
    };

    use crate::{cleanup_bucket, create_test_bucket, s3_client};

    async fn enable_versioning(client: &aws_sdk_s3::Client, bucket: &str) {
        client
            .put_bucket_versioning()
            .bucket(bucket)
            .versioning_configuration(
                SdkVersioningConfiguration::builder()
                    .status(BucketVersioningStatus::Enabled)
                    .build(),
            )
            .send()
            .await
            .expect("put_bucket_versioning");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_report_versioning_status() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "vstatus").await;

        let resp = client
            .get_bucket_versioning()
            .bucket(&bucket)
            .send()
            .await
            .expect("get_bucket_versioning");
        assert!(resp.status().is_none(), "fresh bucket is unversioned");

        enable_versioning(&client, &bucket).await;

        let resp = client
            .get_bucket_versioning()
            .bucket(&bucket)
            .send()
            .await
            .expect("get_bucket_versioning");
        assert_eq!(resp.status(), Some(&BucketVersioningStatus::Enabled));

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_keep_both_versions_after_overwrite() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "vkeep").await;
        enable_versioning(&client, &bucket).await;

        let first = client
            .put_object()
            .bucket(&bucket)
            .key("doc.txt")
            .body(ByteStream::from_static(b"v1"))
            .send()
            .await
            .expect("first put");
        let first_vid = first.version_id().expect("version id").to_owned();

        let second = client
            .put_object()
            .bucket(&bucket)
            .key("doc.txt")
            .body(ByteStream::from_static(b"v2"))
            .send()
            .await
            .expect("second put");
        assert_ne!(second.version_id(), Some(first_vid.as_str()));

        // Plain GET serves the latest; versionId pins the older write.
        let latest = client
            .get_object()
            .bucket(&bucket)
            .key("doc.txt")
            .send()
            .await
            .expect("get latest");
        let data = latest.body.collect().await.expect("collect").into_bytes();
        assert_eq!(data.as_ref(), b"v2");

        let pinned = client
            .get_object()
            .bucket(&bucket)
            .key("doc.txt")
            .version_id(&first_vid)
            .send()
            .await
            .expect("get pinned");
        let data = pinned.body.collect().await.expect("collect").into_bytes();
        assert_eq!(data.as_ref(), b"v1");

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_insert_delete_marker() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "vmarker").await;
        enable_versioning(&client, &bucket).await;

        client
            .put_object()
            .bucket(&bucket)
            .key("gone.txt")
            .body(ByteStream::from_static(b"data"))
            .send()
            .await
            .expect("put_object");

        let del = client
            .delete_object()
            .bucket(&bucket)
            .key("gone.txt")
            .send()
            .await
            .expect("delete_object");
        assert_eq!(del.delete_marker(), Some(true));
        let marker_vid = del.version_id().expect("marker version id").to_owned();

        let result = client
            .get_object()
            .bucket(&bucket)
            .key("gone.txt")
            .send()
            .await;
        assert!(result.is_err(), "latest version is a delete marker");

        // Removing the marker resurrects the object.
        client
            .delete_object()
            .bucket(&bucket)
            .key("gone.txt")
            .version_id(&marker_vid)
            .send()
            .await
            .expect("remove marker");

        client
            .get_object()
            .bucket(&bucket)
            .key("gone.txt")
            .send()
            .await
            .expect("object visible again");

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_list_versions_and_markers() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "vlist").await;
        enable_versioning(&client, &bucket).await;

        for _ in 0..2 {
            client
                .put_object()
                .bucket(&bucket)
                .key("history.txt")
                .body(ByteStream::from_static(b"x"))
                .send()
                .await
                .expect("put_object");
        }
        client
            .delete_object()
            .bucket(&bucket)
            .key("history.txt")
            .send()
            .await
            .expect("delete_object");

        let resp = client
            .list_object_versions()
            .bucket(&bucket)
            .send()
            .await
            .expect("list_object_versions");
        assert_eq!(resp.versions().len(), 2);
        assert_eq!(resp.delete_markers().len(), 1);
        assert_eq!(
            resp.delete_markers()[0].is_latest(),
            Some(true),
            "marker is the newest row"
        );

        cleanup_bucket(&client, &bucket).await;
    }
}
