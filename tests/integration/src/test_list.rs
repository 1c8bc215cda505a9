//! ListObjects pagination and delimiter tests.

#[cfg(test)]
mod tests {
    use aws_sdk_s3::primitives::ByteStream;

    use crate::{cleanup_bucket, create_test_bucket, s3_client};

    async fn seed(client: &aws_sdk_s3::Client, bucket: &str, keys: &[&str]) {
        for key in keys {
            client
                .put_object()
                .bucket(bucket)
                .key(*key)
                .body(ByteStream::from_static(b"x"))
                .send()
                .await
                .expect("put_object");
        }
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_list_objects_in_key_order() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "order").await;
        seed(&client, &bucket, &["cherry", "apple", "banana"]).await;

        let resp = client
            .list_objects()
            .bucket(&bucket)
            .send()
            .await
            .expect("list_objects");
        let keys: Vec<_> = resp.contents().iter().filter_map(|o| o.key()).collect();
        assert_eq!(keys, ["apple", "banana", "cherry"]);

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_filter_by_prefix() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "prefix").await;
        seed(&client, &bucket, &["logs/a", "logs/b", "data/a"]).await;

        let resp = client
            .list_objects()
            .bucket(&bucket)
            .prefix("logs/")
            .send()
            .await
            .expect("list_objects");
        assert_eq!(resp.contents().len(), 2);

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_roll_up_common_prefixes() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "delim").await;
        seed(
            &client,
            &bucket,
            &["photos/2024/a.jpg", "photos/2025/b.jpg", "readme.txt"],
        )
        .await;

        let resp = client
            .list_objects()
            .bucket(&bucket)
            .delimiter("/")
            .send()
            .await
            .expect("list_objects");

        let prefixes: Vec<_> = resp
            .common_prefixes()
            .iter()
            .filter_map(|p| p.prefix())
            .collect();
        assert_eq!(prefixes, ["photos/"]);
        let keys: Vec<_> = resp.contents().iter().filter_map(|o| o.key()).collect();
        assert_eq!(keys, ["readme.txt"]);

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_paginate_with_marker() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "page").await;
        seed(&client, &bucket, &["k1", "k2", "k3", "k4", "k5"]).await;

        let first = client
            .list_objects()
            .bucket(&bucket)
            .max_keys(2)
            .send()
            .await
            .expect("first page");
        assert_eq!(first.contents().len(), 2);
        assert_eq!(first.is_truncated(), Some(true));

        let marker = first
            .contents()
            .last()
            .and_then(|o| o.key())
            .expect("last key")
            .to_owned();

        let second = client
            .list_objects()
            .bucket(&bucket)
            .max_keys(10)
            .marker(marker)
            .send()
            .await
            .expect("second page");
        let keys: Vec<_> = second.contents().iter().filter_map(|o| o.key()).collect();
        assert_eq!(keys, ["k3", "k4", "k5"]);
        assert_eq!(second.is_truncated(), Some(false));

        cleanup_bucket(&client, &bucket).await;
    }
}
