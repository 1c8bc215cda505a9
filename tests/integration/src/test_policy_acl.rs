//! Bucket policy and ACL integration tests.

#[cfg(test)]
mod tests {
    use aws_sdk_s3::primitives::ByteStream;
    use aws_sdk_s3::types::BucketCannedAcl;

    use crate::{cleanup_bucket, create_test_bucket, endpoint_url, s3_client};

    fn allow_all_policy(bucket: &str) -> String {
        serde_json::json!({
            "Version": "2012-10-17",
            "Statement": [{
                "Sid": "PublicRead",
                "Effect": "Allow",
                "Principal": "*",
                "Action": "s3:GetObject",
                "Resource": format!("arn:aws:s3:::{bucket}/*")
            }]
        })
        .to_string()
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_round_trip_bucket_policy() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "policy").await;

        client
            .put_bucket_policy()
            .bucket(&bucket)
            .policy(allow_all_policy(&bucket))
            .send()
            .await
            .expect("put_bucket_policy");

        let resp = client
            .get_bucket_policy()
            .bucket(&bucket)
            .send()
            .await
            .expect("get_bucket_policy");
        let document: serde_json::Value =
            serde_json::from_str(resp.policy().expect("policy text")).expect("valid json");
        assert_eq!(document["Statement"][0]["Sid"], "PublicRead");

        client
            .delete_bucket_policy()
            .bucket(&bucket)
            .send()
            .await
            .expect("delete_bucket_policy");

        let result = client.get_bucket_policy().bucket(&bucket).send().await;
        assert!(result.is_err(), "deleted policy should not be served");

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_malformed_policy() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "badpolicy").await;

        let result = client
            .put_bucket_policy()
            .bucket(&bucket)
            .policy("this is not json")
            .send()
            .await;
        assert!(result.is_err(), "non-JSON policy should be rejected");

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_open_object_to_anonymous_via_policy() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "anon").await;

        client
            .put_object()
            .bucket(&bucket)
            .key("open.txt")
            .body(ByteStream::from_static(b"public data"))
            .send()
            .await
            .expect("put_object");

        let anonymous = reqwest::Client::new();
        let url = format!("{}/{bucket}/open.txt", endpoint_url());

        let resp = anonymous.get(&url).send().await.expect("anonymous get");
        assert_eq!(resp.status(), reqwest::StatusCode::FORBIDDEN);

        client
            .put_bucket_policy()
            .bucket(&bucket)
            .policy(allow_all_policy(&bucket))
            .send()
            .await
            .expect("put_bucket_policy");

        let resp = anonymous.get(&url).send().await.expect("anonymous get");
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        assert_eq!(resp.text().await.expect("body"), "public data");

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_expose_public_read_acl_grant() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "acl").await;

        client
            .put_bucket_acl()
            .bucket(&bucket)
            .acl(BucketCannedAcl::PublicRead)
            .send()
            .await
            .expect("put_bucket_acl");

        let resp = client
            .get_bucket_acl()
            .bucket(&bucket)
            .send()
            .await
            .expect("get_bucket_acl");

        assert!(resp.owner().is_some(), "owner should be reported");
        let has_all_users_read = resp.grants().iter().any(|grant| {
            grant
                .grantee()
                .and_then(|g| g.uri())
                .is_some_and(|uri| uri.ends_with("AllUsers"))
        });
        assert!(has_all_users_read, "public-read should grant AllUsers");

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_report_object_acl_owner() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "oacl").await;

        client
            .put_object()
            .bucket(&bucket)
            .key("owned.txt")
            .body(ByteStream::from_static(b"mine"))
            .send()
            .await
            .expect("put_object");

        let resp = client
            .get_object_acl()
            .bucket(&bucket)
            .key("owned.txt")
            .send()
            .await
            .expect("get_object_acl");
        assert!(resp.owner().is_some());
        assert!(!resp.grants().is_empty(), "owner grant is always present");

        cleanup_bucket(&client, &bucket).await;
    }
}
