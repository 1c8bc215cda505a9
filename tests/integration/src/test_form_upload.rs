//! Browser-style `POST /{bucket}` form upload tests, driven with reqwest
//! because the AWS SDK has no PostObject client.

#[cfg(test)]
mod tests {
    use reqwest::multipart::{Form, Part};

    use crate::{cleanup_bucket, create_test_bucket, endpoint_url, s3_client, ACCESS_KEY};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_accept_form_upload() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "form").await;

        let form = Form::new()
            .text("key", "uploads/report.csv")
            .text("AWSAccessKeyId", ACCESS_KEY)
            .text("Content-Type", "text/csv")
            .part("file", Part::bytes(b"a,b\n1,2\n".to_vec()).file_name("report.csv"));

        let resp = reqwest::Client::new()
            .post(format!("{}/{bucket}", endpoint_url()))
            .multipart(form)
            .send()
            .await
            .expect("post form");

        assert_eq!(resp.status(), reqwest::StatusCode::NO_CONTENT);
        assert!(resp.headers().contains_key("etag"));

        let stored = client
            .get_object()
            .bucket(&bucket)
            .key("uploads/report.csv")
            .send()
            .await
            .expect("get uploaded object");
        assert_eq!(stored.content_type(), Some("text/csv"));
        let data = stored.body.collect().await.expect("collect").into_bytes();
        assert_eq!(data.as_ref(), b"a,b\n1,2\n");

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_substitute_filename_placeholder() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "form-name").await;

        let form = Form::new()
            .text("key", "incoming/${filename}")
            .text("AWSAccessKeyId", ACCESS_KEY)
            .part("file", Part::bytes(b"payload".to_vec()).file_name("photo.jpg"));

        let resp = reqwest::Client::new()
            .post(format!("{}/{bucket}", endpoint_url()))
            .multipart(form)
            .send()
            .await
            .expect("post form");
        assert_eq!(resp.status(), reqwest::StatusCode::NO_CONTENT);

        client
            .head_object()
            .bucket(&bucket)
            .key("incoming/photo.jpg")
            .send()
            .await
            .expect("object stored under substituted key");

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_form_without_key_field() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "form-nokey").await;

        let form = Form::new()
            .text("AWSAccessKeyId", ACCESS_KEY)
            .part("file", Part::bytes(b"payload".to_vec()).file_name("x.bin"));

        let resp = reqwest::Client::new()
            .post(format!("{}/{bucket}", endpoint_url()))
            .multipart(form)
            .send()
            .await
            .expect("post form");
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);

        cleanup_bucket(&client, &bucket).await;
    }
}
