//! Integration tests for the Stratus S3 server.
//!
//! These tests require a running Stratus server at `localhost:4583`.
//! They are marked `#[ignore]` so they don't run during normal `cargo test`.
//!
//! Run them with:
//! ```text
//! cargo test -p stratus-integration -- --ignored
//! ```

use std::sync::Once;

use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Endpoint URL for the server.
pub fn endpoint_url() -> String {
    std::env::var("S3_ENDPOINT_URL").unwrap_or_else(|_| "http://localhost:4583".to_owned())
}

/// Access key registered in the server's default credential table.
pub const ACCESS_KEY: &str = "STRATUSEXAMPLEKEY";

/// Create a configured S3 client pointing at the local server.
#[must_use]
pub fn s3_client() -> aws_sdk_s3::Client {
    init_tracing();

    let creds = Credentials::new(ACCESS_KEY, "test", None, None, "integration-test");

    let config = aws_sdk_s3::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(creds)
        .endpoint_url(endpoint_url())
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(config)
}

/// Generate a unique bucket name for a test.
#[must_use]
pub fn test_bucket_name(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("test-{prefix}-{id}")
}

/// Create a bucket and return its name. Caller is responsible for cleanup.
pub async fn create_test_bucket(client: &aws_sdk_s3::Client, prefix: &str) -> String {
    let name = test_bucket_name(prefix);
    client
        .create_bucket()
        .bucket(&name)
        .send()
        .await
        .unwrap_or_else(|e| panic!("failed to create bucket {name}: {e}"));
    name
}

/// Delete every version and delete marker in a bucket, abort in-progress
/// uploads, then delete the bucket.
pub async fn cleanup_bucket(client: &aws_sdk_s3::Client, bucket: &str) {
    if let Ok(resp) = client.list_object_versions().bucket(bucket).send().await {
        for version in resp.versions() {
            if let Some(key) = version.key() {
                let mut req = client.delete_object().bucket(bucket).key(key);
                if let Some(vid) = version.version_id() {
                    req = req.version_id(vid);
                }
                let _ = req.send().await;
            }
        }
        for marker in resp.delete_markers() {
            if let (Some(key), Some(vid)) = (marker.key(), marker.version_id()) {
                let _ = client
                    .delete_object()
                    .bucket(bucket)
                    .key(key)
                    .version_id(vid)
                    .send()
                    .await;
            }
        }
    }

    if let Ok(uploads) = client.list_multipart_uploads().bucket(bucket).send().await {
        for upload in uploads.uploads() {
            if let (Some(key), Some(id)) = (upload.key(), upload.upload_id()) {
                let _ = client
                    .abort_multipart_upload()
                    .bucket(bucket)
                    .key(key)
                    .upload_id(id)
                    .send()
                    .await;
            }
        }
    }

    let _ = client.delete_bucket().bucket(bucket).send().await;
}

mod test_bucket;
mod test_error;
mod test_form_upload;
mod test_list;
mod test_multipart;
mod test_object;
mod test_policy_acl;
mod test_precondition;
mod test_versioning;
