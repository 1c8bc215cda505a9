//! Outputs for object-level operations.

use std::collections::BTreeMap;

use bytes::Bytes;
use chrono::{DateTime, Utc};

/// Output of PutObject.
#[derive(Debug, Clone, Default)]
pub struct PutObjectOutput {
    /// HTTP header: `ETag`.
    pub etag: String,
    /// HTTP header: `x-amz-version-id`, on versioned buckets.
    pub version_id: Option<String>,
}

/// Output of GetObject. HeadObject produces the same shape; the transport
/// drops the body.
#[derive(Debug, Clone, Default)]
pub struct GetObjectOutput {
    /// The selected bytes: the whole object, or the requested range.
    pub body: Bytes,
    /// HTTP header: `Cache-Control`.
    pub cache_control: Option<String>,
    /// HTTP header: `Content-Disposition`.
    pub content_disposition: Option<String>,
    /// HTTP header: `Content-Encoding`.
    pub content_encoding: Option<String>,
    /// HTTP header: `Content-Range`, present for range responses.
    pub content_range: Option<String>,
    /// HTTP header: `Content-Type`.
    pub content_type: Option<String>,
    /// HTTP header: `ETag`.
    pub etag: String,
    /// HTTP header: `Expires`.
    pub expires: Option<String>,
    /// HTTP header: `Last-Modified`.
    pub last_modified: DateTime<Utc>,
    /// HTTP prefix headers: `x-amz-meta-*`, after filtering.
    pub metadata: BTreeMap<String, String>,
    /// HTTP header: `x-amz-missing-meta`, count of entries dropped by the
    /// header-safety filter. Zero suppresses the header.
    pub missing_meta: u32,
    /// Full object size, used for the `Content-Range` total.
    pub total_size: u64,
    /// HTTP header: `x-amz-version-id`.
    pub version_id: Option<String>,
}

/// Output of DeleteObject.
#[derive(Debug, Clone, Default)]
pub struct DeleteObjectOutput {
    /// HTTP header: `x-amz-delete-marker`, true when the delete planted a
    /// marker instead of removing data.
    pub delete_marker: bool,
    /// HTTP header: `x-amz-version-id` of the marker or removed version.
    pub version_id: Option<String>,
}

/// Output of CopyObject.
#[derive(Debug, Clone, Default)]
pub struct CopyObjectOutput {
    /// `<ETag>` of the new copy.
    pub etag: String,
    /// `<LastModified>` of the new copy.
    pub last_modified: DateTime<Utc>,
    /// HTTP header: `x-amz-copy-source-version-id`.
    pub source_version_id: Option<String>,
    /// HTTP header: `x-amz-version-id` of the new copy.
    pub version_id: Option<String>,
}
