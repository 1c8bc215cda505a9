//! Outputs for the list operations.
//!
//! Every list output echoes its request parameters so clients can resume
//! pagination; see [`crate::types`] for the row shapes.

use crate::types::{
    BucketEntry, DeleteMarkerEntry, MultipartUploadEntry, ObjectEntry, ObjectVersionEntry, Owner,
    PartEntry,
};

/// Output of ListBuckets.
#[derive(Debug, Clone, Default)]
pub struct ListBucketsOutput {
    /// Buckets owned by the caller, sorted by name.
    pub buckets: Vec<BucketEntry>,
    /// The caller.
    pub owner: Owner,
}

/// Output of ListObjects.
#[derive(Debug, Clone, Default)]
pub struct ListObjectsOutput {
    /// Distinct prefixes rolled up under the delimiter.
    pub common_prefixes: Vec<String>,
    /// Object rows, sorted by key.
    pub contents: Vec<ObjectEntry>,
    /// Echoed `delimiter`.
    pub delimiter: Option<String>,
    /// Whether more rows exist past `max_keys`.
    pub is_truncated: bool,
    /// Echoed `marker`.
    pub marker: Option<String>,
    /// Effective `max-keys`.
    pub max_keys: i32,
    /// Bucket name.
    pub name: String,
    /// Key to pass as `marker` on the next page, set when truncated and a
    /// delimiter was used.
    pub next_marker: Option<String>,
    /// Echoed `prefix`.
    pub prefix: Option<String>,
}

/// Output of ListObjectVersions.
#[derive(Debug, Clone, Default)]
pub struct ListObjectVersionsOutput {
    /// Distinct prefixes rolled up under the delimiter.
    pub common_prefixes: Vec<String>,
    /// Delete marker rows, interleaved with versions by key then recency.
    pub delete_markers: Vec<DeleteMarkerEntry>,
    /// Echoed `delimiter`.
    pub delimiter: Option<String>,
    /// Whether more rows exist past `max_keys`.
    pub is_truncated: bool,
    /// Echoed `key-marker`.
    pub key_marker: Option<String>,
    /// Effective `max-keys`.
    pub max_keys: i32,
    /// Bucket name.
    pub name: String,
    /// Key marker for the next page.
    pub next_key_marker: Option<String>,
    /// Version id marker for the next page.
    pub next_version_id_marker: Option<String>,
    /// Echoed `prefix`.
    pub prefix: Option<String>,
    /// Echoed `version-id-marker`.
    pub version_id_marker: Option<String>,
    /// Version rows.
    pub versions: Vec<ObjectVersionEntry>,
}

/// Output of ListMultipartUploads.
#[derive(Debug, Clone, Default)]
pub struct ListMultipartUploadsOutput {
    /// Bucket name.
    pub bucket: String,
    /// Distinct prefixes rolled up under the delimiter.
    pub common_prefixes: Vec<String>,
    /// Echoed `delimiter`.
    pub delimiter: Option<String>,
    /// Whether more rows exist past `max_uploads`.
    pub is_truncated: bool,
    /// Echoed `key-marker`.
    pub key_marker: Option<String>,
    /// Effective `max-uploads`.
    pub max_uploads: i32,
    /// Key marker for the next page.
    pub next_key_marker: Option<String>,
    /// Upload id marker for the next page.
    pub next_upload_id_marker: Option<String>,
    /// Echoed `prefix`.
    pub prefix: Option<String>,
    /// Echoed `upload-id-marker`.
    pub upload_id_marker: Option<String>,
    /// In-progress upload rows, sorted by key then upload id.
    pub uploads: Vec<MultipartUploadEntry>,
}

/// Output of ListParts.
#[derive(Debug, Clone, Default)]
pub struct ListPartsOutput {
    /// Bucket name.
    pub bucket: String,
    /// Who started the upload.
    pub initiator: Owner,
    /// Whether more parts exist past `max_parts`.
    pub is_truncated: bool,
    /// Target object key.
    pub key: String,
    /// Effective `max-parts`.
    pub max_parts: i32,
    /// Part number to pass as the marker on the next page.
    pub next_part_number_marker: Option<i32>,
    /// Who will own the assembled object.
    pub owner: Owner,
    /// Echoed `part-number-marker`.
    pub part_number_marker: Option<i32>,
    /// Part rows, sorted by part number.
    pub parts: Vec<PartEntry>,
    /// Upload id.
    pub upload_id: String,
}
