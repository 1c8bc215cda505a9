//! Inputs for the multipart upload lifecycle.

use std::collections::BTreeMap;

use bytes::Bytes;

use crate::types::{CannedAcl, CompletedPart};

/// Input for CreateMultipartUpload (`POST ?uploads`).
#[derive(Debug, Clone, Default)]
pub struct CreateMultipartUploadInput {
    /// HTTP header: `x-amz-acl`.
    pub acl: Option<CannedAcl>,
    /// HTTP label (URI path).
    pub bucket: String,
    /// HTTP header: `Cache-Control`.
    pub cache_control: Option<String>,
    /// HTTP header: `Content-Disposition`.
    pub content_disposition: Option<String>,
    /// HTTP header: `Content-Encoding`.
    pub content_encoding: Option<String>,
    /// HTTP header: `Content-Type`.
    pub content_type: Option<String>,
    /// HTTP header: `Expires`.
    pub expires: Option<String>,
    /// HTTP label (URI path).
    pub key: String,
    /// HTTP prefix headers: `x-amz-meta-`.
    pub metadata: BTreeMap<String, String>,
}

/// Input for UploadPart (`PUT ?partNumber&uploadId`).
#[derive(Debug, Clone, Default)]
pub struct UploadPartInput {
    /// HTTP payload body.
    pub body: Bytes,
    /// HTTP label (URI path).
    pub bucket: String,
    /// HTTP header: `Content-MD5`.
    pub content_md5: Option<String>,
    /// HTTP label (URI path).
    pub key: String,
    /// HTTP query: `partNumber`.
    pub part_number: i32,
    /// HTTP query: `uploadId`.
    pub upload_id: String,
}

/// Input for CompleteMultipartUpload (`POST ?uploadId`).
#[derive(Debug, Clone, Default)]
pub struct CompleteMultipartUploadInput {
    /// HTTP label (URI path).
    pub bucket: String,
    /// HTTP label (URI path).
    pub key: String,
    /// HTTP payload body: `<CompleteMultipartUpload>` part manifest.
    pub parts: Vec<CompletedPart>,
    /// HTTP query: `uploadId`.
    pub upload_id: String,
}

/// Input for AbortMultipartUpload (`DELETE ?uploadId`).
#[derive(Debug, Clone, Default)]
pub struct AbortMultipartUploadInput {
    /// HTTP label (URI path).
    pub bucket: String,
    /// HTTP label (URI path).
    pub key: String,
    /// HTTP query: `uploadId`.
    pub upload_id: String,
}
