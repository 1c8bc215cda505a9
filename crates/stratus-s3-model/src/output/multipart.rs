//! Outputs for the multipart upload lifecycle.

/// Output of CreateMultipartUpload.
#[derive(Debug, Clone, Default)]
pub struct CreateMultipartUploadOutput {
    /// Bucket name.
    pub bucket: String,
    /// Target object key.
    pub key: String,
    /// Freshly minted upload id.
    pub upload_id: String,
}

/// Output of UploadPart.
#[derive(Debug, Clone, Default)]
pub struct UploadPartOutput {
    /// HTTP header: `ETag`, quoted MD5 of the part body.
    pub etag: String,
}

/// Output of CompleteMultipartUpload.
#[derive(Debug, Clone, Default)]
pub struct CompleteMultipartUploadOutput {
    /// Bucket name.
    pub bucket: String,
    /// Composite entity tag of the assembled object.
    pub etag: String,
    /// Object key.
    pub key: String,
    /// Canonical URL of the assembled object.
    pub location: String,
    /// Version id minted for the assembled object, on versioned buckets.
    pub version_id: Option<String>,
}
