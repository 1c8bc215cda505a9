//! Inputs for the four list operations.

/// Input for ListObjects (`GET /{bucket}`).
#[derive(Debug, Clone, Default)]
pub struct ListObjectsInput {
    /// HTTP label (URI path).
    pub bucket: String,
    /// HTTP query: `delimiter`.
    pub delimiter: Option<String>,
    /// HTTP query: `marker`.
    pub marker: Option<String>,
    /// HTTP query: `max-keys`.
    pub max_keys: Option<i32>,
    /// HTTP query: `prefix`.
    pub prefix: Option<String>,
}

/// Input for ListObjectVersions (`GET /{bucket}?versions`).
#[derive(Debug, Clone, Default)]
pub struct ListObjectVersionsInput {
    /// HTTP label (URI path).
    pub bucket: String,
    /// HTTP query: `delimiter`.
    pub delimiter: Option<String>,
    /// HTTP query: `key-marker`.
    pub key_marker: Option<String>,
    /// HTTP query: `max-keys`.
    pub max_keys: Option<i32>,
    /// HTTP query: `prefix`.
    pub prefix: Option<String>,
    /// HTTP query: `version-id-marker`.
    pub version_id_marker: Option<String>,
}

/// Input for ListMultipartUploads (`GET /{bucket}?uploads`).
#[derive(Debug, Clone, Default)]
pub struct ListMultipartUploadsInput {
    /// HTTP label (URI path).
    pub bucket: String,
    /// HTTP query: `delimiter`.
    pub delimiter: Option<String>,
    /// HTTP query: `key-marker`.
    pub key_marker: Option<String>,
    /// HTTP query: `max-uploads`.
    pub max_uploads: Option<i32>,
    /// HTTP query: `prefix`.
    pub prefix: Option<String>,
    /// HTTP query: `upload-id-marker`.
    pub upload_id_marker: Option<String>,
}

/// Input for ListParts (`GET /{bucket}/{key}?uploadId`).
#[derive(Debug, Clone, Default)]
pub struct ListPartsInput {
    /// HTTP label (URI path).
    pub bucket: String,
    /// HTTP label (URI path).
    pub key: String,
    /// HTTP query: `max-parts`.
    pub max_parts: Option<i32>,
    /// HTTP query: `part-number-marker`.
    pub part_number_marker: Option<i32>,
    /// HTTP query: `uploadId`.
    pub upload_id: String,
}
