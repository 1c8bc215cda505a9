//! Inputs for object-level operations.

use std::collections::BTreeMap;

use bytes::Bytes;

use crate::types::{AccessControlPolicy, CannedAcl, MetadataDirective};

/// Input for PutObject.
#[derive(Debug, Clone, Default)]
pub struct PutObjectInput {
    /// HTTP header: `x-amz-acl`.
    pub acl: Option<CannedAcl>,
    /// HTTP payload body.
    pub body: Bytes,
    /// HTTP label (URI path).
    pub bucket: String,
    /// HTTP header: `Cache-Control`.
    pub cache_control: Option<String>,
    /// HTTP header: `Content-Disposition`.
    pub content_disposition: Option<String>,
    /// HTTP header: `Content-Encoding`.
    pub content_encoding: Option<String>,
    /// HTTP header: `Content-MD5`.
    pub content_md5: Option<String>,
    /// HTTP header: `Content-Type`.
    pub content_type: Option<String>,
    /// HTTP header: `Expires`.
    pub expires: Option<String>,
    /// HTTP label (URI path).
    pub key: String,
    /// HTTP prefix headers: `x-amz-meta-`.
    pub metadata: BTreeMap<String, String>,
}

/// Input for GetObject.
#[derive(Debug, Clone, Default)]
pub struct GetObjectInput {
    /// HTTP label (URI path).
    pub bucket: String,
    /// HTTP header: `If-Match`.
    pub if_match: Option<String>,
    /// HTTP header: `If-Modified-Since`.
    pub if_modified_since: Option<chrono::DateTime<chrono::Utc>>,
    /// HTTP header: `If-None-Match`.
    pub if_none_match: Option<String>,
    /// HTTP header: `If-Unmodified-Since`.
    pub if_unmodified_since: Option<chrono::DateTime<chrono::Utc>>,
    /// HTTP label (URI path).
    pub key: String,
    /// HTTP header: `Range`.
    pub range: Option<String>,
    /// HTTP query: `versionId`.
    pub version_id: Option<String>,
}

/// Input for HeadObject. Same surface as [`GetObjectInput`]; the body is
/// simply never sent.
#[derive(Debug, Clone, Default)]
pub struct HeadObjectInput {
    /// HTTP label (URI path).
    pub bucket: String,
    /// HTTP header: `If-Match`.
    pub if_match: Option<String>,
    /// HTTP header: `If-Modified-Since`.
    pub if_modified_since: Option<chrono::DateTime<chrono::Utc>>,
    /// HTTP header: `If-None-Match`.
    pub if_none_match: Option<String>,
    /// HTTP header: `If-Unmodified-Since`.
    pub if_unmodified_since: Option<chrono::DateTime<chrono::Utc>>,
    /// HTTP label (URI path).
    pub key: String,
    /// HTTP header: `Range`.
    pub range: Option<String>,
    /// HTTP query: `versionId`.
    pub version_id: Option<String>,
}

/// Input for DeleteObject.
#[derive(Debug, Clone, Default)]
pub struct DeleteObjectInput {
    /// HTTP label (URI path).
    pub bucket: String,
    /// HTTP label (URI path).
    pub key: String,
    /// HTTP query: `versionId`.
    pub version_id: Option<String>,
}

/// Input for CopyObject.
///
/// `copy_source` keeps the raw header value; the gateway splits it into
/// source bucket, key, and optional `?versionId=` suffix during dispatch.
#[derive(Debug, Clone, Default)]
pub struct CopyObjectInput {
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
    /// HTTP header: `x-amz-copy-source`.
    pub copy_source: String,
    /// HTTP header: `x-amz-copy-source-if-match`.
    pub copy_source_if_match: Option<String>,
    /// HTTP header: `x-amz-copy-source-if-modified-since`.
    pub copy_source_if_modified_since: Option<chrono::DateTime<chrono::Utc>>,
    /// HTTP header: `x-amz-copy-source-if-none-match`.
    pub copy_source_if_none_match: Option<String>,
    /// HTTP header: `x-amz-copy-source-if-unmodified-since`.
    pub copy_source_if_unmodified_since: Option<chrono::DateTime<chrono::Utc>>,
    /// HTTP header: `Expires`.
    pub expires: Option<String>,
    /// HTTP label (URI path).
    pub key: String,
    /// HTTP prefix headers: `x-amz-meta-`.
    pub metadata: BTreeMap<String, String>,
    /// HTTP header: `x-amz-metadata-directive`.
    pub metadata_directive: Option<MetadataDirective>,
}

/// Input for GetObjectAcl.
#[derive(Debug, Clone, Default)]
pub struct GetObjectAclInput {
    /// HTTP label (URI path).
    pub bucket: String,
    /// HTTP label (URI path).
    pub key: String,
    /// HTTP query: `versionId`.
    pub version_id: Option<String>,
}

/// Input for PutObjectAcl.
#[derive(Debug, Clone, Default)]
pub struct PutObjectAclInput {
    /// HTTP header: `x-amz-acl`.
    pub acl: Option<CannedAcl>,
    /// HTTP payload body: `<AccessControlPolicy>`.
    pub access_control_policy: Option<AccessControlPolicy>,
    /// HTTP label (URI path).
    pub bucket: String,
    /// HTTP label (URI path).
    pub key: String,
    /// HTTP query: `versionId`.
    pub version_id: Option<String>,
}

/// Input for PostObject, assembled from `multipart/form-data` fields.
///
/// The access key travels as the `AWSAccessKeyId` form field rather than a
/// header, so identity resolution for form uploads happens only after the
/// form has been parsed.
#[derive(Debug, Clone, Default)]
pub struct PostObjectInput {
    /// Form field: `acl`.
    pub acl: Option<CannedAcl>,
    /// Form field: `AWSAccessKeyId`.
    pub access_key_id: Option<String>,
    /// File part payload.
    pub body: Bytes,
    /// HTTP label (URI path).
    pub bucket: String,
    /// Form field: `Content-Type` for the stored object.
    pub content_type: Option<String>,
    /// Form field: `key`, after `${filename}` substitution.
    pub key: String,
    /// Form fields: `x-amz-meta-*`.
    pub metadata: BTreeMap<String, String>,
}
