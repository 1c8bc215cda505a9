//! Operation identifiers used by request routing and policy evaluation.

/// The S3 operations the gateway dispatches.
///
/// The router resolves every request to exactly one variant before any state
/// is touched; the policy evaluator matches the variant's
/// [`action`](Self::action) string against policy statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum S3Operation {
    /// Create a bucket (`PUT /{bucket}`).
    CreateBucket,
    /// Delete an empty bucket (`DELETE /{bucket}`).
    DeleteBucket,
    /// Probe bucket existence and access (`HEAD /{bucket}`).
    HeadBucket,
    /// List the caller's buckets (`GET /`).
    ListBuckets,
    /// Report the bucket's region (`GET /{bucket}?location`).
    GetBucketLocation,
    /// Read the versioning configuration (`GET /{bucket}?versioning`).
    GetBucketVersioning,
    /// Replace the versioning configuration (`PUT /{bucket}?versioning`).
    PutBucketVersioning,
    /// Read the bucket policy (`GET /{bucket}?policy`).
    GetBucketPolicy,
    /// Attach a bucket policy (`PUT /{bucket}?policy`).
    PutBucketPolicy,
    /// Remove the bucket policy (`DELETE /{bucket}?policy`).
    DeleteBucketPolicy,
    /// Read the access logging configuration (`GET /{bucket}?logging`).
    GetBucketLogging,
    /// Replace the access logging configuration (`PUT /{bucket}?logging`).
    PutBucketLogging,
    /// Read the website configuration (`GET /{bucket}?website`).
    GetBucketWebsite,
    /// Replace the website configuration (`PUT /{bucket}?website`).
    PutBucketWebsite,
    /// Remove the website configuration (`DELETE /{bucket}?website`).
    DeleteBucketWebsite,
    /// Read the bucket ACL (`GET /{bucket}?acl`).
    GetBucketAcl,
    /// Replace the bucket ACL (`PUT /{bucket}?acl`).
    PutBucketAcl,
    /// List objects in a bucket (`GET /{bucket}`).
    ListObjects,
    /// List object versions and delete markers (`GET /{bucket}?versions`).
    ListObjectVersions,
    /// List in-progress multipart uploads (`GET /{bucket}?uploads`).
    ListMultipartUploads,
    /// Delete a batch of objects (`POST /{bucket}?delete`).
    DeleteObjects,
    /// Store an object (`PUT /{bucket}/{key}`).
    PutObject,
    /// Retrieve an object (`GET /{bucket}/{key}`).
    GetObject,
    /// Retrieve object metadata (`HEAD /{bucket}/{key}`).
    HeadObject,
    /// Delete an object or plant a delete marker (`DELETE /{bucket}/{key}`).
    DeleteObject,
    /// Server-side copy (`PUT /{bucket}/{key}` with `x-amz-copy-source`).
    CopyObject,
    /// Read an object ACL (`GET /{bucket}/{key}?acl`).
    GetObjectAcl,
    /// Replace an object ACL (`PUT /{bucket}/{key}?acl`).
    PutObjectAcl,
    /// Browser form upload (`POST /{bucket}` with multipart/form-data).
    PostObject,
    /// Start a multipart upload (`POST /{bucket}/{key}?uploads`).
    CreateMultipartUpload,
    /// Upload one part (`PUT /{bucket}/{key}?partNumber&uploadId`).
    UploadPart,
    /// Assemble uploaded parts (`POST /{bucket}/{key}?uploadId`).
    CompleteMultipartUpload,
    /// Discard an upload and its parts (`DELETE /{bucket}/{key}?uploadId`).
    AbortMultipartUpload,
    /// List uploaded parts (`GET /{bucket}/{key}?uploadId`).
    ListParts,
}

impl S3Operation {
    /// The AWS operation name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreateBucket => "CreateBucket",
            Self::DeleteBucket => "DeleteBucket",
            Self::HeadBucket => "HeadBucket",
            Self::ListBuckets => "ListBuckets",
            Self::GetBucketLocation => "GetBucketLocation",
            Self::GetBucketVersioning => "GetBucketVersioning",
            Self::PutBucketVersioning => "PutBucketVersioning",
            Self::GetBucketPolicy => "GetBucketPolicy",
            Self::PutBucketPolicy => "PutBucketPolicy",
            Self::DeleteBucketPolicy => "DeleteBucketPolicy",
            Self::GetBucketLogging => "GetBucketLogging",
            Self::PutBucketLogging => "PutBucketLogging",
            Self::GetBucketWebsite => "GetBucketWebsite",
            Self::PutBucketWebsite => "PutBucketWebsite",
            Self::DeleteBucketWebsite => "DeleteBucketWebsite",
            Self::GetBucketAcl => "GetBucketAcl",
            Self::PutBucketAcl => "PutBucketAcl",
            Self::ListObjects => "ListObjects",
            Self::ListObjectVersions => "ListObjectVersions",
            Self::ListMultipartUploads => "ListMultipartUploads",
            Self::DeleteObjects => "DeleteObjects",
            Self::PutObject => "PutObject",
            Self::GetObject => "GetObject",
            Self::HeadObject => "HeadObject",
            Self::DeleteObject => "DeleteObject",
            Self::CopyObject => "CopyObject",
            Self::GetObjectAcl => "GetObjectAcl",
            Self::PutObjectAcl => "PutObjectAcl",
            Self::PostObject => "PostObject",
            Self::CreateMultipartUpload => "CreateMultipartUpload",
            Self::UploadPart => "UploadPart",
            Self::CompleteMultipartUpload => "CompleteMultipartUpload",
            Self::AbortMultipartUpload => "AbortMultipartUpload",
            Self::ListParts => "ListParts",
        }
    }

    /// The IAM action string bucket policies match against.
    ///
    /// Several operations share an action: `HeadObject` is authorized as
    /// `s3:GetObject`, and every multipart write is authorized as
    /// `s3:PutObject`, matching how AWS documents the mapping.
    #[must_use]
    pub fn action(self) -> &'static str {
        match self {
            Self::CreateBucket => "s3:CreateBucket",
            Self::DeleteBucket => "s3:DeleteBucket",
            Self::HeadBucket | Self::ListObjects => "s3:ListBucket",
            Self::ListBuckets => "s3:ListAllMyBuckets",
            Self::GetBucketLocation => "s3:GetBucketLocation",
            Self::GetBucketVersioning => "s3:GetBucketVersioning",
            Self::PutBucketVersioning => "s3:PutBucketVersioning",
            Self::GetBucketPolicy => "s3:GetBucketPolicy",
            Self::PutBucketPolicy => "s3:PutBucketPolicy",
            Self::DeleteBucketPolicy => "s3:DeleteBucketPolicy",
            Self::GetBucketLogging => "s3:GetBucketLogging",
            Self::PutBucketLogging => "s3:PutBucketLogging",
            Self::GetBucketWebsite => "s3:GetBucketWebsite",
            Self::PutBucketWebsite => "s3:PutBucketWebsite",
            Self::DeleteBucketWebsite => "s3:DeleteBucketWebsite",
            Self::GetBucketAcl => "s3:GetBucketAcl",
            Self::PutBucketAcl => "s3:PutBucketAcl",
            Self::ListObjectVersions => "s3:ListBucketVersions",
            Self::ListMultipartUploads => "s3:ListBucketMultipartUploads",
            Self::DeleteObjects | Self::DeleteObject => "s3:DeleteObject",
            Self::PutObject
            | Self::CopyObject
            | Self::PostObject
            | Self::CreateMultipartUpload
            | Self::UploadPart
            | Self::CompleteMultipartUpload => "s3:PutObject",
            Self::GetObject | Self::HeadObject => "s3:GetObject",
            Self::GetObjectAcl => "s3:GetObjectAcl",
            Self::PutObjectAcl => "s3:PutObjectAcl",
            Self::AbortMultipartUpload => "s3:AbortMultipartUpload",
            Self::ListParts => "s3:ListMultipartUploadParts",
        }
    }

    /// Whether the operation targets an object key rather than the bucket.
    #[must_use]
    pub fn is_object_operation(self) -> bool {
        matches!(
            self,
            Self::PutObject
                | Self::GetObject
                | Self::HeadObject
                | Self::DeleteObject
                | Self::CopyObject
                | Self::GetObjectAcl
                | Self::PutObjectAcl
                | Self::CreateMultipartUpload
                | Self::UploadPart
                | Self::CompleteMultipartUpload
                | Self::AbortMultipartUpload
                | Self::ListParts
        )
    }
}

impl std::fmt::Display for S3Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_map_head_object_to_get_object_action() {
        assert_eq!(S3Operation::HeadObject.action(), "s3:GetObject");
    }

    #[test]
    fn test_should_map_multipart_writes_to_put_object_action() {
        assert_eq!(S3Operation::CreateMultipartUpload.action(), "s3:PutObject");
        assert_eq!(S3Operation::UploadPart.action(), "s3:PutObject");
        assert_eq!(
            S3Operation::CompleteMultipartUpload.action(),
            "s3:PutObject"
        );
        assert_eq!(
            S3Operation::AbortMultipartUpload.action(),
            "s3:AbortMultipartUpload"
        );
    }

    #[test]
    fn test_should_classify_object_operations() {
        assert!(S3Operation::UploadPart.is_object_operation());
        assert!(S3Operation::GetObjectAcl.is_object_operation());
        assert!(!S3Operation::ListObjects.is_object_operation());
        assert!(!S3Operation::PostObject.is_object_operation());
    }

    #[test]
    fn test_should_display_operation_name() {
        assert_eq!(S3Operation::ListObjectVersions.to_string(), "ListObjectVersions");
    }
}
