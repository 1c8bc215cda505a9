//! Service-layer errors.
//!
//! Gateway operations return [`ServiceError`], which carries enough detail
//! for structured logging and converts losslessly into the wire-level
//! [`S3Error`] the HTTP layer renders.

use stratus_s3_model::error::{S3Error, S3ErrorCode};
use thiserror::Error;

/// Result alias used throughout the gateway.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors raised by gateway operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    // -----------------------------------------------------------------------
    // Bucket errors
    // -----------------------------------------------------------------------
    /// The named bucket does not exist.
    #[error("bucket not found: {bucket}")]
    NoSuchBucket {
        /// Bucket name.
        bucket: String,
    },

    /// The bucket still holds objects or in-progress uploads.
    #[error("bucket not empty: {bucket}")]
    BucketNotEmpty {
        /// Bucket name.
        bucket: String,
    },

    /// The bucket name fails validation.
    #[error("invalid bucket name: {bucket}")]
    InvalidBucketName {
        /// Rejected name.
        bucket: String,
    },

    /// A concurrent create raced on the same bucket name.
    #[error("conflicting operation on bucket: {bucket}")]
    BucketNameConflict {
        /// Bucket name.
        bucket: String,
    },

    /// The bucket has no policy attached.
    #[error("no policy on bucket: {bucket}")]
    NoSuchBucketPolicy {
        /// Bucket name.
        bucket: String,
    },

    // -----------------------------------------------------------------------
    // Object errors
    // -----------------------------------------------------------------------
    /// The key does not exist in the bucket.
    #[error("key not found: {key}")]
    NoSuchKey {
        /// Object key.
        key: String,
    },

    /// The requested version id does not exist for the key.
    #[error("version not found: {key} ({version_id})")]
    NoSuchVersion {
        /// Object key.
        key: String,
        /// Requested version id.
        version_id: String,
    },

    /// The requested version id names a delete marker.
    #[error("version is a delete marker: {version_id}")]
    DeleteMarker {
        /// Delete marker version id.
        version_id: String,
    },

    /// The Range header names bytes outside the object.
    #[error("requested range not satisfiable for size {size}")]
    InvalidRange {
        /// Total object size.
        size: u64,
    },

    /// A conditional precondition failed.
    #[error("precondition failed")]
    PreconditionFailed,

    /// If-Modified-Since or If-None-Match indicates the cached copy is fresh.
    #[error("not modified")]
    NotModified,

    /// The Content-MD5 header does not match the body digest.
    #[error("content digest mismatch")]
    BadDigest,

    // -----------------------------------------------------------------------
    // Multipart errors
    // -----------------------------------------------------------------------
    /// The upload id is unknown or already completed.
    #[error("upload not found: {upload_id}")]
    NoSuchUpload {
        /// Upload id.
        upload_id: String,
    },

    /// The part number is outside 1..=10000.
    #[error("part number out of range: {part_number}")]
    InvalidPartNumber {
        /// Rejected part number.
        part_number: i32,
    },

    /// A completion part does not match a stored part.
    #[error("invalid part in completion request")]
    InvalidPart,

    /// Completion parts are not in ascending part-number order.
    #[error("completion parts out of order")]
    InvalidPartOrder,

    /// The upload is being completed by another request.
    #[error("upload is sealing: {upload_id}")]
    SealingConflict {
        /// Upload id.
        upload_id: String,
    },

    // -----------------------------------------------------------------------
    // Request errors
    // -----------------------------------------------------------------------
    /// The request body is not well-formed XML for the expected schema.
    #[error("malformed xml: {message}")]
    MalformedXml {
        /// Parse failure detail.
        message: String,
    },

    /// The policy document is not valid JSON or violates policy grammar.
    #[error("malformed policy: {message}")]
    MalformedPolicy {
        /// Validation failure detail.
        message: String,
    },

    /// The ACL document or canned ACL value is invalid.
    #[error("malformed acl: {message}")]
    MalformedAcl {
        /// Validation failure detail.
        message: String,
    },

    /// The versioning configuration status is not Enabled or Suspended.
    #[error("illegal versioning configuration")]
    IllegalVersioningConfiguration,

    /// A request parameter is invalid.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Rejection detail.
        message: String,
    },

    // -----------------------------------------------------------------------
    // Authorization errors
    // -----------------------------------------------------------------------
    /// The caller is not permitted to perform the operation.
    #[error("access denied")]
    AccessDenied,

    /// The operation is restricted to the bucket owner.
    #[error("method not allowed")]
    MethodNotAllowed,

    /// The operation is recognized but not supported.
    #[error("not implemented")]
    NotImplemented,

    // -----------------------------------------------------------------------
    // Internal errors
    // -----------------------------------------------------------------------
    /// Unexpected internal failure.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    /// Shorthand for [`ServiceError::InvalidArgument`].
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Shorthand for [`ServiceError::MalformedXml`].
    pub fn malformed_xml(message: impl Into<String>) -> Self {
        Self::MalformedXml {
            message: message.into(),
        }
    }

    /// Shorthand for [`ServiceError::MalformedPolicy`].
    pub fn malformed_policy(message: impl Into<String>) -> Self {
        Self::MalformedPolicy {
            message: message.into(),
        }
    }
}

impl From<ServiceError> for S3Error {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NoSuchBucket { bucket } => S3Error::no_such_bucket(bucket),
            ServiceError::BucketNotEmpty { bucket } => {
                S3Error::new(S3ErrorCode::BucketNotEmpty).with_resource(bucket)
            }
            ServiceError::InvalidBucketName { bucket } => {
                S3Error::new(S3ErrorCode::InvalidBucketName).with_resource(bucket)
            }
            ServiceError::BucketNameConflict { bucket } => {
                S3Error::new(S3ErrorCode::OperationAborted)
                    .with_message("A conflicting conditional operation is currently in progress against this resource.")
                    .with_resource(bucket)
            }
            ServiceError::NoSuchBucketPolicy { bucket } => {
                S3Error::new(S3ErrorCode::NoSuchBucketPolicy).with_resource(bucket)
            }
            ServiceError::NoSuchKey { key } => S3Error::no_such_key(key),
            ServiceError::NoSuchVersion { key, version_id } => {
                S3Error::no_such_version(version_id)
                    .with_message(format!("The specified version does not exist for key {key}"))
            }
            ServiceError::DeleteMarker { version_id } => {
                S3Error::new(S3ErrorCode::MethodNotAllowed)
                    .with_message("The specified method is not allowed against this resource.")
                    .with_resource(version_id)
            }
            ServiceError::InvalidRange { size } => {
                S3Error::new(S3ErrorCode::InvalidRange)
                    .with_message(format!("The requested range is not satisfiable (object size {size})"))
            }
            ServiceError::PreconditionFailed => {
                S3Error::new(S3ErrorCode::PreconditionFailed)
            }
            ServiceError::NotModified => S3Error::new(S3ErrorCode::NotModified),
            ServiceError::BadDigest => S3Error::new(S3ErrorCode::BadDigest),
            ServiceError::NoSuchUpload { upload_id } => S3Error::no_such_upload(upload_id),
            ServiceError::InvalidPartNumber { part_number } => {
                S3Error::new(S3ErrorCode::InvalidRange).with_message(format!(
                    "Part number must be an integer between 1 and 10000, inclusive (got {part_number})"
                ))
            }
            ServiceError::InvalidPart => S3Error::new(S3ErrorCode::InvalidPart),
            ServiceError::InvalidPartOrder => {
                S3Error::new(S3ErrorCode::InvalidPartOrder)
            }
            ServiceError::SealingConflict { upload_id } => {
                S3Error::new(S3ErrorCode::OperationAborted)
                    .with_message("A conflicting conditional operation is currently in progress against this resource.")
                    .with_resource(upload_id)
            }
            ServiceError::MalformedXml { message } => {
                S3Error::new(S3ErrorCode::MalformedXml).with_message(message)
            }
            ServiceError::MalformedPolicy { message } => {
                S3Error::new(S3ErrorCode::MalformedPolicy).with_message(message)
            }
            ServiceError::MalformedAcl { message } => {
                S3Error::new(S3ErrorCode::MalformedAcl).with_message(message)
            }
            ServiceError::IllegalVersioningConfiguration => {
                S3Error::new(S3ErrorCode::IllegalVersioningConfiguration)
            }
            ServiceError::InvalidArgument { message } => {
                S3Error::new(S3ErrorCode::InvalidArgument).with_message(message)
            }
            ServiceError::AccessDenied => S3Error::new(S3ErrorCode::AccessDenied),
            ServiceError::MethodNotAllowed => {
                S3Error::new(S3ErrorCode::MethodNotAllowed)
            }
            ServiceError::NotImplemented => S3Error::new(S3ErrorCode::NotImplemented),
            ServiceError::Internal(source) => {
                S3Error::new(S3ErrorCode::InternalError).with_message(source.to_string())
            }
        }
    }
}
