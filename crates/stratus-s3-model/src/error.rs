//! Error codes and the error carrier for the S3 REST API.
//!
//! Every failure that crosses the wire is an [`S3Error`]: a machine-readable
//! [`S3ErrorCode`], an optional human-readable message, and optional request
//! context (resource, request id). The HTTP layer renders the carrier as the
//! standard `<Error>` XML document; the status code is derived from the code
//! unless a handler overrides the message.

use http::StatusCode;

/// Convenience alias used by every fallible gateway operation.
pub type S3Result<T> = Result<T, S3Error>;

// ---------------------------------------------------------------------------
// Error codes
// ---------------------------------------------------------------------------

/// Machine-readable error codes from the S3 2006-03-01 protocol.
///
/// Only the codes the gateway actually raises are listed. Each code knows its
/// wire spelling ([`as_str`](Self::as_str)), its default HTTP status, and a
/// default message used when the raising site does not supply one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum S3ErrorCode {
    /// The caller is not permitted to perform the operation.
    AccessDenied,
    /// The `Content-MD5` header did not match the received payload.
    BadDigest,
    /// A bucket delete was attempted while objects or uploads remain.
    BucketNotEmpty,
    /// The versioning configuration document carries an unknown status.
    IllegalVersioningConfiguration,
    /// Unexpected server-side failure.
    InternalError,
    /// The access key in the request is not known to the gateway.
    InvalidAccessKeyId,
    /// A query parameter or header value is malformed.
    InvalidArgument,
    /// The bucket name violates the naming rules.
    InvalidBucketName,
    /// A part referenced by a multipart completion does not match.
    InvalidPart,
    /// Multipart completion parts were not in ascending order.
    InvalidPartOrder,
    /// The requested byte range cannot be satisfied.
    InvalidRange,
    /// The ACL document was not well-formed.
    MalformedAcl,
    /// The bucket policy document was not valid JSON or violated the schema.
    MalformedPolicy,
    /// The request body was not well-formed XML.
    MalformedXml,
    /// The HTTP method is not allowed against the resource.
    MethodNotAllowed,
    /// The named bucket does not exist.
    NoSuchBucket,
    /// The bucket exists but carries no policy.
    NoSuchBucketPolicy,
    /// The named object does not exist.
    NoSuchKey,
    /// The multipart upload id does not exist or is no longer active.
    NoSuchUpload,
    /// The named object version does not exist.
    NoSuchVersion,
    /// The request relies on a feature the gateway does not provide.
    NotImplemented,
    /// Conditional GET determined the cached copy is still fresh.
    NotModified,
    /// A conflicting conditional operation is in progress on the resource.
    OperationAborted,
    /// A request precondition evaluated to false.
    PreconditionFailed,
}

impl S3ErrorCode {
    /// Wire spelling of the code, as emitted in the `<Code>` element.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AccessDenied => "AccessDenied",
            Self::BadDigest => "BadDigest",
            Self::BucketNotEmpty => "BucketNotEmpty",
            Self::IllegalVersioningConfiguration => "IllegalVersioningConfigurationException",
            Self::InternalError => "InternalError",
            Self::InvalidAccessKeyId => "InvalidAccessKeyId",
            Self::InvalidArgument => "InvalidArgument",
            Self::InvalidBucketName => "InvalidBucketName",
            Self::InvalidPart => "InvalidPart",
            Self::InvalidPartOrder => "InvalidPartOrder",
            Self::InvalidRange => "InvalidRange",
            Self::MalformedAcl => "MalformedACLError",
            Self::MalformedPolicy => "MalformedPolicy",
            Self::MalformedXml => "MalformedXML",
            Self::MethodNotAllowed => "MethodNotAllowed",
            Self::NoSuchBucket => "NoSuchBucket",
            Self::NoSuchBucketPolicy => "NoSuchBucketPolicy",
            Self::NoSuchKey => "NoSuchKey",
            Self::NoSuchUpload => "NoSuchUpload",
            Self::NoSuchVersion => "NoSuchVersion",
            Self::NotImplemented => "NotImplemented",
            Self::NotModified => "NotModified",
            Self::OperationAborted => "OperationAborted",
            Self::PreconditionFailed => "PreconditionFailed",
        }
    }

    /// HTTP status the code maps to when the raising site does not override it.
    #[must_use]
    pub fn status_code(self) -> StatusCode {
        match self {
            Self::AccessDenied | Self::InvalidAccessKeyId => StatusCode::FORBIDDEN,
            Self::BadDigest
            | Self::IllegalVersioningConfiguration
            | Self::InvalidArgument
            | Self::InvalidBucketName
            | Self::InvalidPart
            | Self::InvalidPartOrder
            | Self::MalformedAcl
            | Self::MalformedPolicy
            | Self::MalformedXml => StatusCode::BAD_REQUEST,
            Self::BucketNotEmpty | Self::OperationAborted => StatusCode::CONFLICT,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidRange => StatusCode::RANGE_NOT_SATISFIABLE,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::NoSuchBucket
            | Self::NoSuchBucketPolicy
            | Self::NoSuchKey
            | Self::NoSuchUpload
            | Self::NoSuchVersion => StatusCode::NOT_FOUND,
            Self::NotImplemented => StatusCode::NOT_IMPLEMENTED,
            Self::NotModified => StatusCode::NOT_MODIFIED,
            Self::PreconditionFailed => StatusCode::PRECONDITION_FAILED,
        }
    }

    /// Default `<Message>` text for the code.
    #[must_use]
    pub fn default_message(self) -> &'static str {
        match self {
            Self::AccessDenied => "Access Denied",
            Self::BadDigest => {
                "The Content-MD5 you specified did not match what we received."
            }
            Self::BucketNotEmpty => "The bucket you tried to delete is not empty.",
            Self::IllegalVersioningConfiguration => {
                "The versioning configuration specified in the request is invalid."
            }
            Self::InternalError => "We encountered an internal error. Please try again.",
            Self::InvalidAccessKeyId => {
                "The access key ID you provided does not exist in our records."
            }
            Self::InvalidArgument => "Invalid Argument",
            Self::InvalidBucketName => "The specified bucket is not valid.",
            Self::InvalidPart => {
                "One or more of the specified parts could not be found or did not match."
            }
            Self::InvalidPartOrder => {
                "The list of parts was not in ascending order. Parts must be ordered by part number."
            }
            Self::InvalidRange => "The requested range is not satisfiable.",
            Self::MalformedAcl | Self::MalformedXml => {
                "The XML you provided was not well-formed or did not validate against our published schema."
            }
            Self::MalformedPolicy => "The policy document you provided was not valid.",
            Self::MethodNotAllowed => {
                "The specified method is not allowed against this resource."
            }
            Self::NoSuchBucket => "The specified bucket does not exist.",
            Self::NoSuchBucketPolicy => "The bucket policy does not exist.",
            Self::NoSuchKey => "The specified key does not exist.",
            Self::NoSuchUpload => {
                "The specified upload does not exist. The upload ID may be invalid, or the upload may have been aborted or completed."
            }
            Self::NoSuchVersion => {
                "The version ID specified in the request does not match an existing version."
            }
            Self::NotImplemented => {
                "A header or query you provided implies functionality that is not implemented."
            }
            Self::NotModified => "Not Modified",
            Self::OperationAborted => {
                "A conflicting conditional operation is currently in progress against this resource. Please try again."
            }
            Self::PreconditionFailed => {
                "At least one of the preconditions you specified did not hold."
            }
        }
    }
}

impl std::fmt::Display for S3ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Error carrier
// ---------------------------------------------------------------------------

/// An S3 API error: code plus optional per-request context.
#[derive(Debug)]
pub struct S3Error {
    code: S3ErrorCode,
    message: Option<String>,
    resource: Option<String>,
    request_id: Option<String>,
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl S3Error {
    /// Creates an error from a bare code.
    #[must_use]
    pub fn new(code: S3ErrorCode) -> Self {
        Self {
            code,
            message: None,
            resource: None,
            request_id: None,
            source: None,
        }
    }

    /// Overrides the default message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attaches the resource path the error concerns.
    #[must_use]
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Attaches the request id for the `<RequestId>` element.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Attaches the underlying cause. Never serialized; used for logging.
    #[must_use]
    pub fn with_source(
        mut self,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// The machine-readable code.
    #[must_use]
    pub fn code(&self) -> S3ErrorCode {
        self.code
    }

    /// The message to serialize, falling back to the code default.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message
            .as_deref()
            .unwrap_or_else(|| self.code.default_message())
    }

    /// The resource path, when one was attached.
    #[must_use]
    pub fn resource(&self) -> Option<&str> {
        self.resource.as_deref()
    }

    /// The request id, when one was attached.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// The HTTP status to respond with.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    // -- named constructors for the common cases ----------------------------

    /// `AccessDenied` for the given resource.
    #[must_use]
    pub fn access_denied(resource: impl Into<String>) -> Self {
        Self::new(S3ErrorCode::AccessDenied).with_resource(resource)
    }

    /// `NoSuchBucket` naming the missing bucket.
    #[must_use]
    pub fn no_such_bucket(bucket: impl Into<String>) -> Self {
        Self::new(S3ErrorCode::NoSuchBucket).with_resource(bucket)
    }

    /// `NoSuchKey` naming the missing object.
    #[must_use]
    pub fn no_such_key(key: impl Into<String>) -> Self {
        Self::new(S3ErrorCode::NoSuchKey).with_resource(key)
    }

    /// `NoSuchUpload` naming the unknown upload id.
    #[must_use]
    pub fn no_such_upload(upload_id: impl Into<String>) -> Self {
        Self::new(S3ErrorCode::NoSuchUpload).with_resource(upload_id)
    }

    /// `NoSuchVersion` naming the unknown version id.
    #[must_use]
    pub fn no_such_version(version_id: impl Into<String>) -> Self {
        Self::new(S3ErrorCode::NoSuchVersion).with_resource(version_id)
    }

    /// `InternalError` wrapping an unexpected failure.
    #[must_use]
    pub fn internal(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::new(S3ErrorCode::InternalError).with_source(source)
    }
}

impl From<S3ErrorCode> for S3Error {
    fn from(code: S3ErrorCode) -> Self {
        Self::new(code)
    }
}

impl std::fmt::Display for S3Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message())?;
        if let Some(resource) = &self.resource {
            write!(f, " (resource: {resource})")?;
        }
        Ok(())
    }
}

impl std::error::Error for S3Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|s| s as &(dyn std::error::Error + 'static))
    }
}

/// Builds an [`S3Error`] from a code, optionally with a formatted message.
///
/// ```
/// use stratus_s3_model::s3_error;
///
/// let plain = s3_error!(NoSuchBucket);
/// let described = s3_error!(InvalidArgument, "max-keys must be between 0 and {}", 1000);
/// assert_eq!(plain.message(), "The specified bucket does not exist.");
/// assert!(described.message().contains("max-keys"));
/// ```
#[macro_export]
macro_rules! s3_error {
    ($code:ident) => {
        $crate::error::S3Error::new($crate::error::S3ErrorCode::$code)
    };
    ($code:ident, $($arg:tt)+) => {
        $crate::error::S3Error::new($crate::error::S3ErrorCode::$code)
            .with_message(format!($($arg)+))
    };
}
