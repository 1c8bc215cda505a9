//! Outputs for bucket-level operations.

use crate::types::{DeleteError, DeletedObject, VersioningStatus};

/// Output of CreateBucket.
#[derive(Debug, Clone, Default)]
pub struct CreateBucketOutput {
    /// HTTP header: `Location`, the path of the new bucket.
    pub location: String,
}

/// Output of GetBucketLocation.
#[derive(Debug, Clone, Default)]
pub struct GetBucketLocationOutput {
    /// `<LocationConstraint>` value; `None` renders the classic empty
    /// element meaning us-east-1.
    pub location_constraint: Option<String>,
}

/// Output of GetBucketVersioning.
#[derive(Debug, Clone, Default)]
pub struct GetBucketVersioningOutput {
    /// Current versioning state; unversioned buckets render an empty
    /// `<VersioningConfiguration/>`.
    pub status: VersioningStatus,
}

/// Output of GetBucketPolicy. The body is the stored JSON, byte for byte.
#[derive(Debug, Clone, Default)]
pub struct GetBucketPolicyOutput {
    /// The policy document.
    pub policy: String,
}

/// Output of DeleteObjects.
#[derive(Debug, Clone, Default)]
pub struct DeleteObjectsOutput {
    /// Keys removed, omitted in quiet mode.
    pub deleted: Vec<DeletedObject>,
    /// Keys that could not be removed.
    pub errors: Vec<DeleteError>,
}
