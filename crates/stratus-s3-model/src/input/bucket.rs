//! Inputs for bucket-level operations.

use crate::types::{AccessControlPolicy, CannedAcl, Delete, VersioningStatus};

/// Input for CreateBucket.
#[derive(Debug, Clone, Default)]
pub struct CreateBucketInput {
    /// HTTP header: `x-amz-acl`.
    pub acl: Option<CannedAcl>,
    /// HTTP label (URI path).
    pub bucket: String,
    /// HTTP payload body: `<CreateBucketConfiguration>` location constraint.
    pub location_constraint: Option<String>,
}

/// Input for DeleteBucket.
#[derive(Debug, Clone, Default)]
pub struct DeleteBucketInput {
    /// HTTP label (URI path).
    pub bucket: String,
}

/// Input for HeadBucket.
#[derive(Debug, Clone, Default)]
pub struct HeadBucketInput {
    /// HTTP label (URI path).
    pub bucket: String,
}

/// Input for GetBucketLocation.
#[derive(Debug, Clone, Default)]
pub struct GetBucketLocationInput {
    /// HTTP label (URI path).
    pub bucket: String,
}

/// Input for GetBucketVersioning.
#[derive(Debug, Clone, Default)]
pub struct GetBucketVersioningInput {
    /// HTTP label (URI path).
    pub bucket: String,
}

/// Input for PutBucketVersioning.
#[derive(Debug, Clone, Default)]
pub struct PutBucketVersioningInput {
    /// HTTP label (URI path).
    pub bucket: String,
    /// HTTP payload body: the requested `<Status>`.
    pub status: Option<VersioningStatus>,
}

/// Input for GetBucketPolicy.
#[derive(Debug, Clone, Default)]
pub struct GetBucketPolicyInput {
    /// HTTP label (URI path).
    pub bucket: String,
}

/// Input for PutBucketPolicy.
#[derive(Debug, Clone, Default)]
pub struct PutBucketPolicyInput {
    /// HTTP label (URI path).
    pub bucket: String,
    /// HTTP payload body: the policy JSON document, stored verbatim.
    pub policy: String,
}

/// Input for DeleteBucketPolicy.
#[derive(Debug, Clone, Default)]
pub struct DeleteBucketPolicyInput {
    /// HTTP label (URI path).
    pub bucket: String,
}

/// Input for GetBucketAcl.
#[derive(Debug, Clone, Default)]
pub struct GetBucketAclInput {
    /// HTTP label (URI path).
    pub bucket: String,
}

/// Input for PutBucketAcl.
///
/// Exactly one of `acl` and `access_control_policy` is normally present; when
/// both are, the canned header wins, matching the original gateway.
#[derive(Debug, Clone, Default)]
pub struct PutBucketAclInput {
    /// HTTP header: `x-amz-acl`.
    pub acl: Option<CannedAcl>,
    /// HTTP payload body: `<AccessControlPolicy>`.
    pub access_control_policy: Option<AccessControlPolicy>,
    /// HTTP label (URI path).
    pub bucket: String,
}

/// Input for DeleteObjects (`POST ?delete`).
#[derive(Debug, Clone, Default)]
pub struct DeleteObjectsInput {
    /// HTTP label (URI path).
    pub bucket: String,
    /// HTTP payload body: `<Delete>`.
    pub delete: Delete,
}
