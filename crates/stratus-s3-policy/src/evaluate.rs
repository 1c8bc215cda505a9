//! Access decisions.
//!
//! Policy and ACL checks both return a [`Decision`] sum type rather than
//! raising; callers choose the HTTP status from the decision kind.

use std::net::IpAddr;

use tracing::debug;

use stratus_s3_model::S3Operation;
use stratus_s3_model::types::{AccessControlList, Permission};

use crate::condition::conditions_match;
use crate::document::{ARN_PREFIX, BucketPolicy, Effect, Statement};
use crate::glob;

/// Outcome of a policy or ACL access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The request may proceed.
    Allow,
    /// A statement or ACL check refused the request; maps to 403.
    DenyExplicit,
    /// No statement matched. The caller falls back to ownership checks;
    /// owner-restricted operations map this to 405 for non-owners.
    DenyDefault,
}

impl Decision {
    /// Whether the request may proceed.
    #[must_use]
    pub fn is_allow(self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// One access check: who is acting, what they are doing, and the ambient
/// condition values the request carried.
#[derive(Debug, Clone)]
pub struct AccessRequest {
    /// The operation being attempted.
    pub action: S3Operation,
    /// Target bucket name.
    pub bucket: String,
    /// Target object key; absent for bucket-level operations.
    pub key: Option<String>,
    /// Canonical user ID of the caller; `None` for anonymous requests.
    pub caller: Option<String>,
    /// Peer address the request arrived from.
    pub source_ip: Option<IpAddr>,
    /// `prefix` parameter, on listing operations that carry one.
    pub prefix: Option<String>,
    /// `delimiter` parameter, on listing operations that carry one.
    pub delimiter: Option<String>,
    /// `max-keys` parameter, on listing operations that carry one.
    pub max_keys: Option<i32>,
}

impl AccessRequest {
    /// A bucket-level request with no caller and no condition values;
    /// fill in the rest with struct update syntax.
    #[must_use]
    pub fn new(action: S3Operation, bucket: impl Into<String>) -> Self {
        Self {
            action,
            bucket: bucket.into(),
            key: None,
            caller: None,
            source_ip: None,
            prefix: None,
            delimiter: None,
            max_keys: None,
        }
    }

    /// The resource string statements are matched against, without the ARN
    /// prefix: `bucket` or `bucket/key`.
    #[must_use]
    pub fn resource(&self) -> String {
        match &self.key {
            Some(key) => format!("{}/{}", self.bucket, key),
            None => self.bucket.clone(),
        }
    }
}

/// Evaluate a bucket policy against one request.
///
/// Deny statements are scanned first: any match is authoritative and yields
/// [`Decision::DenyExplicit`] no matter what Allow statements exist.
/// Otherwise the first matching Allow statement yields [`Decision::Allow`],
/// and no match at all yields [`Decision::DenyDefault`].
#[must_use]
pub fn evaluate(policy: &BucketPolicy, request: &AccessRequest) -> Decision {
    let resource = request.resource();
    let action = request.action.action();

    for statement in policy.statements.iter().filter(|s| s.effect == Effect::Deny) {
        if statement_matches(statement, request, action, &resource) {
            debug!(
                bucket = %request.bucket,
                action,
                sid = statement.sid.as_deref().unwrap_or_default(),
                "request refused by policy statement"
            );
            return Decision::DenyExplicit;
        }
    }
    if policy
        .statements
        .iter()
        .filter(|s| s.effect == Effect::Allow)
        .any(|s| statement_matches(s, request, action, &resource))
    {
        return Decision::Allow;
    }
    Decision::DenyDefault
}

/// Evaluate an optional policy; no policy at all is a default deny.
#[must_use]
pub fn evaluate_opt(policy: Option<&BucketPolicy>, request: &AccessRequest) -> Decision {
    match policy {
        Some(policy) => evaluate(policy, request),
        None => Decision::DenyDefault,
    }
}

fn statement_matches(
    statement: &Statement,
    request: &AccessRequest,
    action: &str,
    resource: &str,
) -> bool {
    if !statement.principal.covers(request.caller.as_deref()) {
        return false;
    }
    if !statement
        .actions
        .iter()
        .any(|pattern| glob::matches(pattern, action))
    {
        return false;
    }
    if !statement.resources.iter().any(|pattern| {
        let pattern = pattern.strip_prefix(ARN_PREFIX).unwrap_or(pattern);
        glob::matches(pattern, resource)
    }) {
        return false;
    }
    match &statement.conditions {
        Some(block) => conditions_match(block, request),
        None => true,
    }
}

/// ACL permission check, expressed in the same [`Decision`] terms.
///
/// `Allow` when some grant covering the caller implies `wanted`,
/// `DenyExplicit` otherwise. Ownership fallbacks stay with the caller.
#[must_use]
pub fn verify_access(
    acl: &AccessControlList,
    caller: Option<&str>,
    wanted: Permission,
) -> Decision {
    if acl.permits(caller, wanted) {
        Decision::Allow
    } else {
        Decision::DenyExplicit
    }
}
