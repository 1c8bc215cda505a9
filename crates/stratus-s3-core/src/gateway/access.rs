//! Per-operation authorization.
//!
//! Every operation builds an [`AccessRequest`], lets the policy evaluator
//! speak first, and names the fallback that applies when no policy
//! statement matched. The fallback choice decides the failure status:
//! owner-restricted operations answer 405, ACL-guarded ones 403.

use stratus_s3_model::types::{AccessControlList, Owner, Permission};
use stratus_s3_policy::{evaluate_opt, verify_access, AccessRequest, Decision};
use tracing::debug;

use super::{CallerContext, StratusGateway};
use crate::error::{ServiceError, ServiceResult};

/// What decides access when the policy engine returns `DenyDefault`.
#[derive(Debug)]
pub(crate) enum AclFallback<'a> {
    /// Only the resource owner may proceed; failure is 405.
    Owner(&'a Owner),
    /// The ACL must grant the permission; failure is 403.
    Acl(&'a AccessControlList, Permission),
    /// Any authenticated caller may proceed; failure is 403.
    Authenticated,
}

impl CallerContext {
    /// An [`AccessRequest`] for this caller against a bucket.
    ///
    /// Listing parameters and the object key are filled in by the operation
    /// when the policy conditions can see them.
    pub(crate) fn access_request(
        &self,
        action: stratus_s3_model::operations::S3Operation,
        bucket: &str,
    ) -> AccessRequest {
        AccessRequest {
            caller: self.canonical_id().map(str::to_owned),
            source_ip: self.source_ip,
            ..AccessRequest::new(action, bucket)
        }
    }
}

impl StratusGateway {
    /// Authorize one operation for one caller.
    ///
    /// An explicit policy ALLOW or DENY is authoritative. Without one, the
    /// fallback applies.
    pub(crate) fn authorize(
        &self,
        caller: &CallerContext,
        request: &AccessRequest,
        fallback: AclFallback<'_>,
    ) -> ServiceResult<()> {
        let policy = self.policy_for(&request.bucket);
        match evaluate_opt(policy.as_deref(), request) {
            Decision::Allow => Ok(()),
            Decision::DenyExplicit => {
                debug!(
                    action = %request.action,
                    bucket = %request.bucket,
                    caller = caller.canonical_id().unwrap_or("anonymous"),
                    "policy denied request"
                );
                Err(ServiceError::AccessDenied)
            }
            Decision::DenyDefault => match fallback {
                AclFallback::Owner(owner) => {
                    if caller.identity.owns(&owner.id) {
                        Ok(())
                    } else {
                        Err(ServiceError::MethodNotAllowed)
                    }
                }
                AclFallback::Acl(acl, wanted) => {
                    match verify_access(acl, caller.canonical_id(), wanted) {
                        Decision::Allow => Ok(()),
                        Decision::DenyExplicit | Decision::DenyDefault => {
                            debug!(
                                action = %request.action,
                                bucket = %request.bucket,
                                permission = %wanted,
                                "acl denied request"
                            );
                            Err(ServiceError::AccessDenied)
                        }
                    }
                }
                AclFallback::Authenticated => {
                    if caller.identity.is_anonymous() {
                        Err(ServiceError::AccessDenied)
                    } else {
                        Ok(())
                    }
                }
            },
        }
    }
}
