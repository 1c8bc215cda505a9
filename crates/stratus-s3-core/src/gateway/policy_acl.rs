//! Bucket policy and ACL operations.
//!
//! Policy PUT parses before persisting, so a malformed document never
//! clobbers the stored one. Every policy mutation replaces the cache entry
//! for the bucket atomically.

use std::sync::Arc;

use stratus_s3_model::input::{
    DeleteBucketPolicyInput, GetBucketAclInput, GetBucketPolicyInput, GetObjectAclInput,
    PutBucketAclInput, PutBucketPolicyInput, PutObjectAclInput,
};
use stratus_s3_model::operations::S3Operation;
use stratus_s3_model::output::GetBucketPolicyOutput;
use stratus_s3_model::types::{AccessControlList, AccessControlPolicy, Owner, Permission};
use stratus_s3_policy::BucketPolicy;
use tracing::info;

use super::object::resolve_record;
use super::{AclFallback, CallerContext, StoredPolicy, StratusGateway};
use crate::error::{ServiceError, ServiceResult};

impl StratusGateway {
    /// `PUT /{bucket}?policy`.
    ///
    /// An empty document is treated as deletion, mirroring how clients
    /// clear a policy with an empty PUT.
    pub fn put_bucket_policy(
        &self,
        caller: &CallerContext,
        input: PutBucketPolicyInput,
    ) -> ServiceResult<()> {
        let bucket = self.bucket(&input.bucket)?;
        self.authorize(
            caller,
            &caller.access_request(S3Operation::PutBucketPolicy, &input.bucket),
            AclFallback::Owner(&bucket.owner),
        )?;

        if input.policy.trim().is_empty() {
            return self.remove_policy(&input.bucket);
        }

        let parsed = BucketPolicy::from_json(&input.policy)
            .map_err(|e| ServiceError::malformed_policy(e.to_string()))?;
        parsed
            .validate()
            .map_err(|e| ServiceError::malformed_policy(e.to_string()))?;

        let parsed = Arc::new(parsed);
        self.policies.insert(
            input.bucket.clone(),
            StoredPolicy {
                raw: input.policy,
                parsed: Arc::clone(&parsed),
            },
        );
        self.policy_cache.put(input.bucket.clone(), Some(parsed));
        info!(bucket = %input.bucket, "bucket policy attached");
        Ok(())
    }

    /// `GET /{bucket}?policy`.
    pub fn get_bucket_policy(
        &self,
        caller: &CallerContext,
        input: GetBucketPolicyInput,
    ) -> ServiceResult<GetBucketPolicyOutput> {
        let bucket = self.bucket(&input.bucket)?;
        self.authorize(
            caller,
            &caller.access_request(S3Operation::GetBucketPolicy, &input.bucket),
            AclFallback::Owner(&bucket.owner),
        )?;

        let raw = self
            .policies
            .get(&input.bucket)
            .map(|entry| entry.value().raw.clone())
            .ok_or_else(|| ServiceError::NoSuchBucketPolicy {
                bucket: input.bucket,
            })?;
        Ok(GetBucketPolicyOutput { policy: raw })
    }

    /// `DELETE /{bucket}?policy`. Succeeds whether or not a policy existed.
    pub fn delete_bucket_policy(
        &self,
        caller: &CallerContext,
        input: DeleteBucketPolicyInput,
    ) -> ServiceResult<()> {
        let bucket = self.bucket(&input.bucket)?;
        self.authorize(
            caller,
            &caller.access_request(S3Operation::DeleteBucketPolicy, &input.bucket),
            AclFallback::Owner(&bucket.owner),
        )?;
        self.remove_policy(&input.bucket)
    }

    fn remove_policy(&self, bucket: &str) -> ServiceResult<()> {
        self.policies.remove(bucket);
        self.policy_cache.put(bucket.to_owned(), None);
        info!(bucket, "bucket policy removed");
        Ok(())
    }

    /// `GET /{bucket}?acl`.
    pub fn get_bucket_acl(
        &self,
        caller: &CallerContext,
        input: GetBucketAclInput,
    ) -> ServiceResult<AccessControlPolicy> {
        let bucket = self.bucket(&input.bucket)?;
        let acl = bucket.acl.read().clone();
        self.authorize(
            caller,
            &caller.access_request(S3Operation::GetBucketAcl, &input.bucket),
            AclFallback::Acl(&acl, Permission::ReadAcp),
        )?;

        Ok(AccessControlPolicy {
            owner: bucket.owner.clone(),
            acl,
        })
    }

    /// `PUT /{bucket}?acl`. The canned header wins over an XML body.
    pub fn put_bucket_acl(
        &self,
        caller: &CallerContext,
        input: PutBucketAclInput,
    ) -> ServiceResult<()> {
        let bucket = self.bucket(&input.bucket)?;
        let current = bucket.acl.read().clone();
        self.authorize(
            caller,
            &caller.access_request(S3Operation::PutBucketAcl, &input.bucket),
            AclFallback::Acl(&current, Permission::WriteAcp),
        )?;

        let replacement =
            resolve_acl_request(input.acl, input.access_control_policy, &bucket.owner)?;
        *bucket.acl.write() = replacement;
        Ok(())
    }

    /// `GET /{bucket}/{key}?acl`.
    pub fn get_object_acl(
        &self,
        caller: &CallerContext,
        input: GetObjectAclInput,
    ) -> ServiceResult<AccessControlPolicy> {
        let bucket = self.bucket(&input.bucket)?;
        let record = {
            let store = bucket.objects.read();
            resolve_record(&store, &input.key, input.version_id.as_deref())?
        };
        let request = stratus_s3_policy::AccessRequest {
            key: Some(input.key.clone()),
            ..caller.access_request(S3Operation::GetObjectAcl, &input.bucket)
        };
        self.authorize(
            caller,
            &request,
            AclFallback::Acl(&record.acl, Permission::ReadAcp),
        )?;

        Ok(AccessControlPolicy {
            owner: record.owner,
            acl: record.acl,
        })
    }

    /// `PUT /{bucket}/{key}?acl`.
    pub fn put_object_acl(
        &self,
        caller: &CallerContext,
        input: PutObjectAclInput,
    ) -> ServiceResult<()> {
        let bucket = self.bucket(&input.bucket)?;
        let record = {
            let store = bucket.objects.read();
            resolve_record(&store, &input.key, input.version_id.as_deref())?
        };
        let request = stratus_s3_policy::AccessRequest {
            key: Some(input.key.clone()),
            ..caller.access_request(S3Operation::PutObjectAcl, &input.bucket)
        };
        self.authorize(
            caller,
            &request,
            AclFallback::Acl(&record.acl, Permission::WriteAcp),
        )?;

        let replacement =
            resolve_acl_request(input.acl, input.access_control_policy, &record.owner)?;
        let mut store = bucket.objects.write();
        if let Some(stored) = store.record_mut(&input.key, input.version_id.as_deref()) {
            stored.acl = replacement;
        }
        Ok(())
    }
}

/// Pick the replacement ACL from the canned header or the XML body.
fn resolve_acl_request(
    canned: Option<stratus_s3_model::types::CannedAcl>,
    body: Option<AccessControlPolicy>,
    owner: &Owner,
) -> ServiceResult<AccessControlList> {
    if let Some(canned) = canned {
        return Ok(AccessControlList::from_canned(canned, owner));
    }
    if let Some(policy) = body {
        if policy.acl.grants.is_empty() {
            return Err(ServiceError::MalformedAcl {
                message: "access control policy carries no grants".to_owned(),
            });
        }
        return Ok(policy.acl);
    }
    Err(ServiceError::MalformedAcl {
        message: "request carries neither a canned acl nor an access control policy".to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::testutil::{alice, bob, gateway};
    use stratus_s3_model::input::CreateBucketInput;
    use stratus_s3_model::types::{CannedAcl, Grant, Grantee};

    const POLICY: &str = r#"{
        "Statement": [{
            "Effect": "Allow",
            "Principal": "*",
            "Action": "s3:GetBucketPolicy",
            "Resource": "arn:aws:s3:::photos"
        }]
    }"#;

    fn setup() -> StratusGateway {
        let gw = gateway();
        gw.create_bucket(
            &alice(),
            CreateBucketInput {
                acl: None,
                bucket: "photos".into(),
                location_constraint: None,
            },
        )
        .unwrap();
        gw
    }

    #[test]
    fn test_should_round_trip_bucket_policy() {
        let gw = setup();
        gw.put_bucket_policy(
            &alice(),
            PutBucketPolicyInput {
                bucket: "photos".into(),
                policy: POLICY.to_owned(),
            },
        )
        .unwrap();

        let out = gw
            .get_bucket_policy(
                &alice(),
                GetBucketPolicyInput {
                    bucket: "photos".into(),
                },
            )
            .unwrap();
        assert_eq!(out.policy, POLICY);
    }

    #[test]
    fn test_should_keep_prior_policy_on_malformed_put() {
        let gw = setup();
        gw.put_bucket_policy(
            &alice(),
            PutBucketPolicyInput {
                bucket: "photos".into(),
                policy: POLICY.to_owned(),
            },
        )
        .unwrap();

        let err = gw
            .put_bucket_policy(
                &alice(),
                PutBucketPolicyInput {
                    bucket: "photos".into(),
                    policy: "{not json".to_owned(),
                },
            )
            .unwrap_err();
        assert!(matches!(err, ServiceError::MalformedPolicy { .. }));

        let out = gw
            .get_bucket_policy(
                &alice(),
                GetBucketPolicyInput {
                    bucket: "photos".into(),
                },
            )
            .unwrap();
        assert_eq!(out.policy, POLICY);
    }

    #[test]
    fn test_should_treat_empty_policy_put_as_deletion() {
        let gw = setup();
        gw.put_bucket_policy(
            &alice(),
            PutBucketPolicyInput {
                bucket: "photos".into(),
                policy: POLICY.to_owned(),
            },
        )
        .unwrap();
        gw.put_bucket_policy(
            &alice(),
            PutBucketPolicyInput {
                bucket: "photos".into(),
                policy: "  ".to_owned(),
            },
        )
        .unwrap();

        let err = gw
            .get_bucket_policy(
                &alice(),
                GetBucketPolicyInput {
                    bucket: "photos".into(),
                },
            )
            .unwrap_err();
        assert!(matches!(err, ServiceError::NoSuchBucketPolicy { .. }));
    }

    #[test]
    fn test_should_broaden_policy_access_via_statement() {
        let gw = setup();
        // Without a policy, bob cannot read it.
        let err = gw
            .get_bucket_policy(
                &bob(),
                GetBucketPolicyInput {
                    bucket: "photos".into(),
                },
            )
            .unwrap_err();
        assert!(matches!(err, ServiceError::MethodNotAllowed));

        gw.put_bucket_policy(
            &alice(),
            PutBucketPolicyInput {
                bucket: "photos".into(),
                policy: POLICY.to_owned(),
            },
        )
        .unwrap();
        // The attached policy allows anyone to read it.
        assert!(gw
            .get_bucket_policy(
                &bob(),
                GetBucketPolicyInput {
                    bucket: "photos".into(),
                },
            )
            .is_ok());
    }

    #[test]
    fn test_should_delete_policy_idempotently() {
        let gw = setup();
        assert!(gw
            .delete_bucket_policy(
                &alice(),
                DeleteBucketPolicyInput {
                    bucket: "photos".into(),
                },
            )
            .is_ok());
        assert!(gw
            .delete_bucket_policy(
                &alice(),
                DeleteBucketPolicyInput {
                    bucket: "photos".into(),
                },
            )
            .is_ok());
    }

    #[test]
    fn test_should_replace_bucket_acl_with_canned_value() {
        let gw = setup();
        // Private bucket: bob cannot read the ACL.
        assert!(gw
            .get_bucket_acl(
                &bob(),
                GetBucketAclInput {
                    bucket: "photos".into(),
                },
            )
            .is_err());

        gw.put_bucket_acl(
            &alice(),
            PutBucketAclInput {
                acl: Some(CannedAcl::PublicRead),
                access_control_policy: None,
                bucket: "photos".into(),
            },
        )
        .unwrap();

        let doc = gw
            .get_bucket_acl(
                &alice(),
                GetBucketAclInput {
                    bucket: "photos".into(),
                },
            )
            .unwrap();
        assert_eq!(doc.owner.id, "alice");
        assert!(doc.acl.permits(None, Permission::Read));
    }

    #[test]
    fn test_should_replace_bucket_acl_from_document_body() {
        let gw = setup();
        let body = AccessControlPolicy {
            owner: Owner::new("alice"),
            acl: AccessControlList {
                grants: vec![Grant {
                    grantee: Grantee::user("bob"),
                    permission: Permission::FullControl,
                }],
            },
        };
        gw.put_bucket_acl(
            &alice(),
            PutBucketAclInput {
                acl: None,
                access_control_policy: Some(body),
                bucket: "photos".into(),
            },
        )
        .unwrap();

        let doc = gw
            .get_bucket_acl(
                &bob(),
                GetBucketAclInput {
                    bucket: "photos".into(),
                },
            )
            .unwrap();
        assert!(doc.acl.permits(Some("bob"), Permission::WriteAcp));
    }

    #[test]
    fn test_should_reject_acl_put_without_grants() {
        let gw = setup();
        let err = gw
            .put_bucket_acl(
                &alice(),
                PutBucketAclInput {
                    acl: None,
                    access_control_policy: None,
                    bucket: "photos".into(),
                },
            )
            .unwrap_err();
        assert!(matches!(err, ServiceError::MalformedAcl { .. }));
    }
}
