//! Bucket lifecycle and configuration operations.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use stratus_s3_model::input::{
    CreateBucketInput, DeleteBucketInput, GetBucketLocationInput, GetBucketVersioningInput,
    HeadBucketInput, PutBucketVersioningInput,
};
use stratus_s3_model::operations::S3Operation;
use stratus_s3_model::output::{
    CreateBucketOutput, GetBucketLocationOutput, GetBucketVersioningOutput, ListBucketsOutput,
};
use stratus_s3_model::types::{BucketEntry, CannedAcl, Permission, VersioningStatus};
use tracing::info;

use super::{validate_bucket_name, AclFallback, CallerContext, StratusGateway};
use crate::error::{ServiceError, ServiceResult};
use crate::state::BucketState;

/// The region whose `<LocationConstraint>` renders empty, per AWS
/// convention.
const CLASSIC_REGION: &str = "us-east-1";

impl StratusGateway {
    /// `PUT /{bucket}`.
    pub fn create_bucket(
        &self,
        caller: &CallerContext,
        input: CreateBucketInput,
    ) -> ServiceResult<CreateBucketOutput> {
        validate_bucket_name(&input.bucket)?;
        // The policy store is standalone, so evaluation works even though
        // no bucket record exists yet.
        self.authorize(
            caller,
            &caller.access_request(S3Operation::CreateBucket, &input.bucket),
            AclFallback::Authenticated,
        )?;

        let location = input
            .location_constraint
            .filter(|constraint| !constraint.is_empty())
            .unwrap_or_else(|| self.config.region.clone());
        let acl = input.acl.unwrap_or(CannedAcl::Private);
        let state = Arc::new(BucketState::new(
            input.bucket.clone(),
            location,
            caller.as_owner(),
            acl,
        ));

        match self.buckets.entry(input.bucket.clone()) {
            Entry::Occupied(_) => Err(ServiceError::BucketNameConflict {
                bucket: input.bucket,
            }),
            Entry::Vacant(slot) => {
                slot.insert(state);
                info!(bucket = %input.bucket, acl = %acl, "created bucket");
                Ok(CreateBucketOutput {
                    location: format!("/{}", input.bucket),
                })
            }
        }
    }

    /// `GET /`.
    pub fn list_buckets(&self, caller: &CallerContext) -> ServiceResult<ListBucketsOutput> {
        let Some(caller_id) = caller.canonical_id() else {
            return Err(ServiceError::AccessDenied);
        };

        let mut buckets: Vec<BucketEntry> = self
            .buckets
            .iter()
            .filter(|entry| entry.value().owner.id == caller_id)
            .map(|entry| BucketEntry {
                name: entry.value().name.clone(),
                creation_date: entry.value().creation_date,
            })
            .collect();
        buckets.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(ListBucketsOutput {
            buckets,
            owner: caller.as_owner(),
        })
    }

    /// `HEAD /{bucket}`.
    pub fn head_bucket(&self, caller: &CallerContext, input: HeadBucketInput) -> ServiceResult<()> {
        let bucket = self.bucket(&input.bucket)?;
        let acl = bucket.acl.read().clone();
        self.authorize(
            caller,
            &caller.access_request(S3Operation::HeadBucket, &input.bucket),
            AclFallback::Acl(&acl, Permission::Read),
        )
    }

    /// `DELETE /{bucket}`.
    pub fn delete_bucket(
        &self,
        caller: &CallerContext,
        input: DeleteBucketInput,
    ) -> ServiceResult<()> {
        let bucket = self.bucket(&input.bucket)?;
        self.authorize(
            caller,
            &caller.access_request(S3Operation::DeleteBucket, &input.bucket),
            AclFallback::Owner(&bucket.owner),
        )?;

        // Delete markers count: a versioned bucket is only empty once every
        // version row is gone.
        if bucket.objects.read().has_any_versions()
            || self.tracker.has_uploads_for(&input.bucket)
        {
            return Err(ServiceError::BucketNotEmpty {
                bucket: input.bucket,
            });
        }

        self.buckets.remove(&input.bucket);
        self.engine.purge_bucket(&input.bucket);
        self.tracker.purge_bucket(&input.bucket);
        self.policies.remove(&input.bucket);
        self.policy_cache.invalidate(&input.bucket);
        info!(bucket = %input.bucket, "deleted bucket");
        Ok(())
    }

    /// `GET /{bucket}?location`.
    pub fn get_bucket_location(
        &self,
        caller: &CallerContext,
        input: GetBucketLocationInput,
    ) -> ServiceResult<GetBucketLocationOutput> {
        let bucket = self.bucket(&input.bucket)?;
        let acl = bucket.acl.read().clone();
        self.authorize(
            caller,
            &caller.access_request(S3Operation::GetBucketLocation, &input.bucket),
            AclFallback::Acl(&acl, Permission::Read),
        )?;

        let location_constraint = if bucket.location == CLASSIC_REGION {
            None
        } else {
            Some(bucket.location.clone())
        };
        Ok(GetBucketLocationOutput {
            location_constraint,
        })
    }

    /// `GET /{bucket}?versioning`. Owner only by default.
    pub fn get_bucket_versioning(
        &self,
        caller: &CallerContext,
        input: GetBucketVersioningInput,
    ) -> ServiceResult<GetBucketVersioningOutput> {
        let bucket = self.bucket(&input.bucket)?;
        self.authorize(
            caller,
            &caller.access_request(S3Operation::GetBucketVersioning, &input.bucket),
            AclFallback::Owner(&bucket.owner),
        )?;

        Ok(GetBucketVersioningOutput {
            status: *bucket.versioning.read(),
        })
    }

    /// `PUT /{bucket}?versioning`. Owner only by default.
    pub fn put_bucket_versioning(
        &self,
        caller: &CallerContext,
        input: PutBucketVersioningInput,
    ) -> ServiceResult<()> {
        let bucket = self.bucket(&input.bucket)?;
        self.authorize(
            caller,
            &caller.access_request(S3Operation::PutBucketVersioning, &input.bucket),
            AclFallback::Owner(&bucket.owner),
        )?;

        match input.status {
            Some(VersioningStatus::Enabled) => {
                bucket.enable_versioning();
                info!(bucket = %input.bucket, "versioning enabled");
                Ok(())
            }
            Some(VersioningStatus::Suspended) => {
                bucket.suspend_versioning();
                info!(bucket = %input.bucket, "versioning suspended");
                Ok(())
            }
            Some(VersioningStatus::Unversioned) | None => {
                Err(ServiceError::IllegalVersioningConfiguration)
            }
        }
    }
}
