//! Per-bucket state.
//!
//! A [`BucketState`] owns the object store plus the bucket-level
//! configuration the gateway serves: versioning status and the bucket ACL.
//! Interior mutability goes through `parking_lot::RwLock`; the gateway holds
//! buckets behind `Arc` in a `DashMap`, so state mutators take `&self`.
//! Multipart uploads live in the gateway-wide tracker, not here.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use stratus_s3_model::types::{AccessControlList, CannedAcl, Owner, VersioningStatus};
use tracing::debug;

use super::store::ObjectStore;

/// One bucket's metadata and object index.
pub struct BucketState {
    /// Bucket name.
    pub name: String,
    /// Region recorded at creation, served by GetBucketLocation.
    pub location: String,
    /// When the bucket was created.
    pub creation_date: DateTime<Utc>,
    /// The bucket owner.
    pub owner: Owner,
    /// Object key index (un-versioned or versioned).
    pub objects: RwLock<ObjectStore>,
    /// Versioning status.
    pub versioning: RwLock<VersioningStatus>,
    /// Bucket access control list.
    pub acl: RwLock<AccessControlList>,
}

impl std::fmt::Debug for BucketState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BucketState")
            .field("name", &self.name)
            .field("location", &self.location)
            .field("creation_date", &self.creation_date)
            .field("owner", &self.owner)
            .field("versioning", &*self.versioning.read())
            .finish_non_exhaustive()
    }
}

impl BucketState {
    /// Create a bucket with private ACL and versioning off.
    #[must_use]
    pub fn new(name: String, location: String, owner: Owner, canned_acl: CannedAcl) -> Self {
        let acl = AccessControlList::from_canned(canned_acl, &owner);
        Self {
            name,
            location,
            creation_date: Utc::now(),
            owner,
            objects: RwLock::new(ObjectStore::default()),
            versioning: RwLock::new(VersioningStatus::default()),
            acl: RwLock::new(acl),
        }
    }

    /// Whether the bucket has zero live objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    /// Whether versioning is currently on.
    #[must_use]
    pub fn is_versioning_enabled(&self) -> bool {
        self.versioning.read().is_enabled()
    }

    /// Turn versioning on, migrating the object store on the first enable.
    pub fn enable_versioning(&self) {
        let mut status = self.versioning.write();
        if !status.is_enabled() {
            debug!(bucket = %self.name, "enabling versioning");
            self.objects.write().transition_to_versioned();
            *status = VersioningStatus::Enabled;
        }
    }

    /// Suspend versioning. Existing version history is kept; the store stays
    /// in versioned mode. A bucket that was never versioned is unchanged.
    pub fn suspend_versioning(&self) {
        let mut status = self.versioning.write();
        if *status != VersioningStatus::Unversioned {
            debug!(bucket = %self.name, "suspending versioning");
            *status = VersioningStatus::Suspended;
        }
    }
}
