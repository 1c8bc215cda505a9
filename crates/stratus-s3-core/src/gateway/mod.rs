//! The gateway: every S3 operation, implemented over the shared state.
//!
//! [`StratusGateway`] owns the bucket map, the standalone policy store, the
//! policy cache, the multipart tracker, and the storage engine. Operation
//! methods take the typed inputs from `stratus-s3-model` plus a
//! [`CallerContext`] and return typed outputs or a
//! [`ServiceError`](crate::error::ServiceError). The HTTP layer never
//! touches gateway state directly.

mod access;
mod bucket;
mod multipart;
mod object;
mod policy_acl;

use std::net::IpAddr;
use std::sync::Arc;

use dashmap::DashMap;
use stratus_s3_model::types::Owner;
use stratus_s3_policy::{BucketPolicy, CacheLookup, PolicyCache};
use tracing::trace;

use crate::config::GatewayConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::identity::{Identity, IdentityResolver};
use crate::multipart::UploadTracker;
use crate::state::BucketState;
use crate::storage::{MemoryEngine, StorageEngine};

pub(crate) use access::AclFallback;

// ---------------------------------------------------------------------------
// CallerContext
// ---------------------------------------------------------------------------

/// The per-request caller, as the HTTP layer resolved it.
#[derive(Debug, Clone)]
pub struct CallerContext {
    /// Resolved identity, anonymous when no credentials were presented.
    pub identity: Identity,
    /// Client source address, for policy IP conditions.
    pub source_ip: Option<IpAddr>,
}

impl CallerContext {
    /// A caller with the given identity and no source address.
    #[must_use]
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            source_ip: None,
        }
    }

    /// An anonymous caller, mostly for tests.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::new(Identity::anonymous())
    }

    /// Canonical id for ACL and policy checks.
    #[must_use]
    pub fn canonical_id(&self) -> Option<&str> {
        self.identity.canonical_id()
    }

    /// The caller as an [`Owner`], for records written on their behalf.
    ///
    /// Anonymous writers are recorded under the `anonymous` id so versioned
    /// delete markers always carry an owner.
    #[must_use]
    pub fn as_owner(&self) -> Owner {
        Owner::new(self.canonical_id().unwrap_or("anonymous"))
    }
}

// ---------------------------------------------------------------------------
// StratusGateway
// ---------------------------------------------------------------------------

/// A stored bucket policy: the raw document for GET plus the parsed form
/// for evaluation.
#[derive(Debug, Clone)]
pub(crate) struct StoredPolicy {
    pub(crate) raw: String,
    pub(crate) parsed: Arc<BucketPolicy>,
}

/// The S3 gateway itself.
///
/// Cheap to share: wrap in an [`Arc`] and clone the handle per connection.
pub struct StratusGateway {
    pub(crate) config: GatewayConfig,
    pub(crate) buckets: DashMap<String, Arc<BucketState>>,
    /// Policies live outside the bucket map so CreateBucket evaluation can
    /// consult them before any bucket record exists.
    pub(crate) policies: DashMap<String, StoredPolicy>,
    pub(crate) policy_cache: PolicyCache,
    pub(crate) tracker: UploadTracker,
    pub(crate) engine: Arc<dyn StorageEngine>,
    resolver: IdentityResolver,
}

impl std::fmt::Debug for StratusGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StratusGateway")
            .field("buckets", &self.buckets.len())
            .field("policies", &self.policies.len())
            .finish_non_exhaustive()
    }
}

impl StratusGateway {
    /// Build a gateway over the in-memory engine.
    #[must_use]
    pub fn new(config: GatewayConfig) -> Self {
        let engine = Arc::new(MemoryEngine::new(config.max_memory_object_size));
        Self::with_engine(config, engine)
    }

    /// Build a gateway over a supplied storage engine.
    #[must_use]
    pub fn with_engine(config: GatewayConfig, engine: Arc<dyn StorageEngine>) -> Self {
        let resolver = IdentityResolver::from_config(&config);
        Self {
            config,
            buckets: DashMap::new(),
            policies: DashMap::new(),
            policy_cache: PolicyCache::new(),
            tracker: UploadTracker::new(),
            engine,
            resolver,
        }
    }

    /// The gateway configuration.
    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Resolve a presented access key to an identity.
    #[must_use]
    pub fn resolve_identity(&self, access_key: Option<&str>) -> Identity {
        self.resolver.resolve(access_key)
    }

    /// Shared handle to the named bucket, or `NoSuchBucket`.
    pub(crate) fn bucket(&self, name: &str) -> ServiceResult<Arc<BucketState>> {
        self.buckets
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| ServiceError::NoSuchBucket {
                bucket: name.to_owned(),
            })
    }

    /// The parsed policy for a bucket, via the cache.
    ///
    /// A cache miss reads the policy store and records the answer either
    /// way, so "no policy" is itself cached.
    pub(crate) fn policy_for(&self, bucket: &str) -> Option<Arc<BucketPolicy>> {
        match self.policy_cache.get(bucket) {
            CacheLookup::Hit(policy) => policy,
            CacheLookup::Miss => {
                trace!(bucket, "policy cache miss");
                let policy = self
                    .policies
                    .get(bucket)
                    .map(|entry| Arc::clone(&entry.value().parsed));
                self.policy_cache.put(bucket, policy.clone());
                policy
            }
        }
    }
}

/// Validate a bucket name against the S3 naming rules the gateway enforces:
/// 3 to 63 characters, lowercase letters, digits, hyphens, and dots, and
/// starting and ending with a letter or digit.
pub(crate) fn validate_bucket_name(name: &str) -> ServiceResult<()> {
    let valid = name.len() >= 3
        && name.len() <= 63
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
        && name.starts_with(|c: char| c.is_ascii_alphanumeric())
        && name.ends_with(|c: char| c.is_ascii_alphanumeric())
        && !name.contains("..");
    if valid {
        Ok(())
    } else {
        Err(ServiceError::InvalidBucketName {
            bucket: name.to_owned(),
        })
    }
}
