//! Process-wide bucket policy cache.

use std::sync::Arc;

use dashmap::DashMap;

use crate::document::BucketPolicy;

/// Outcome of a cache probe.
///
/// `Miss` means the bucket was never looked up. `Hit(None)` means a lookup
/// already concluded the bucket has no policy; callers use the distinction
/// to avoid re-querying the policy store for policy-less buckets.
#[derive(Debug, Clone)]
pub enum CacheLookup {
    /// No entry; the caller should consult the policy store and `put` the
    /// answer back, whatever it is.
    Miss,
    /// Cached answer, including the cached absence of a policy.
    Hit(Option<Arc<BucketPolicy>>),
}

/// Bucket name → parsed policy, shared across all requests.
///
/// Entries have no TTL. They are replaced atomically per key on policy PUT
/// and removed on policy DELETE and bucket deletion.
#[derive(Debug, Default)]
pub struct PolicyCache {
    entries: DashMap<String, Option<Arc<BucketPolicy>>>,
}

impl PolicyCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Probe the cache for `bucket`.
    #[must_use]
    pub fn get(&self, bucket: &str) -> CacheLookup {
        match self.entries.get(bucket) {
            Some(entry) => CacheLookup::Hit(entry.value().clone()),
            None => CacheLookup::Miss,
        }
    }

    /// Record the outcome of a policy lookup, replacing any prior entry.
    pub fn put(&self, bucket: impl Into<String>, policy: Option<Arc<BucketPolicy>>) {
        self.entries.insert(bucket.into(), policy);
    }

    /// Drop the entry for `bucket`, forcing the next `get` to miss.
    pub fn invalidate(&self, bucket: &str) {
        self.entries.remove(bucket);
    }
}
