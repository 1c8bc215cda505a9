//! Multipart upload tracking.
//!
//! The [`UploadTracker`] is gateway-wide: upload ids come from one
//! process-wide counter and rows are keyed by id. Part bytes live in the
//! storage engine; the tracker records part metadata and guards the
//! completion handshake.
//!
//! # Sealing
//!
//! `CompleteMultipartUpload` and `AbortMultipartUpload` must not race
//! concurrent `UploadPart` calls. Each row carries an atomic phase flag;
//! sealing compare-and-sets `Active -> Sealing`, after which part writes are
//! refused. A completion that fails validation restores `Active` and leaves
//! the parts untouched.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use stratus_s3_model::types::{CannedAcl, CompletedPart, Owner};
use tracing::debug;

use crate::checksums::normalize_etag;
use crate::error::{ServiceError, ServiceResult};
use crate::state::object::ObjectHeaders;

/// Largest part number S3 accepts.
pub const MAX_PART_NUMBER: i32 = 10_000;

/// Default and maximum page size for part and upload listings.
pub const MAX_LISTING_SIZE: i32 = 1_000;

const PHASE_ACTIVE: u8 = 0;
const PHASE_SEALING: u8 = 1;

// ---------------------------------------------------------------------------
// PartRecord / UploadRow
// ---------------------------------------------------------------------------

/// Metadata for one uploaded part.
#[derive(Debug, Clone)]
pub struct PartRecord {
    /// Part number, 1 through 10000.
    pub part_number: i32,
    /// Quoted ETag of the part body.
    pub etag: String,
    /// Part size in bytes.
    pub size: u64,
    /// When the part was uploaded.
    pub last_modified: DateTime<Utc>,
}

/// One in-progress multipart upload.
pub struct UploadRow {
    /// Upload id.
    pub upload_id: String,
    /// Destination bucket.
    pub bucket: String,
    /// Destination key.
    pub key: String,
    /// When the upload was initiated.
    pub initiated: DateTime<Utc>,
    /// The caller who initiated the upload.
    pub initiator: Owner,
    /// Canned ACL to apply to the final object.
    pub acl: CannedAcl,
    /// Standard headers captured at initiation.
    pub headers: ObjectHeaders,
    /// User metadata captured at initiation, stored as received.
    pub metadata: BTreeMap<String, String>,
    /// Parts recorded so far, keyed by part number.
    parts: Mutex<BTreeMap<i32, PartRecord>>,
    /// `PHASE_ACTIVE` or `PHASE_SEALING`.
    phase: AtomicU8,
}

impl std::fmt::Debug for UploadRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadRow")
            .field("upload_id", &self.upload_id)
            .field("bucket", &self.bucket)
            .field("key", &self.key)
            .field("initiated", &self.initiated)
            .field("initiator", &self.initiator)
            .field("sealing", &(self.phase.load(Ordering::Acquire) == PHASE_SEALING))
            .finish_non_exhaustive()
    }
}

impl UploadRow {
    /// Whether the upload is currently sealing.
    #[must_use]
    pub fn is_sealing(&self) -> bool {
        self.phase.load(Ordering::Acquire) == PHASE_SEALING
    }

    /// Record a part, replacing any prior part with the same number.
    ///
    /// Refused while the upload is sealing.
    pub fn record_part(&self, part: PartRecord) -> ServiceResult<()> {
        let mut parts = self.parts.lock();
        // Checked under the parts lock; seal validation holds the same lock.
        if self.is_sealing() {
            return Err(ServiceError::SealingConflict {
                upload_id: self.upload_id.clone(),
            });
        }
        parts.insert(part.part_number, part);
        Ok(())
    }

    /// Parts in ascending part-number order, strictly after `marker`, capped
    /// at `max_parts`. Returns `(parts, is_truncated)`.
    #[must_use]
    pub fn list_parts(&self, marker: i32, max_parts: i32) -> (Vec<PartRecord>, bool) {
        let limit = clamp_listing_size(max_parts);
        let parts = self.parts.lock();
        let mut page: Vec<PartRecord> = Vec::new();
        let mut truncated = false;
        for part in parts.values().filter(|p| p.part_number > marker) {
            if page.len() >= limit {
                truncated = true;
                break;
            }
            page.push(part.clone());
        }
        (page, truncated)
    }

    /// Number of parts recorded so far.
    #[must_use]
    pub fn parts_count(&self) -> usize {
        self.parts.lock().len()
    }

    /// Move `Active -> Sealing`. Fails when another request is sealing.
    pub fn begin_seal(&self) -> ServiceResult<()> {
        self.phase
            .compare_exchange(
                PHASE_ACTIVE,
                PHASE_SEALING,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map_err(|_| ServiceError::SealingConflict {
                upload_id: self.upload_id.clone(),
            })?;
        Ok(())
    }

    /// Restore `Active` after a failed completion validation.
    pub fn cancel_seal(&self) {
        self.phase.store(PHASE_ACTIVE, Ordering::Release);
    }

    /// Validate a completion request against the recorded parts.
    ///
    /// The supplied list must name every recorded part exactly once, in
    /// strictly increasing part-number order, with ETags that match after
    /// quote stripping and case folding. Returns the ordered part numbers.
    pub fn validate_completion(&self, supplied: &[CompletedPart]) -> ServiceResult<Vec<i32>> {
        let parts = self.parts.lock();

        if supplied.is_empty() || supplied.len() != parts.len() {
            return Err(ServiceError::InvalidPart);
        }

        let mut previous: Option<i32> = None;
        let mut ordered = Vec::with_capacity(supplied.len());
        for completed in supplied {
            if previous.is_some_and(|p| completed.part_number <= p) {
                return Err(ServiceError::InvalidPartOrder);
            }
            previous = Some(completed.part_number);

            let stored = parts
                .get(&completed.part_number)
                .ok_or(ServiceError::InvalidPart)?;
            if normalize_etag(&completed.etag) != normalize_etag(&stored.etag) {
                return Err(ServiceError::InvalidPart);
            }
            ordered.push(completed.part_number);
        }
        Ok(ordered)
    }
}

// ---------------------------------------------------------------------------
// Listing types
// ---------------------------------------------------------------------------

/// Page of a `ListMultipartUploads` pass.
#[derive(Debug)]
pub struct UploadListing {
    /// Matching uploads, sorted by key then upload id.
    pub uploads: Vec<Arc<UploadRow>>,
    /// Rolled-up prefixes when a delimiter was supplied.
    pub common_prefixes: Vec<String>,
    /// Whether more uploads remain past this page.
    pub is_truncated: bool,
    /// Key marker for the next page.
    pub next_key_marker: Option<String>,
    /// Upload-id marker for the next page.
    pub next_upload_id_marker: Option<String>,
}

// ---------------------------------------------------------------------------
// UploadTracker
// ---------------------------------------------------------------------------

/// Gateway-wide multipart upload table.
pub struct UploadTracker {
    uploads: DashMap<String, Arc<UploadRow>>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for UploadTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadTracker")
            .field("uploads_count", &self.uploads.len())
            .finish_non_exhaustive()
    }
}

impl Default for UploadTracker {
    fn default() -> Self {
        Self {
            uploads: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }
}

impl UploadTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an upload and return its row.
    pub fn initiate(
        &self,
        bucket: &str,
        key: &str,
        initiator: Owner,
        acl: CannedAcl,
        headers: ObjectHeaders,
        metadata: BTreeMap<String, String>,
    ) -> Arc<UploadRow> {
        // Zero-padded so lexicographic order on ids matches issue order,
        // which the listing pagination markers rely on.
        let upload_id = format!("{:020}", self.next_id.fetch_add(1, Ordering::Relaxed));
        debug!(bucket, key, upload_id = %upload_id, "initiating multipart upload");
        let row = Arc::new(UploadRow {
            upload_id: upload_id.clone(),
            bucket: bucket.to_owned(),
            key: key.to_owned(),
            initiated: Utc::now(),
            initiator,
            acl,
            headers,
            metadata,
            parts: Mutex::new(BTreeMap::new()),
            phase: AtomicU8::new(PHASE_ACTIVE),
        });
        self.uploads.insert(upload_id, Arc::clone(&row));
        row
    }

    /// Look up an upload by id, checking it targets the given bucket and key.
    pub fn lookup(&self, bucket: &str, key: &str, upload_id: &str) -> ServiceResult<Arc<UploadRow>> {
        self.uploads
            .get(upload_id)
            .map(|entry| Arc::clone(entry.value()))
            .filter(|row| row.bucket == bucket && row.key == key)
            .ok_or_else(|| ServiceError::NoSuchUpload {
                upload_id: upload_id.to_owned(),
            })
    }

    /// Remove an upload row. Returns whether it existed.
    pub fn remove(&self, upload_id: &str) -> bool {
        self.uploads.remove(upload_id).is_some()
    }

    /// Whether any upload targets the bucket.
    #[must_use]
    pub fn has_uploads_for(&self, bucket: &str) -> bool {
        self.uploads.iter().any(|entry| entry.value().bucket == bucket)
    }

    /// Drop every upload row for a bucket.
    pub fn purge_bucket(&self, bucket: &str) {
        self.uploads.retain(|_, row| row.bucket != bucket);
    }

    /// Page through a bucket's uploads.
    ///
    /// `upload_id_marker` only applies when `key_marker` is supplied; an id
    /// marker alone is ignored. Keys with the delimiter after the prefix
    /// roll up into common prefixes instead of listing directly.
    #[must_use]
    pub fn list_uploads(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: &str,
        key_marker: &str,
        upload_id_marker: &str,
        max_uploads: i32,
    ) -> UploadListing {
        let limit = clamp_listing_size(max_uploads);
        let use_delimiter = !delimiter.is_empty();
        let upload_id_marker = if key_marker.is_empty() { "" } else { upload_id_marker };

        let mut rows: Vec<Arc<UploadRow>> = self
            .uploads
            .iter()
            .filter(|entry| entry.value().bucket == bucket)
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        rows.sort_by(|a, b| a.key.cmp(&b.key).then_with(|| a.upload_id.cmp(&b.upload_id)));

        let mut uploads: Vec<Arc<UploadRow>> = Vec::new();
        let mut common_prefixes: Vec<String> = Vec::new();
        let mut seen_prefixes = std::collections::HashSet::new();
        let mut is_truncated = false;

        for row in rows {
            if !key_marker.is_empty() {
                if row.key.as_str() < key_marker {
                    continue;
                }
                if row.key.as_str() == key_marker
                    && (upload_id_marker.is_empty() || row.upload_id.as_str() <= upload_id_marker)
                {
                    continue;
                }
            }
            if !prefix.is_empty() && !row.key.starts_with(prefix) {
                continue;
            }
            if use_delimiter {
                let rest = &row.key[prefix.len()..];
                if let Some(pos) = rest.find(delimiter) {
                    let rolled = format!("{}{}{}", prefix, &rest[..pos], delimiter);
                    if seen_prefixes.insert(rolled.clone()) {
                        common_prefixes.push(rolled);
                    }
                    continue;
                }
            }
            if uploads.len() >= limit {
                is_truncated = true;
                break;
            }
            uploads.push(row);
        }

        let (next_key_marker, next_upload_id_marker) = if is_truncated {
            match uploads.last() {
                Some(last) => (Some(last.key.clone()), Some(last.upload_id.clone())),
                None => (None, None),
            }
        } else {
            (None, None)
        };

        UploadListing {
            uploads,
            common_prefixes,
            is_truncated,
            next_key_marker,
            next_upload_id_marker,
        }
    }
}

/// Clamp a client-supplied listing size into `1..=1000`, defaulting to 1000
/// for non-positive values.
#[must_use]
pub fn clamp_listing_size(requested: i32) -> usize {
    if requested <= 0 {
        MAX_LISTING_SIZE as usize
    } else {
        requested.min(MAX_LISTING_SIZE) as usize
    }
}

/// Reject part numbers outside `1..=10000`.
pub fn validate_part_number(part_number: i32) -> ServiceResult<()> {
    if (1..=MAX_PART_NUMBER).contains(&part_number) {
        Ok(())
    } else {
        Err(ServiceError::InvalidPartNumber { part_number })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
