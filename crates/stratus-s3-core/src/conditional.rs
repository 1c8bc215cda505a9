//! Conditional request evaluation.
//!
//! GetObject, HeadObject, and the copy-source side of CopyObject accept the
//! four standard preconditions. They are evaluated in a fixed order and the
//! first failure short-circuits: a failing modified-since answers 304, a
//! failing match, none-match, or unmodified-since answers 412.

use chrono::{DateTime, Utc};

use crate::checksums::normalize_etag;
use crate::error::{ServiceError, ServiceResult};

/// The four preconditions a read or copy may carry.
#[derive(Debug, Clone, Default)]
pub struct Preconditions {
    /// `If-Match` / `x-amz-copy-source-if-match`.
    pub if_match: Option<String>,
    /// `If-None-Match` / `x-amz-copy-source-if-none-match`.
    pub if_none_match: Option<String>,
    /// `If-Modified-Since` / `x-amz-copy-source-if-modified-since`.
    pub if_modified_since: Option<DateTime<Utc>>,
    /// `If-Unmodified-Since` / `x-amz-copy-source-if-unmodified-since`.
    pub if_unmodified_since: Option<DateTime<Utc>>,
}

impl Preconditions {
    /// Whether any precondition is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.if_match.is_none()
            && self.if_none_match.is_none()
            && self.if_modified_since.is_none()
            && self.if_unmodified_since.is_none()
    }

    /// Evaluate against the target's ETag and modification time.
    ///
    /// Checks run in order: match, none-match, unmodified-since,
    /// modified-since. HTTP dates have second granularity, so timestamps are
    /// compared truncated to whole seconds.
    pub fn check(&self, etag: &str, last_modified: DateTime<Utc>) -> ServiceResult<()> {
        let target = normalize_etag(etag);
        let modified_secs = last_modified.timestamp();

        if let Some(expected) = &self.if_match {
            if !etag_list_matches(expected, &target) {
                return Err(ServiceError::PreconditionFailed);
            }
        }
        if let Some(absent) = &self.if_none_match {
            if etag_list_matches(absent, &target) {
                return Err(ServiceError::PreconditionFailed);
            }
        }
        if let Some(threshold) = self.if_unmodified_since {
            if modified_secs > threshold.timestamp() {
                return Err(ServiceError::PreconditionFailed);
            }
        }
        if let Some(threshold) = self.if_modified_since {
            if modified_secs <= threshold.timestamp() {
                return Err(ServiceError::NotModified);
            }
        }
        Ok(())
    }
}

/// Match a comma-separated ETag list (or `*`) against the target's
/// normalized ETag.
fn etag_list_matches(header: &str, target: &str) -> bool {
    header
        .split(',')
        .map(str::trim)
        .any(|candidate| candidate == "*" || normalize_etag(candidate) == target)
}
