//! Object metadata records.
//!
//! An [`ObjectRecord`] is everything known about one stored version of a
//! key except its bytes. In versioned buckets a key maps to a list of
//! [`StoredVersion`]s, each of which is a record or a delete marker.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use stratus_s3_model::types::{AccessControlList, Owner};

// ---------------------------------------------------------------------------
// ObjectHeaders
// ---------------------------------------------------------------------------

/// Standard HTTP headers captured at write time and echoed on reads.
#[derive(Debug, Clone, Default)]
pub struct ObjectHeaders {
    /// `Content-Type`.
    pub content_type: Option<String>,
    /// `Cache-Control`.
    pub cache_control: Option<String>,
    /// `Content-Disposition`.
    pub content_disposition: Option<String>,
    /// `Content-Encoding`.
    pub content_encoding: Option<String>,
    /// `Expires`, stored verbatim.
    pub expires: Option<String>,
}

// ---------------------------------------------------------------------------
// ObjectRecord
// ---------------------------------------------------------------------------

/// One stored version of an object (never a delete marker).
#[derive(Debug, Clone)]
pub struct ObjectRecord {
    /// Object key.
    pub key: String,
    /// Version id, `"null"` in un-versioned buckets.
    pub version_id: String,
    /// Quoted ETag. Composite (`"<md5>-<n>"`) for multipart objects.
    pub etag: String,
    /// Size in bytes.
    pub size: u64,
    /// Time this version was written.
    pub last_modified: DateTime<Utc>,
    /// Standard headers echoed on reads.
    pub headers: ObjectHeaders,
    /// User metadata, stored exactly as received. Invalid names are
    /// filtered out on read, not on write.
    pub metadata: BTreeMap<String, String>,
    /// Per-object access control list.
    pub acl: AccessControlList,
    /// Object owner.
    pub owner: Owner,
}

// ---------------------------------------------------------------------------
// MarkerRecord
// ---------------------------------------------------------------------------

/// A delete marker in a versioned bucket.
#[derive(Debug, Clone)]
pub struct MarkerRecord {
    /// Object key.
    pub key: String,
    /// Version id of the marker itself.
    pub version_id: String,
    /// Time the marker was inserted.
    pub last_modified: DateTime<Utc>,
    /// The caller who deleted the object.
    pub owner: Owner,
}

// ---------------------------------------------------------------------------
// StoredVersion
// ---------------------------------------------------------------------------

/// A single entry in a key's version list.
#[derive(Debug, Clone)]
pub enum StoredVersion {
    /// A real object version (boxed to keep the enum small).
    Object(Box<ObjectRecord>),
    /// A delete marker.
    Marker(MarkerRecord),
}

impl StoredVersion {
    /// The object key.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Object(record) => &record.key,
            Self::Marker(marker) => &marker.key,
        }
    }

    /// The version id.
    #[must_use]
    pub fn version_id(&self) -> &str {
        match self {
            Self::Object(record) => &record.version_id,
            Self::Marker(marker) => &marker.version_id,
        }
    }

    /// When this version was written.
    #[must_use]
    pub fn last_modified(&self) -> DateTime<Utc> {
        match self {
            Self::Object(record) => record.last_modified,
            Self::Marker(marker) => marker.last_modified,
        }
    }

    /// The version owner.
    #[must_use]
    pub fn owner(&self) -> &Owner {
        match self {
            Self::Object(record) => &record.owner,
            Self::Marker(marker) => &marker.owner,
        }
    }

    /// Whether this entry is a delete marker.
    #[must_use]
    pub fn is_marker(&self) -> bool {
        matches!(self, Self::Marker(_))
    }

    /// The inner record, when this is an object version.
    #[must_use]
    pub fn as_record(&self) -> Option<&ObjectRecord> {
        match self {
            Self::Object(record) => Some(record),
            Self::Marker(_) => None,
        }
    }
}
