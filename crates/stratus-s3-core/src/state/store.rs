//! Per-bucket object key storage.
//!
//! [`ObjectStore`] dispatches between a flat un-versioned map and a
//! versioned map whose keys carry newest-first version lists. Both are
//! `BTreeMap`-backed so listings iterate keys in sorted order, which the
//! marker-based pagination relies on.

use std::collections::{BTreeMap, HashSet};

use chrono::Utc;
use stratus_s3_model::types::Owner;
use tracing::debug;
use uuid::Uuid;

use super::object::{MarkerRecord, ObjectRecord, StoredVersion};

// ---------------------------------------------------------------------------
// List result types
// ---------------------------------------------------------------------------

/// Result of a `ListObjects` pass over the store.
#[derive(Debug, Clone)]
pub struct ListResult {
    /// Matching current objects, in key order.
    pub objects: Vec<ObjectRecord>,
    /// Rolled-up prefixes when a delimiter was supplied.
    pub common_prefixes: Vec<String>,
    /// Whether more keys remain past this page.
    pub is_truncated: bool,
    /// Marker for the next page (last key returned), set when truncated.
    pub next_marker: Option<String>,
}

/// Result of a `ListObjectVersions` pass over the store.
#[derive(Debug, Clone)]
pub struct VersionListResult {
    /// Versions and delete markers, newest first within each key.
    pub versions: Vec<VersionListEntry>,
    /// Rolled-up prefixes when a delimiter was supplied.
    pub common_prefixes: Vec<String>,
    /// Whether more entries remain past this page.
    pub is_truncated: bool,
    /// Key marker for the next page, set when truncated.
    pub next_key_marker: Option<String>,
    /// Version-id marker for the next page, set when truncated.
    pub next_version_id_marker: Option<String>,
}

/// One entry of a version listing, tagged with latest-ness.
#[derive(Debug, Clone)]
pub struct VersionListEntry {
    /// The version or delete marker.
    pub version: StoredVersion,
    /// Whether this is the newest entry for its key.
    pub is_latest: bool,
}

// ---------------------------------------------------------------------------
// ObjectStore
// ---------------------------------------------------------------------------

/// Key storage for one bucket, in either un-versioned or versioned mode.
///
/// A bucket starts un-versioned; enabling versioning transitions it exactly
/// once and the store never goes back (suspension keeps the versioned
/// layout).
#[derive(Debug)]
pub enum ObjectStore {
    /// Each key maps to exactly one record.
    Unversioned(BTreeMap<String, ObjectRecord>),
    /// Each key maps to a newest-first version list.
    Versioned(BTreeMap<String, Vec<StoredVersion>>),
}

impl Default for ObjectStore {
    fn default() -> Self {
        Self::Unversioned(BTreeMap::new())
    }
}

impl ObjectStore {
    /// Store a record under the version id it already carries.
    ///
    /// Un-versioned stores force `"null"` and replace. Versioned stores
    /// prepend the record to the key's list; a `"null"` record (written
    /// while versioning is suspended) replaces any existing `"null"` entry
    /// instead of accumulating. Returns the replaced record, if any.
    pub fn put(&mut self, mut record: ObjectRecord) -> Option<ObjectRecord> {
        match self {
            Self::Unversioned(map) => {
                record.version_id = "null".to_owned();
                map.insert(record.key.clone(), record)
            }
            Self::Versioned(map) => {
                debug!(key = %record.key, version_id = %record.version_id, "storing versioned object");
                let versions = map.entry(record.key.clone()).or_default();
                let replaced = if record.version_id == "null" {
                    versions
                        .iter()
                        .position(|entry| entry.version_id() == "null")
                        .and_then(|idx| match versions.remove(idx) {
                            StoredVersion::Object(existing) => Some(*existing),
                            StoredVersion::Marker(_) => None,
                        })
                } else {
                    None
                };
                versions.insert(0, StoredVersion::Object(Box::new(record)));
                replaced
            }
        }
    }

    /// The current record for a key. `None` when the key is absent or its
    /// latest version is a delete marker.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ObjectRecord> {
        match self {
            Self::Unversioned(map) => map.get(key),
            Self::Versioned(map) => map.get(key)?.first()?.as_record(),
        }
    }

    /// A specific version of a key. Delete markers yield `None` here; use
    /// [`version_entry`](Self::version_entry) to observe them.
    #[must_use]
    pub fn get_version(&self, key: &str, version_id: &str) -> Option<&ObjectRecord> {
        self.version_entry(key, version_id).and_then(StoredVersion::as_record)
    }

    /// Mutable access to a stored record, for ACL replacement.
    ///
    /// `version_id` of `None` targets the current version; delete markers
    /// yield `None`.
    pub fn record_mut(&mut self, key: &str, version_id: Option<&str>) -> Option<&mut ObjectRecord> {
        match self {
            Self::Unversioned(map) => match version_id {
                None | Some("null") => map.get_mut(key),
                Some(_) => None,
            },
            Self::Versioned(map) => {
                let versions = map.get_mut(key)?;
                let entry = match version_id {
                    None => versions.first_mut()?,
                    Some(wanted) => versions
                        .iter_mut()
                        .find(|entry| entry.version_id() == wanted)?,
                };
                match entry {
                    StoredVersion::Object(record) => Some(record),
                    StoredVersion::Marker(_) => None,
                }
            }
        }
    }

    /// The raw version entry for a key and version id, marker or not.
    ///
    /// Un-versioned stores answer only for version id `"null"`.
    #[must_use]
    pub fn version_entry(&self, key: &str, version_id: &str) -> Option<&StoredVersion> {
        match self {
            Self::Unversioned(_) => None,
            Self::Versioned(map) => map
                .get(key)?
                .iter()
                .find(|entry| entry.version_id() == version_id),
        }
    }

    /// Remove the record for a key (un-versioned semantics).
    pub fn delete(&mut self, key: &str) -> Option<ObjectRecord> {
        match self {
            Self::Unversioned(map) => map.remove(key),
            Self::Versioned(_) => None,
        }
    }

    /// Delete a key the way the bucket's mode requires.
    ///
    /// Un-versioned: removes the record, returns `(None, had_record)`.
    /// Versioned: inserts a delete marker at the front and returns
    /// `(Some(marker_version_id), had_record)`.
    pub fn delete_current(&mut self, key: &str, caller: &Owner) -> (Option<String>, bool) {
        match self {
            Self::Unversioned(map) => {
                let had = map.remove(key).is_some();
                (None, had)
            }
            Self::Versioned(map) => {
                let version_id = mint_version_id();
                let versions = map.entry(key.to_owned()).or_default();
                let had = versions.iter().any(|v| !v.is_marker());
                versions.insert(
                    0,
                    StoredVersion::Marker(MarkerRecord {
                        key: key.to_owned(),
                        version_id: version_id.clone(),
                        last_modified: Utc::now(),
                        owner: caller.clone(),
                    }),
                );
                debug!(key, version_id = %version_id, "inserted delete marker");
                (Some(version_id), had)
            }
        }
    }

    /// Permanently remove one version (record or marker) of a key.
    pub fn delete_version(&mut self, key: &str, version_id: &str) -> Option<StoredVersion> {
        match self {
            Self::Unversioned(map) => {
                if version_id == "null" {
                    map.remove(key)
                        .map(|record| StoredVersion::Object(Box::new(record)))
                } else {
                    None
                }
            }
            Self::Versioned(map) => {
                let versions = map.get_mut(key)?;
                let idx = versions
                    .iter()
                    .position(|entry| entry.version_id() == version_id)?;
                let removed = versions.remove(idx);
                if versions.is_empty() {
                    map.remove(key);
                }
                Some(removed)
            }
        }
    }

    /// Current objects matching the listing criteria.
    #[must_use]
    pub fn list_objects(
        &self,
        prefix: &str,
        delimiter: &str,
        marker: &str,
        max_keys: usize,
    ) -> ListResult {
        match self {
            Self::Unversioned(map) => {
                collect_listing(map.values(), prefix, delimiter, marker, max_keys)
            }
            Self::Versioned(map) => {
                let current = map
                    .values()
                    .filter_map(|versions| versions.first()?.as_record());
                collect_listing(current, prefix, delimiter, marker, max_keys)
            }
        }
    }

    /// Every version and delete marker matching the listing criteria.
    #[must_use]
    pub fn list_versions(
        &self,
        prefix: &str,
        delimiter: &str,
        key_marker: &str,
        version_id_marker: &str,
        max_keys: usize,
    ) -> VersionListResult {
        match self {
            Self::Unversioned(map) => {
                // Every record shows up as version "null", latest by definition.
                let page = collect_listing(map.values(), prefix, delimiter, key_marker, max_keys);
                VersionListResult {
                    versions: page
                        .objects
                        .into_iter()
                        .map(|record| VersionListEntry {
                            version: StoredVersion::Object(Box::new(record)),
                            is_latest: true,
                        })
                        .collect(),
                    common_prefixes: page.common_prefixes,
                    is_truncated: page.is_truncated,
                    next_key_marker: page.next_marker,
                    next_version_id_marker: None,
                }
            }
            Self::Versioned(map) => {
                collect_version_listing(map, prefix, delimiter, key_marker, version_id_marker, max_keys)
            }
        }
    }

    /// Count of keys whose current version is a live object.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Unversioned(map) => map.len(),
            Self::Versioned(map) => map
                .values()
                .filter(|versions| versions.first().is_some_and(|v| !v.is_marker()))
                .count(),
        }
    }

    /// Whether no key has a live current version.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether any version entries exist at all, delete markers included.
    #[must_use]
    pub fn has_any_versions(&self) -> bool {
        match self {
            Self::Unversioned(map) => !map.is_empty(),
            Self::Versioned(map) => !map.is_empty(),
        }
    }

    /// Switch to versioned mode, migrating existing records into
    /// single-element version lists. A no-op when already versioned.
    pub fn transition_to_versioned(&mut self) {
        if let Self::Unversioned(map) = self {
            debug!("transitioning object store to versioned mode");
            let mut versioned = BTreeMap::new();
            for (key, record) in std::mem::take(map) {
                versioned.insert(key, vec![StoredVersion::Object(Box::new(record))]);
            }
            *self = Self::Versioned(versioned);
        }
    }

    /// Whether the store is in versioned mode.
    #[must_use]
    pub fn is_versioned(&self) -> bool {
        matches!(self, Self::Versioned(_))
    }
}

// ---------------------------------------------------------------------------
// Listing helpers
// ---------------------------------------------------------------------------

/// Apply prefix, delimiter, marker, and max-keys over sorted records.
fn collect_listing<'a>(
    records: impl Iterator<Item = &'a ObjectRecord>,
    prefix: &str,
    delimiter: &str,
    marker: &str,
    max_keys: usize,
) -> ListResult {
    let use_delimiter = !delimiter.is_empty();
    let mut objects: Vec<ObjectRecord> = Vec::new();
    let mut common_prefixes: Vec<String> = Vec::new();
    let mut seen_prefixes = HashSet::new();
    let mut is_truncated = false;

    for record in records {
        // The marker is exclusive.
        if !marker.is_empty() && record.key.as_str() <= marker {
            continue;
        }
        if !prefix.is_empty() && !record.key.starts_with(prefix) {
            continue;
        }
        if use_delimiter {
            let rest = &record.key[prefix.len()..];
            if let Some(pos) = rest.find(delimiter) {
                let rolled = format!("{}{}{}", prefix, &rest[..pos], delimiter);
                if seen_prefixes.insert(rolled.clone()) {
                    common_prefixes.push(rolled);
                }
                continue;
            }
        }
        if objects.len() >= max_keys {
            is_truncated = true;
            break;
        }
        objects.push(record.clone());
    }

    let next_marker = if is_truncated {
        objects.last().map(|record| record.key.clone())
    } else {
        None
    };

    ListResult {
        objects,
        common_prefixes,
        is_truncated,
        next_marker,
    }
}

/// Version-listing pass over a versioned map.
fn collect_version_listing(
    map: &BTreeMap<String, Vec<StoredVersion>>,
    prefix: &str,
    delimiter: &str,
    key_marker: &str,
    version_id_marker: &str,
    max_keys: usize,
) -> VersionListResult {
    let use_delimiter = !delimiter.is_empty();
    let mut entries: Vec<VersionListEntry> = Vec::new();
    let mut common_prefixes: Vec<String> = Vec::new();
    let mut seen_prefixes = HashSet::new();
    let mut is_truncated = false;
    let mut last_key: Option<String> = None;
    let mut last_version_id: Option<String> = None;

    'keys: for (key, versions) in map {
        // Keys strictly before the marker are done; the marker key itself is
        // revisited only to resume mid-version-list.
        if !key_marker.is_empty() && key.as_str() < key_marker {
            continue;
        }
        if !prefix.is_empty() && !key.starts_with(prefix) {
            continue;
        }
        if use_delimiter {
            let rest = &key[prefix.len()..];
            if let Some(pos) = rest.find(delimiter) {
                let rolled = format!("{}{}{}", prefix, &rest[..pos], delimiter);
                if seen_prefixes.insert(rolled.clone()) {
                    common_prefixes.push(rolled);
                }
                continue;
            }
        }

        let mut skipping = key.as_str() == key_marker && !version_id_marker.is_empty();
        for (idx, version) in versions.iter().enumerate() {
            if skipping {
                if version.version_id() == version_id_marker {
                    skipping = false;
                }
                continue;
            }
            if entries.len() >= max_keys {
                is_truncated = true;
                break 'keys;
            }
            last_key = Some(key.clone());
            last_version_id = Some(version.version_id().to_owned());
            entries.push(VersionListEntry {
                version: version.clone(),
                is_latest: idx == 0,
            });
        }
    }

    VersionListResult {
        versions: entries,
        common_prefixes,
        is_truncated,
        next_key_marker: if is_truncated { last_key } else { None },
        next_version_id_marker: if is_truncated { last_version_id } else { None },
    }
}

/// A fresh object version id.
#[must_use]
pub fn mint_version_id() -> String {
    Uuid::new_v4().to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
