//! In-memory bucket and object state.
//!
//! All metadata lives here; object bytes live in the
//! [storage engine](crate::storage). The two are keyed consistently by
//! `(bucket, key, version_id)`.

pub mod bucket;
pub mod object;
pub mod store;

pub use bucket::BucketState;
pub use object::{MarkerRecord, ObjectHeaders, ObjectRecord, StoredVersion};
pub use store::{mint_version_id, ListResult, ObjectStore, VersionListEntry, VersionListResult};
