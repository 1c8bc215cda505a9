//! Response outputs, one struct per operation that returns data.
//!
//! Operations that answer with a bare status (DeleteBucket, DeleteObject
//! without versioning, AbortMultipartUpload) have no output struct.

pub mod bucket;
pub mod list;
pub mod multipart;
pub mod object;

pub use bucket::*;
pub use list::*;
pub use multipart::*;
pub use object::*;
