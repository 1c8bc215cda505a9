//! S3 XML wire format for Stratus.
//!
//! Converts between model types and the S3 2006-03-01 XML documents. S3 uses
//! flat error documents (no outer response wrapper), so errors are rendered
//! by [`error_to_xml`] rather than through [`S3Serialize`].
//!
//! # Conventions
//!
//! - Namespace: `http://s3.amazonaws.com/doc/2006-03-01/`
//! - Booleans: lowercase `true`/`false`
//! - Timestamps: ISO 8601 with milliseconds (`2006-02-03T16:45:09.000Z`)
//! - Request documents are matched by local element name, tolerating
//!   namespace prefixes

pub mod deserialize;
pub mod error;
pub mod serialize;

pub use deserialize::{S3Deserialize, from_xml};
pub use error::{XmlError, error_to_xml};
pub use serialize::{S3_NAMESPACE, S3Serialize, to_xml};
