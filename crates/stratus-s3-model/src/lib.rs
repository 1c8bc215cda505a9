//! Wire-level data model for the Stratus S3 gateway.
//!
//! This crate is pure vocabulary: error codes, operation identifiers, the
//! shared shapes that appear in S3 2006-03-01 documents, and one input and
//! output struct per operation. It knows nothing about HTTP transport, XML
//! encoding, or storage; those live in the `stratus-s3-http`,
//! `stratus-s3-xml`, and `stratus-s3-core` crates, all of which depend on
//! this one.

pub mod error;
pub mod input;
pub mod operations;
pub mod output;
pub mod types;

pub use error::{S3Error, S3ErrorCode, S3Result};
pub use operations::S3Operation;
