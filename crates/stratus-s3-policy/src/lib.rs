//! Bucket policy machinery for the Stratus S3 gateway.
//!
//! Covers the full policy lifecycle: parsing and validating JSON documents
//! on PUT ([`document`]), caching parsed policies per bucket with an
//! explicit present/absent/never-looked-up distinction ([`cache`]), and
//! turning a request into an [`evaluate::Decision`] ([`evaluate`]).
//!
//! # Conventions
//!
//! - Decisions are returned, never raised; the HTTP layer maps
//!   `DenyExplicit` to 403 and `DenyDefault` to 405 on owner-restricted
//!   operations.
//! - Deny statements always win over Allow statements.
//! - Unknown condition operators or keys make a statement non-matching;
//!   they are not evaluation errors.

pub mod cache;
mod condition;
pub mod document;
pub mod error;
pub mod evaluate;
pub mod glob;

pub use cache::{CacheLookup, PolicyCache};
pub use document::BucketPolicy;
pub use error::{PolicyError, PolicyResult};
pub use evaluate::{AccessRequest, Decision, evaluate, evaluate_opt, verify_access};
