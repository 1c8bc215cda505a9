//! Domain logic for the Stratus S3 gateway.
//!
//! Everything that happens between the wire and the bytes lives here: the
//! gateway configuration, the identity resolver, bucket and object state,
//! the multipart upload tracker, the [`StorageEngine`](storage::StorageEngine)
//! seam with its in-memory reference engine, and the [`StratusGateway`]
//! operation implementations consumed by the HTTP layer.
//!
//! The crate is transport-free: operations take typed inputs from
//! `stratus-s3-model`, return typed outputs or a [`ServiceError`], and never
//! see an HTTP request.

pub mod checksums;
pub mod conditional;
pub mod config;
pub mod error;
pub mod gateway;
pub mod identity;
pub mod metadata;
pub mod multipart;
pub mod range;
pub mod state;
pub mod storage;

pub use config::GatewayConfig;
pub use error::{ServiceError, ServiceResult};
pub use gateway::{CallerContext, StratusGateway};
pub use identity::{Identity, IdentityResolver};
pub use storage::{MemoryEngine, StorageEngine, WriteResult};
