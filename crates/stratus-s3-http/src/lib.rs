//! HTTP transport for the Stratus S3 gateway.
//!
//! This crate turns raw HTTP traffic into typed S3 operations and back:
//!
//! - [`router`] resolves virtual-hosted and path-style addressing and maps
//!   each request to an [`S3Operation`](stratus_s3_model::S3Operation)
//!   through an explicit, ordered query-token dispatch table.
//! - [`request`] deserializes request parts into per-operation input structs.
//! - [`response`] renders output structs and errors into HTTP responses.
//! - [`form`] parses browser `multipart/form-data` uploads with a small
//!   state machine.
//! - [`dispatch`] defines the [`S3Handler`](dispatch::S3Handler) seam the
//!   gateway plugs into.
//! - [`service`] is the hyper `Service` tying the pieces together.
//!
//! The crate knows nothing about storage or access control; those live
//! behind the handler seam in `stratus-s3-core`.

// S3Error carries an optional boxed source and is returned pervasively;
// boxing every result would hurt more than the large variant does.
#![allow(clippy::result_large_err)]

pub mod body;
pub mod dispatch;
pub mod form;
pub mod request;
pub mod response;
pub mod router;
pub mod service;

pub use body::S3ResponseBody;
pub use dispatch::{S3Handler, dispatch_operation};
pub use request::FromS3Request;
pub use response::{HeadObjectResponse, IntoS3Response, empty_response, error_to_response};
pub use router::{RoutingContext, S3Router};
pub use service::{S3HttpConfig, S3HttpService, extract_access_key};
