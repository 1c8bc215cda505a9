//! Request inputs, one struct per operation.
//!
//! Field docs record where each value comes from on the wire: a URI label,
//! a query parameter, a header, or the payload body.

pub mod bucket;
pub mod list;
pub mod multipart;
pub mod object;

pub use bucket::*;
pub use list::*;
pub use multipart::*;
pub use object::*;
