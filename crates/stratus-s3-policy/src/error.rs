//! Policy document errors.

use thiserror::Error;

/// Error raised while parsing or validating a bucket policy document.
///
/// A failed PUT leaves any previously stored policy untouched; callers map
/// this error to the `MalformedPolicy` wire code.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The document is not valid JSON or does not fit the policy schema.
    #[error("malformed policy document: {0}")]
    Parse(#[from] serde_json::Error),

    /// The document parsed but violates a structural rule.
    #[error("invalid policy: {0}")]
    Invalid(String),
}

/// Convenience result type for policy parsing.
pub type PolicyResult<T> = Result<T, PolicyError>;
