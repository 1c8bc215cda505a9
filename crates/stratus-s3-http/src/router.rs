//! Request routing: addressing resolution and operation identification.
//!
//! The [`S3Router`] maps an incoming HTTP request to an S3 operation from:
//!
//! - the HTTP method,
//! - whether a bucket and key are present (virtual-hosted `Host` header or
//!   path segments),
//! - the query-string sub-resource tokens (`?acl`, `?versioning`,
//!   `?uploadId=...`),
//! - the `x-amz-copy-source` header, which turns an object PUT into a copy.
//!
//! Sub-resource dispatch is an explicit ordered token list per (method,
//! scope) pair; the first matching token wins, so combined query strings
//! like `?acl&versioning` resolve deterministically. The `versions` token is
//! special-cased as a substring match over the raw query string, matching
//! long-standing client behavior.

use std::net::IpAddr;

use http::Method;
use percent_encoding::percent_decode_str;
use stratus_s3_model::S3Operation;
use stratus_s3_model::error::{S3Error, S3ErrorCode};

/// Addressing configuration for the router.
#[derive(Debug, Clone)]
pub struct S3Router {
    /// Base domain for virtual-hosted-style requests (e.g. `s3.localhost`).
    pub domain: String,
    /// Whether virtual-hosted-style bucket addressing is enabled.
    pub virtual_hosting: bool,
}

/// The result of routing an HTTP request.
#[derive(Debug, Clone)]
pub struct RoutingContext {
    /// Resolved bucket name, if any.
    pub bucket: Option<String>,
    /// Resolved object key, if any.
    pub key: Option<String>,
    /// The identified operation.
    pub operation: S3Operation,
    /// Decoded query parameters, in request order.
    pub query_params: Vec<(String, String)>,
    /// Peer address of the connection, filled in by the service layer.
    pub source_ip: Option<IpAddr>,
}

impl S3Router {
    /// Create a router for the given domain.
    #[must_use]
    pub fn new(domain: impl Into<String>, virtual_hosting: bool) -> Self {
        Self {
            domain: domain.into(),
            virtual_hosting,
        }
    }

    /// Resolve a request to a [`RoutingContext`].
    ///
    /// # Errors
    ///
    /// Returns an `S3Error` when the request cannot name a valid operation
    /// (unsupported method, key without bucket).
    pub fn resolve<B>(&self, req: &http::Request<B>) -> Result<RoutingContext, S3Error> {
        let method = req.method();
        let uri = req.uri();
        let headers = req.headers();

        let raw_query = uri.query().unwrap_or("");
        let query_params = parse_query_params(raw_query);

        let virtual_bucket = if self.virtual_hosting {
            extract_virtual_host_bucket(headers, &self.domain)
        } else {
            None
        };

        let path = uri.path();
        let (bucket, key) = if let Some(vhost_bucket) = virtual_bucket {
            // Virtual hosting: the whole path is the key.
            let raw_key = path.strip_prefix('/').unwrap_or(path);
            let key = if raw_key.is_empty() {
                None
            } else {
                Some(decode_uri_component(raw_key))
            };
            (Some(vhost_bucket), key)
        } else {
            parse_path(path)
        };

        let operation = identify_operation(
            method,
            bucket.is_some(),
            key.is_some(),
            raw_query,
            &query_params,
            headers,
        )?;

        Ok(RoutingContext {
            bucket,
            key,
            operation,
            query_params,
            source_ip: None,
        })
    }
}

/// Extract the bucket name from a virtual-hosted-style Host header.
///
/// With domain `s3.localhost`, a Host of `media.s3.localhost:4583` yields
/// `Some("media")`.
fn extract_virtual_host_bucket(headers: &http::HeaderMap, domain: &str) -> Option<String> {
    let host = headers
        .get(http::header::HOST)
        .and_then(|v| v.to_str().ok())?;
    let host = host.split(':').next().unwrap_or(host);

    let suffix = format!(".{domain}");
    let bucket = host.strip_suffix(&suffix)?;
    if bucket.is_empty() {
        None
    } else {
        Some(bucket.to_owned())
    }
}

/// Parse `/{bucket}` or `/{bucket}/{key...}` into its components.
fn parse_path(path: &str) -> (Option<String>, Option<String>) {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    if trimmed.is_empty() {
        return (None, None);
    }

    match trimmed.find('/') {
        Some(pos) => {
            let bucket = decode_uri_component(&trimmed[..pos]);
            let raw_key = &trimmed[pos + 1..];
            let key = if raw_key.is_empty() {
                None
            } else {
                Some(decode_uri_component(raw_key))
            };
            (Some(bucket), key)
        }
        None => (Some(decode_uri_component(trimmed)), None),
    }
}

/// Decode a percent-encoded URI component.
fn decode_uri_component(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}

/// Parse a query string into decoded key-value pairs, preserving order.
fn parse_query_params(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|pair| match pair.find('=') {
            Some(pos) => (
                decode_uri_component(&pair[..pos]),
                decode_uri_component(&pair[pos + 1..]),
            ),
            None => (decode_uri_component(pair), String::new()),
        })
        .collect()
}

fn query_has_key(params: &[(String, String)], key: &str) -> bool {
    params.iter().any(|(k, _)| k == key)
}

/// Map the request shape to an operation.
fn identify_operation(
    method: &Method,
    has_bucket: bool,
    has_key: bool,
    raw_query: &str,
    params: &[(String, String)],
    headers: &http::HeaderMap,
) -> Result<S3Operation, S3Error> {
    match (has_bucket, has_key) {
        // Service level: only listing the caller's buckets.
        (false, false) => match *method {
            Method::GET | Method::HEAD => Ok(S3Operation::ListBuckets),
            _ => Err(S3Error::new(S3ErrorCode::MethodNotAllowed)
                .with_message("Only GET is allowed at the service level")),
        },
        (true, false) => identify_bucket_operation(method, raw_query, params),
        (true, true) => identify_object_operation(method, params, headers),
        (false, true) => Err(S3Error::new(S3ErrorCode::InvalidArgument)
            .with_message("Object key specified without bucket")),
    }
}

/// Bucket-scope dispatch. Token precedence is fixed per method; the first
/// matching token wins.
fn identify_bucket_operation(
    method: &Method,
    raw_query: &str,
    params: &[(String, String)],
) -> Result<S3Operation, S3Error> {
    match *method {
        Method::GET => Ok(bucket_read_token(raw_query, params).unwrap_or(S3Operation::ListObjects)),
        Method::HEAD => Ok(bucket_read_token(raw_query, params).unwrap_or(S3Operation::HeadBucket)),
        Method::PUT => {
            let tokens = [
                ("acl", S3Operation::PutBucketAcl),
                ("versioning", S3Operation::PutBucketVersioning),
                ("policy", S3Operation::PutBucketPolicy),
                ("logging", S3Operation::PutBucketLogging),
                ("website", S3Operation::PutBucketWebsite),
            ];
            Ok(first_token(params, &tokens).unwrap_or(S3Operation::CreateBucket))
        }
        Method::DELETE => {
            let tokens = [
                ("policy", S3Operation::DeleteBucketPolicy),
                ("website", S3Operation::DeleteBucketWebsite),
            ];
            Ok(first_token(params, &tokens).unwrap_or(S3Operation::DeleteBucket))
        }
        Method::POST => {
            if query_has_key(params, "delete") {
                Ok(S3Operation::DeleteObjects)
            } else {
                Ok(S3Operation::PostObject)
            }
        }
        _ => Err(method_not_allowed(method)),
    }
}

/// The shared GET/HEAD bucket token list.
///
/// `versions` is matched as a substring of the raw query string; it sits
/// after `versioning` in the precedence order, so `?versioning` never
/// reaches it.
fn bucket_read_token(raw_query: &str, params: &[(String, String)]) -> Option<S3Operation> {
    if query_has_key(params, "acl") {
        return Some(S3Operation::GetBucketAcl);
    }
    if query_has_key(params, "versioning") {
        return Some(S3Operation::GetBucketVersioning);
    }
    if raw_query.contains("versions") {
        return Some(S3Operation::ListObjectVersions);
    }
    if query_has_key(params, "location") {
        return Some(S3Operation::GetBucketLocation);
    }
    if query_has_key(params, "uploads") {
        return Some(S3Operation::ListMultipartUploads);
    }
    if query_has_key(params, "policy") {
        return Some(S3Operation::GetBucketPolicy);
    }
    if query_has_key(params, "logging") {
        return Some(S3Operation::GetBucketLogging);
    }
    if query_has_key(params, "website") {
        return Some(S3Operation::GetBucketWebsite);
    }
    None
}

/// Return the operation of the first token present in `params`.
fn first_token(params: &[(String, String)], tokens: &[(&str, S3Operation)]) -> Option<S3Operation> {
    tokens
        .iter()
        .find(|(token, _)| query_has_key(params, token))
        .map(|&(_, op)| op)
}

/// Object-scope dispatch.
fn identify_object_operation(
    method: &Method,
    params: &[(String, String)],
    headers: &http::HeaderMap,
) -> Result<S3Operation, S3Error> {
    match *method {
        Method::GET => {
            if query_has_key(params, "uploadId") {
                Ok(S3Operation::ListParts)
            } else if query_has_key(params, "acl") {
                Ok(S3Operation::GetObjectAcl)
            } else {
                Ok(S3Operation::GetObject)
            }
        }
        Method::HEAD => Ok(S3Operation::HeadObject),
        Method::PUT => {
            // A copy-source header wins over every query token; there is no
            // part-copy operation.
            if headers.contains_key("x-amz-copy-source") {
                Ok(S3Operation::CopyObject)
            } else if query_has_key(params, "partNumber") && query_has_key(params, "uploadId") {
                Ok(S3Operation::UploadPart)
            } else if query_has_key(params, "acl") {
                Ok(S3Operation::PutObjectAcl)
            } else {
                Ok(S3Operation::PutObject)
            }
        }
        Method::DELETE => {
            if query_has_key(params, "uploadId") {
                Ok(S3Operation::AbortMultipartUpload)
            } else {
                Ok(S3Operation::DeleteObject)
            }
        }
        Method::POST => {
            if query_has_key(params, "uploads") {
                Ok(S3Operation::CreateMultipartUpload)
            } else if query_has_key(params, "uploadId") {
                Ok(S3Operation::CompleteMultipartUpload)
            } else {
                Err(method_not_allowed(method))
            }
        }
        _ => Err(method_not_allowed(method)),
    }
}

fn method_not_allowed(method: &Method) -> S3Error {
    S3Error::new(S3ErrorCode::MethodNotAllowed)
        .with_message(format!("Method {method} is not allowed for this resource"))
}
