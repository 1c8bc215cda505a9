//! HTTP request to input struct deserialization.
//!
//! [`FromS3Request`] converts raw request parts (headers, query parameters,
//! routed bucket/key labels, body) into the typed input structs from
//! `stratus-s3-model`. Each input field's doc comment records where the
//! value comes from on the wire; the impls here follow those annotations.

use std::collections::BTreeMap;
use std::str::FromStr;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use stratus_s3_model::error::{S3Error, S3ErrorCode};
use stratus_s3_model::types::{
    AccessControlPolicy, CannedAcl, CompletedMultipartUpload, CreateBucketConfiguration, Delete,
    MetadataDirective, VersioningConfiguration, VersioningStatus,
};
use stratus_s3_xml::from_xml;

use crate::form::{extract_boundary, parse_form};

/// Trait for extracting an operation's input from HTTP request components.
pub trait FromS3Request: Sized {
    /// Extract the input from request parts.
    ///
    /// # Errors
    ///
    /// Returns an `S3Error` when required fields are missing or a payload
    /// body fails to parse.
    fn from_s3_request(
        parts: &http::request::Parts,
        bucket: Option<&str>,
        key: Option<&str>,
        query_params: &[(String, String)],
        body: Bytes,
    ) -> Result<Self, S3Error>;
}

// ---------------------------------------------------------------------------
// Extraction helpers
// ---------------------------------------------------------------------------

/// Extract a header value as a string.
pub fn header_str(parts: &http::request::Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToOwned::to_owned)
}

/// Extract a header value and parse it as an HTTP date.
pub fn header_timestamp(parts: &http::request::Parts, name: &str) -> Option<DateTime<Utc>> {
    let value = parts.headers.get(name)?.to_str().ok()?;
    parse_http_date(value)
}

/// Parse an HTTP date string, accepting RFC 7231, RFC 2822, and RFC 3339.
fn parse_http_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%a, %d %b %Y %H:%M:%S GMT") {
        return Some(dt.and_utc());
    }
    None
}

/// Get a query parameter value by name.
#[must_use]
pub fn query_param(params: &[(String, String)], name: &str) -> Option<String> {
    params
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.clone())
}

/// Get a query parameter and parse it into a `FromStr` type.
#[must_use]
pub fn query_param_parse<T: FromStr>(params: &[(String, String)], name: &str) -> Option<T> {
    params
        .iter()
        .find(|(k, _)| k == name)
        .and_then(|(_, v)| v.parse().ok())
}

/// Collect `x-amz-meta-*` headers into a metadata map.
///
/// Keys keep the spelling after the prefix; header names arrive lowercased
/// by the HTTP stack.
pub fn collect_metadata(parts: &http::request::Parts) -> BTreeMap<String, String> {
    parts
        .headers
        .iter()
        .filter_map(|(name, value)| {
            let meta_key = name.as_str().strip_prefix("x-amz-meta-")?;
            let meta_value = value.to_str().ok()?;
            Some((meta_key.to_owned(), meta_value.to_owned()))
        })
        .collect()
}

/// Extract the `x-amz-acl` header as a canned ACL.
///
/// # Errors
///
/// An unrecognized value is an `InvalidArgument` error rather than a silent
/// private default.
pub fn header_canned_acl(parts: &http::request::Parts) -> Result<Option<CannedAcl>, S3Error> {
    match header_str(parts, "x-amz-acl") {
        None => Ok(None),
        Some(raw) => CannedAcl::parse(&raw).map(Some).ok_or_else(|| {
            S3Error::new(S3ErrorCode::InvalidArgument)
                .with_message(format!("Unknown canned ACL: {raw}"))
        }),
    }
}

fn require_bucket(bucket: Option<&str>) -> Result<String, S3Error> {
    bucket.map(ToOwned::to_owned).ok_or_else(|| {
        S3Error::new(S3ErrorCode::InvalidArgument).with_message("Bucket name is required")
    })
}

fn require_key(key: Option<&str>) -> Result<String, S3Error> {
    key.map(ToOwned::to_owned).ok_or_else(|| {
        S3Error::new(S3ErrorCode::InvalidArgument).with_message("Object key is required")
    })
}

fn require_query(params: &[(String, String)], name: &str) -> Result<String, S3Error> {
    query_param(params, name).ok_or_else(|| {
        S3Error::new(S3ErrorCode::InvalidArgument)
            .with_message(format!("Query parameter {name} is required"))
    })
}

/// Parse an XML body into a typed value.
fn parse_xml_body<T: stratus_s3_xml::S3Deserialize>(body: &Bytes) -> Result<T, S3Error> {
    from_xml(body)
        .map_err(|e| S3Error::new(S3ErrorCode::MalformedXml).with_message(e.to_string()))
}

// ---------------------------------------------------------------------------
// Bucket-only inputs
// ---------------------------------------------------------------------------

/// Implement `FromS3Request` for inputs that carry only the bucket label.
macro_rules! impl_bucket_only_input {
    ($($ty:ty),+ $(,)?) => {$(
        impl FromS3Request for $ty {
            fn from_s3_request(
                _parts: &http::request::Parts,
                bucket: Option<&str>,
                _key: Option<&str>,
                _query_params: &[(String, String)],
                _body: Bytes,
            ) -> Result<Self, S3Error> {
                Ok(Self {
                    bucket: require_bucket(bucket)?,
                })
            }
        }
    )+};
}

#[allow(clippy::wildcard_imports)] // Every input type below implements the trait.
use stratus_s3_model::input::*;

impl_bucket_only_input!(
    DeleteBucketInput,
    HeadBucketInput,
    GetBucketLocationInput,
    GetBucketVersioningInput,
    GetBucketPolicyInput,
    DeleteBucketPolicyInput,
    GetBucketAclInput,
);

impl FromS3Request for CreateBucketInput {
    fn from_s3_request(
        parts: &http::request::Parts,
        bucket: Option<&str>,
        _key: Option<&str>,
        _query_params: &[(String, String)],
        body: Bytes,
    ) -> Result<Self, S3Error> {
        let location_constraint = if body.is_empty() {
            None
        } else {
            parse_xml_body::<CreateBucketConfiguration>(&body)?.location_constraint
        };
        Ok(Self {
            acl: header_canned_acl(parts)?,
            bucket: require_bucket(bucket)?,
            location_constraint,
        })
    }
}

impl FromS3Request for PutBucketVersioningInput {
    fn from_s3_request(
        _parts: &http::request::Parts,
        bucket: Option<&str>,
        _key: Option<&str>,
        _query_params: &[(String, String)],
        body: Bytes,
    ) -> Result<Self, S3Error> {
        let config = parse_xml_body::<VersioningConfiguration>(&body)?;
        // An unrecognized status string leaves `None`, which the gateway
        // rejects as an illegal configuration.
        let status = config.status.as_deref().and_then(VersioningStatus::parse);
        Ok(Self {
            bucket: require_bucket(bucket)?,
            status,
        })
    }
}

impl FromS3Request for PutBucketPolicyInput {
    fn from_s3_request(
        _parts: &http::request::Parts,
        bucket: Option<&str>,
        _key: Option<&str>,
        _query_params: &[(String, String)],
        body: Bytes,
    ) -> Result<Self, S3Error> {
        let policy = String::from_utf8(body.to_vec()).map_err(|_| {
            S3Error::new(S3ErrorCode::MalformedPolicy)
                .with_message("Policy document is not valid UTF-8")
        })?;
        Ok(Self {
            bucket: require_bucket(bucket)?,
            policy,
        })
    }
}

impl FromS3Request for PutBucketAclInput {
    fn from_s3_request(
        parts: &http::request::Parts,
        bucket: Option<&str>,
        _key: Option<&str>,
        _query_params: &[(String, String)],
        body: Bytes,
    ) -> Result<Self, S3Error> {
        let access_control_policy = if body.is_empty() {
            None
        } else {
            Some(parse_xml_body::<AccessControlPolicy>(&body)?)
        };
        Ok(Self {
            acl: header_canned_acl(parts)?,
            access_control_policy,
            bucket: require_bucket(bucket)?,
        })
    }
}

impl FromS3Request for DeleteObjectsInput {
    fn from_s3_request(
        _parts: &http::request::Parts,
        bucket: Option<&str>,
        _key: Option<&str>,
        _query_params: &[(String, String)],
        body: Bytes,
    ) -> Result<Self, S3Error> {
        Ok(Self {
            bucket: require_bucket(bucket)?,
            delete: parse_xml_body::<Delete>(&body)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Listing inputs
// ---------------------------------------------------------------------------

impl FromS3Request for ListObjectsInput {
    fn from_s3_request(
        _parts: &http::request::Parts,
        bucket: Option<&str>,
        _key: Option<&str>,
        query_params: &[(String, String)],
        _body: Bytes,
    ) -> Result<Self, S3Error> {
        Ok(Self {
            bucket: require_bucket(bucket)?,
            delimiter: query_param(query_params, "delimiter"),
            marker: query_param(query_params, "marker"),
            max_keys: query_param_parse(query_params, "max-keys"),
            prefix: query_param(query_params, "prefix"),
        })
    }
}

impl FromS3Request for ListObjectVersionsInput {
    fn from_s3_request(
        _parts: &http::request::Parts,
        bucket: Option<&str>,
        _key: Option<&str>,
        query_params: &[(String, String)],
        _body: Bytes,
    ) -> Result<Self, S3Error> {
        Ok(Self {
            bucket: require_bucket(bucket)?,
            delimiter: query_param(query_params, "delimiter"),
            key_marker: query_param(query_params, "key-marker"),
            max_keys: query_param_parse(query_params, "max-keys"),
            prefix: query_param(query_params, "prefix"),
            version_id_marker: query_param(query_params, "version-id-marker"),
        })
    }
}

impl FromS3Request for ListMultipartUploadsInput {
    fn from_s3_request(
        _parts: &http::request::Parts,
        bucket: Option<&str>,
        _key: Option<&str>,
        query_params: &[(String, String)],
        _body: Bytes,
    ) -> Result<Self, S3Error> {
        Ok(Self {
            bucket: require_bucket(bucket)?,
            delimiter: query_param(query_params, "delimiter"),
            key_marker: query_param(query_params, "key-marker"),
            max_uploads: query_param_parse(query_params, "max-uploads"),
            prefix: query_param(query_params, "prefix"),
            upload_id_marker: query_param(query_params, "upload-id-marker"),
        })
    }
}

impl FromS3Request for ListPartsInput {
    fn from_s3_request(
        _parts: &http::request::Parts,
        bucket: Option<&str>,
        key: Option<&str>,
        query_params: &[(String, String)],
        _body: Bytes,
    ) -> Result<Self, S3Error> {
        Ok(Self {
            bucket: require_bucket(bucket)?,
            key: require_key(key)?,
            max_parts: query_param_parse(query_params, "max-parts"),
            part_number_marker: query_param_parse(query_params, "part-number-marker"),
            upload_id: require_query(query_params, "uploadId")?,
        })
    }
}

// ---------------------------------------------------------------------------
// Object inputs
// ---------------------------------------------------------------------------

impl FromS3Request for PutObjectInput {
    fn from_s3_request(
        parts: &http::request::Parts,
        bucket: Option<&str>,
        key: Option<&str>,
        _query_params: &[(String, String)],
        body: Bytes,
    ) -> Result<Self, S3Error> {
        Ok(Self {
            acl: header_canned_acl(parts)?,
            body,
            bucket: require_bucket(bucket)?,
            cache_control: header_str(parts, "cache-control"),
            content_disposition: header_str(parts, "content-disposition"),
            content_encoding: header_str(parts, "content-encoding"),
            content_md5: header_str(parts, "content-md5"),
            content_type: header_str(parts, "content-type"),
            expires: header_str(parts, "expires"),
            key: require_key(key)?,
            metadata: collect_metadata(parts),
        })
    }
}

/// Implement `FromS3Request` for the GET/HEAD object inputs, which share
/// their whole surface.
macro_rules! impl_object_read_input {
    ($($ty:ty),+ $(,)?) => {$(
        impl FromS3Request for $ty {
            fn from_s3_request(
                parts: &http::request::Parts,
                bucket: Option<&str>,
                key: Option<&str>,
                query_params: &[(String, String)],
                _body: Bytes,
            ) -> Result<Self, S3Error> {
                Ok(Self {
                    bucket: require_bucket(bucket)?,
                    if_match: header_str(parts, "if-match"),
                    if_modified_since: header_timestamp(parts, "if-modified-since"),
                    if_none_match: header_str(parts, "if-none-match"),
                    if_unmodified_since: header_timestamp(parts, "if-unmodified-since"),
                    key: require_key(key)?,
                    range: header_str(parts, "range"),
                    version_id: query_param(query_params, "versionId"),
                })
            }
        }
    )+};
}

impl_object_read_input!(GetObjectInput, HeadObjectInput);

impl FromS3Request for DeleteObjectInput {
    fn from_s3_request(
        _parts: &http::request::Parts,
        bucket: Option<&str>,
        key: Option<&str>,
        query_params: &[(String, String)],
        _body: Bytes,
    ) -> Result<Self, S3Error> {
        Ok(Self {
            bucket: require_bucket(bucket)?,
            key: require_key(key)?,
            version_id: query_param(query_params, "versionId"),
        })
    }
}

impl FromS3Request for CopyObjectInput {
    fn from_s3_request(
        parts: &http::request::Parts,
        bucket: Option<&str>,
        key: Option<&str>,
        _query_params: &[(String, String)],
        _body: Bytes,
    ) -> Result<Self, S3Error> {
        let copy_source = header_str(parts, "x-amz-copy-source").ok_or_else(|| {
            S3Error::new(S3ErrorCode::InvalidArgument)
                .with_message("x-amz-copy-source header is required")
        })?;
        let metadata_directive = match header_str(parts, "x-amz-metadata-directive") {
            None => None,
            Some(raw) => Some(MetadataDirective::parse(&raw).ok_or_else(|| {
                S3Error::new(S3ErrorCode::InvalidArgument)
                    .with_message(format!("Unknown metadata directive: {raw}"))
            })?),
        };
        Ok(Self {
            acl: header_canned_acl(parts)?,
            bucket: require_bucket(bucket)?,
            cache_control: header_str(parts, "cache-control"),
            content_disposition: header_str(parts, "content-disposition"),
            content_encoding: header_str(parts, "content-encoding"),
            content_type: header_str(parts, "content-type"),
            copy_source,
            copy_source_if_match: header_str(parts, "x-amz-copy-source-if-match"),
            copy_source_if_modified_since: header_timestamp(
                parts,
                "x-amz-copy-source-if-modified-since",
            ),
            copy_source_if_none_match: header_str(parts, "x-amz-copy-source-if-none-match"),
            copy_source_if_unmodified_since: header_timestamp(
                parts,
                "x-amz-copy-source-if-unmodified-since",
            ),
            expires: header_str(parts, "expires"),
            key: require_key(key)?,
            metadata: collect_metadata(parts),
            metadata_directive,
        })
    }
}

impl FromS3Request for GetObjectAclInput {
    fn from_s3_request(
        _parts: &http::request::Parts,
        bucket: Option<&str>,
        key: Option<&str>,
        query_params: &[(String, String)],
        _body: Bytes,
    ) -> Result<Self, S3Error> {
        Ok(Self {
            bucket: require_bucket(bucket)?,
            key: require_key(key)?,
            version_id: query_param(query_params, "versionId"),
        })
    }
}

impl FromS3Request for PutObjectAclInput {
    fn from_s3_request(
        parts: &http::request::Parts,
        bucket: Option<&str>,
        key: Option<&str>,
        query_params: &[(String, String)],
        body: Bytes,
    ) -> Result<Self, S3Error> {
        let access_control_policy = if body.is_empty() {
            None
        } else {
            Some(parse_xml_body::<AccessControlPolicy>(&body)?)
        };
        Ok(Self {
            acl: header_canned_acl(parts)?,
            access_control_policy,
            bucket: require_bucket(bucket)?,
            key: require_key(key)?,
            version_id: query_param(query_params, "versionId"),
        })
    }
}

impl FromS3Request for PostObjectInput {
    fn from_s3_request(
        parts: &http::request::Parts,
        bucket: Option<&str>,
        _key: Option<&str>,
        _query_params: &[(String, String)],
        body: Bytes,
    ) -> Result<Self, S3Error> {
        let content_type = header_str(parts, "content-type").unwrap_or_default();
        let boundary = extract_boundary(&content_type).ok_or_else(|| {
            S3Error::new(S3ErrorCode::InvalidArgument)
                .with_message("POST upload requires a multipart/form-data body")
        })?;
        let form = parse_form(&body, &boundary)?;

        let raw_key = form.field("key").ok_or_else(|| {
            S3Error::new(S3ErrorCode::InvalidArgument)
                .with_message("POST upload form is missing the key field")
        })?;
        let key = match form.file_name.as_deref() {
            Some(file_name) => raw_key.replace("${filename}", file_name),
            None => raw_key.to_owned(),
        };

        let acl = match form.field("acl") {
            None => None,
            Some(raw) => Some(CannedAcl::parse(raw).ok_or_else(|| {
                S3Error::new(S3ErrorCode::InvalidArgument)
                    .with_message(format!("Unknown canned ACL: {raw}"))
            })?),
        };

        let metadata = form
            .fields
            .iter()
            .filter_map(|(name, value)| {
                let meta_key = name.strip_prefix("x-amz-meta-")?;
                Some((meta_key.to_owned(), value.clone()))
            })
            .collect();

        Ok(Self {
            acl,
            access_key_id: form.field("AWSAccessKeyId").map(ToOwned::to_owned),
            content_type: form
                .field("Content-Type")
                .map(ToOwned::to_owned)
                .or(form.file_content_type),
            body: form.file,
            bucket: require_bucket(bucket)?,
            key,
            metadata,
        })
    }
}

// ---------------------------------------------------------------------------
// Multipart inputs
// ---------------------------------------------------------------------------

impl FromS3Request for CreateMultipartUploadInput {
    fn from_s3_request(
        parts: &http::request::Parts,
        bucket: Option<&str>,
        key: Option<&str>,
        _query_params: &[(String, String)],
        _body: Bytes,
    ) -> Result<Self, S3Error> {
        Ok(Self {
            acl: header_canned_acl(parts)?,
            bucket: require_bucket(bucket)?,
            cache_control: header_str(parts, "cache-control"),
            content_disposition: header_str(parts, "content-disposition"),
            content_encoding: header_str(parts, "content-encoding"),
            content_type: header_str(parts, "content-type"),
            expires: header_str(parts, "expires"),
            key: require_key(key)?,
            metadata: collect_metadata(parts),
        })
    }
}

impl FromS3Request for UploadPartInput {
    fn from_s3_request(
        parts: &http::request::Parts,
        bucket: Option<&str>,
        key: Option<&str>,
        query_params: &[(String, String)],
        body: Bytes,
    ) -> Result<Self, S3Error> {
        let part_number = query_param_parse(query_params, "partNumber").ok_or_else(|| {
            S3Error::new(S3ErrorCode::InvalidArgument)
                .with_message("partNumber must be an integer")
        })?;
        Ok(Self {
            body,
            bucket: require_bucket(bucket)?,
            content_md5: header_str(parts, "content-md5"),
            key: require_key(key)?,
            part_number,
            upload_id: require_query(query_params, "uploadId")?,
        })
    }
}

impl FromS3Request for CompleteMultipartUploadInput {
    fn from_s3_request(
        _parts: &http::request::Parts,
        bucket: Option<&str>,
        key: Option<&str>,
        query_params: &[(String, String)],
        body: Bytes,
    ) -> Result<Self, S3Error> {
        let manifest = parse_xml_body::<CompletedMultipartUpload>(&body)?;
        Ok(Self {
            bucket: require_bucket(bucket)?,
            key: require_key(key)?,
            parts: manifest.parts,
            upload_id: require_query(query_params, "uploadId")?,
        })
    }
}

impl FromS3Request for AbortMultipartUploadInput {
    fn from_s3_request(
        _parts: &http::request::Parts,
        bucket: Option<&str>,
        key: Option<&str>,
        query_params: &[(String, String)],
        _body: Bytes,
    ) -> Result<Self, S3Error> {
        Ok(Self {
            bucket: require_bucket(bucket)?,
            key: require_key(key)?,
            upload_id: require_query(query_params, "uploadId")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(headers: &[(&str, &str)]) -> http::request::Parts {
        let mut builder = http::Request::builder()
            .method(http::Method::PUT)
            .uri("/media/k");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let (parts, ()) = builder.body(()).expect("valid request").into_parts();
        parts
    }

    fn q(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_should_extract_put_object_fields() {
        let parts = parts(&[
            ("content-type", "text/plain"),
            ("content-md5", "XrY7u+Ae7tCTyyK7j1rNww=="),
            ("x-amz-acl", "public-read"),
            ("x-amz-meta-color", "teal"),
        ]);
        let input = PutObjectInput::from_s3_request(
            &parts,
            Some("media"),
            Some("notes.txt"),
            &[],
            Bytes::from("hello"),
        )
        .expect("parses");

        assert_eq!(input.bucket, "media");
        assert_eq!(input.key, "notes.txt");
        assert_eq!(input.acl, Some(CannedAcl::PublicRead));
        assert_eq!(input.content_type.as_deref(), Some("text/plain"));
        assert_eq!(input.metadata.get("color").map(String::as_str), Some("teal"));
        assert_eq!(input.body.as_ref(), b"hello");
    }

    #[test]
    fn test_should_reject_unknown_canned_acl() {
        let parts = parts(&[("x-amz-acl", "world-writable")]);
        let err =
            PutObjectInput::from_s3_request(&parts, Some("media"), Some("k"), &[], Bytes::new())
                .unwrap_err();
        assert_eq!(err.code(), S3ErrorCode::InvalidArgument);
    }

    #[test]
    fn test_should_parse_conditional_headers_as_http_dates() {
        let parts = parts(&[("if-modified-since", "Mon, 15 Jan 2024 10:30:00 GMT")]);
        let input =
            GetObjectInput::from_s3_request(&parts, Some("media"), Some("k"), &[], Bytes::new())
                .expect("parses");
        let expected = chrono::NaiveDate::from_ymd_opt(2024, 1, 15)
            .and_then(|d| d.and_hms_opt(10, 30, 0))
            .map(|dt| dt.and_utc())
            .expect("valid date");
        assert_eq!(input.if_modified_since, Some(expected));
    }

    #[test]
    fn test_should_require_upload_id_for_upload_part() {
        let parts = parts(&[]);
        let err = UploadPartInput::from_s3_request(
            &parts,
            Some("media"),
            Some("k"),
            &q(&[("partNumber", "3")]),
            Bytes::new(),
        )
        .unwrap_err();
        assert_eq!(err.code(), S3ErrorCode::InvalidArgument);

        let input = UploadPartInput::from_s3_request(
            &parts,
            Some("media"),
            Some("k"),
            &q(&[("partNumber", "3"), ("uploadId", "u-1")]),
            Bytes::from("data"),
        )
        .expect("parses");
        assert_eq!(input.part_number, 3);
        assert_eq!(input.upload_id, "u-1");
    }

    #[test]
    fn test_should_parse_create_bucket_location_constraint() {
        let body = Bytes::from(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
             <CreateBucketConfiguration>\
               <LocationConstraint>eu-west-1</LocationConstraint>\
             </CreateBucketConfiguration>",
        );
        let parts = parts(&[]);
        let input = CreateBucketInput::from_s3_request(&parts, Some("media"), None, &[], body)
            .expect("parses");
        assert_eq!(input.location_constraint.as_deref(), Some("eu-west-1"));
    }

    #[test]
    fn test_should_leave_status_unset_for_unknown_versioning_value() {
        let body = Bytes::from(
            "<VersioningConfiguration><Status>Paused</Status></VersioningConfiguration>",
        );
        let parts = parts(&[]);
        let input = PutBucketVersioningInput::from_s3_request(&parts, Some("media"), None, &[], body)
            .expect("parses");
        assert_eq!(input.status, None);
    }

    #[test]
    fn test_should_reject_malformed_delete_body() {
        let parts = parts(&[]);
        let err = DeleteObjectsInput::from_s3_request(
            &parts,
            Some("media"),
            None,
            &[],
            Bytes::from("<Delete><Object>"),
        )
        .unwrap_err();
        assert_eq!(err.code(), S3ErrorCode::MalformedXml);
    }

    #[test]
    fn test_should_parse_copy_object_headers() {
        let parts = parts(&[
            ("x-amz-copy-source", "/src-bucket/dir/a.txt?versionId=v7"),
            ("x-amz-metadata-directive", "REPLACE"),
            ("x-amz-meta-lang", "en"),
        ]);
        let input =
            CopyObjectInput::from_s3_request(&parts, Some("media"), Some("b.txt"), &[], Bytes::new())
                .expect("parses");
        assert_eq!(input.copy_source, "/src-bucket/dir/a.txt?versionId=v7");
        assert_eq!(input.metadata_directive, Some(MetadataDirective::Replace));
        assert_eq!(input.metadata.get("lang").map(String::as_str), Some("en"));
    }

    #[test]
    fn test_should_substitute_filename_in_post_key() {
        let body = Bytes::from(
            "--b42\r\n\
             Content-Disposition: form-data; name=\"key\"\r\n\
             \r\n\
             uploads/${filename}\r\n\
             --b42\r\n\
             Content-Disposition: form-data; name=\"AWSAccessKeyId\"\r\n\
             \r\n\
             STRATUSEXAMPLEKEY\r\n\
             --b42\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"cat.jpg\"\r\n\
             Content-Type: image/jpeg\r\n\
             \r\n\
             jpegbytes\r\n\
             --b42--\r\n",
        );
        let parts = parts(&[("content-type", "multipart/form-data; boundary=b42")]);
        let input = PostObjectInput::from_s3_request(&parts, Some("media"), None, &[], body)
            .expect("parses");

        assert_eq!(input.key, "uploads/cat.jpg");
        assert_eq!(input.access_key_id.as_deref(), Some("STRATUSEXAMPLEKEY"));
        assert_eq!(input.content_type.as_deref(), Some("image/jpeg"));
        assert_eq!(input.body.as_ref(), b"jpegbytes");
    }

    #[test]
    fn test_should_collect_post_form_metadata_fields() {
        let body = Bytes::from(
            "--b42\r\n\
             Content-Disposition: form-data; name=\"key\"\r\n\
             \r\n\
             k\r\n\
             --b42\r\n\
             Content-Disposition: form-data; name=\"x-amz-meta-color\"\r\n\
             \r\n\
             teal\r\n\
             --b42\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"f\"\r\n\
             \r\n\
             data\r\n\
             --b42--\r\n",
        );
        let parts = parts(&[("content-type", "multipart/form-data; boundary=b42")]);
        let input = PostObjectInput::from_s3_request(&parts, Some("media"), None, &[], body)
            .expect("parses");
        assert_eq!(input.metadata.get("color").map(String::as_str), Some("teal"));
    }
}
