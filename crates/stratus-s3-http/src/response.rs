//! Output struct to HTTP response serialization.
//!
//! [`IntoS3Response`] converts the typed outputs from `stratus-s3-model`
//! into HTTP responses. Three shapes cover everything the gateway answers:
//! header-only responses (writes), XML documents (listings, configuration
//! reads, copy and multipart results), and the object byte payload of
//! GetObject. Errors render through [`error_to_response`] as the S3
//! `<Error>` document.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::header::HeaderValue;
use stratus_s3_model::error::{S3Error, S3ErrorCode};
use stratus_s3_model::types::AccessControlPolicy;
use stratus_s3_xml::{S3Serialize, error_to_xml, to_xml};

use crate::body::S3ResponseBody;

/// Trait for converting an operation output into an HTTP response.
pub trait IntoS3Response {
    /// Convert this output into an HTTP response.
    ///
    /// # Errors
    ///
    /// Returns an `S3Error` when the response cannot be constructed.
    fn into_s3_response(self) -> Result<http::Response<S3ResponseBody>, S3Error>;
}

// ---------------------------------------------------------------------------
// Builder helpers
// ---------------------------------------------------------------------------

fn set_optional_header(
    builder: http::response::Builder,
    name: &str,
    value: Option<&str>,
) -> http::response::Builder {
    if let Some(v) = value {
        if let Ok(hv) = HeaderValue::from_str(v) {
            return builder.header(name, hv);
        }
    }
    builder
}

fn set_timestamp_header(
    builder: http::response::Builder,
    name: &str,
    value: &DateTime<Utc>,
) -> http::response::Builder {
    let formatted = value.format("%a, %d %b %Y %H:%M:%S GMT").to_string();
    match HeaderValue::from_str(&formatted) {
        Ok(hv) => builder.header(name, hv),
        Err(_) => builder,
    }
}

fn set_metadata_headers(
    mut builder: http::response::Builder,
    metadata: &std::collections::BTreeMap<String, String>,
) -> http::response::Builder {
    for (key, value) in metadata {
        if let Ok(hv) = HeaderValue::from_str(value) {
            builder = builder.header(format!("x-amz-meta-{key}"), hv);
        }
    }
    builder
}

fn build_response(
    builder: http::response::Builder,
    body: S3ResponseBody,
) -> Result<http::Response<S3ResponseBody>, S3Error> {
    builder.body(body).map_err(|e| {
        S3Error::new(S3ErrorCode::InternalError)
            .with_message(format!("failed to build HTTP response: {e}"))
    })
}

/// Serialize a value as the given root element and wrap it in a 200 XML
/// response.
fn xml_response<T: S3Serialize>(
    root: &str,
    value: &T,
) -> Result<http::Response<S3ResponseBody>, S3Error> {
    let xml = to_xml(root, value).map_err(|e| {
        S3Error::new(S3ErrorCode::InternalError)
            .with_message(format!("failed to serialize {root}: {e}"))
    })?;
    let builder = http::Response::builder()
        .status(http::StatusCode::OK)
        .header(http::header::CONTENT_TYPE, "application/xml");
    build_response(builder, S3ResponseBody::from_xml(xml))
}

/// A bare response with the given status and no body, for operations whose
/// success carries no output.
pub fn empty_response(status: http::StatusCode) -> Result<http::Response<S3ResponseBody>, S3Error> {
    build_response(http::Response::builder().status(status), S3ResponseBody::empty())
}

// ---------------------------------------------------------------------------
// Bucket operations
// ---------------------------------------------------------------------------

#[allow(clippy::wildcard_imports)] // Every output type below implements the trait.
use stratus_s3_model::output::*;

impl IntoS3Response for CreateBucketOutput {
    fn into_s3_response(self) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let builder = http::Response::builder().status(http::StatusCode::OK);
        let builder = set_optional_header(builder, "Location", Some(&self.location));
        build_response(builder, S3ResponseBody::empty())
    }
}

impl IntoS3Response for GetBucketLocationOutput {
    fn into_s3_response(self) -> Result<http::Response<S3ResponseBody>, S3Error> {
        xml_response("LocationConstraint", &self)
    }
}

impl IntoS3Response for GetBucketVersioningOutput {
    fn into_s3_response(self) -> Result<http::Response<S3ResponseBody>, S3Error> {
        xml_response("VersioningConfiguration", &self)
    }
}

impl IntoS3Response for GetBucketPolicyOutput {
    fn into_s3_response(self) -> Result<http::Response<S3ResponseBody>, S3Error> {
        // The stored JSON document is returned byte for byte.
        let builder = http::Response::builder()
            .status(http::StatusCode::OK)
            .header(http::header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref());
        build_response(builder, S3ResponseBody::from_string(self.policy))
    }
}

impl IntoS3Response for DeleteObjectsOutput {
    fn into_s3_response(self) -> Result<http::Response<S3ResponseBody>, S3Error> {
        xml_response("DeleteResult", &self)
    }
}

impl IntoS3Response for AccessControlPolicy {
    fn into_s3_response(self) -> Result<http::Response<S3ResponseBody>, S3Error> {
        xml_response("AccessControlPolicy", &self)
    }
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

impl IntoS3Response for ListBucketsOutput {
    fn into_s3_response(self) -> Result<http::Response<S3ResponseBody>, S3Error> {
        xml_response("ListAllMyBucketsResult", &self)
    }
}

impl IntoS3Response for ListObjectsOutput {
    fn into_s3_response(self) -> Result<http::Response<S3ResponseBody>, S3Error> {
        xml_response("ListBucketResult", &self)
    }
}

impl IntoS3Response for ListObjectVersionsOutput {
    fn into_s3_response(self) -> Result<http::Response<S3ResponseBody>, S3Error> {
        xml_response("ListVersionsResult", &self)
    }
}

impl IntoS3Response for ListMultipartUploadsOutput {
    fn into_s3_response(self) -> Result<http::Response<S3ResponseBody>, S3Error> {
        xml_response("ListMultipartUploadsResult", &self)
    }
}

impl IntoS3Response for ListPartsOutput {
    fn into_s3_response(self) -> Result<http::Response<S3ResponseBody>, S3Error> {
        xml_response("ListPartsResult", &self)
    }
}

// ---------------------------------------------------------------------------
// Object operations
// ---------------------------------------------------------------------------

/// Set the headers GetObject and HeadObject share.
fn set_object_headers(
    builder: http::response::Builder,
    output: &GetObjectOutput,
) -> http::response::Builder {
    let mut builder = set_optional_header(builder, "ETag", Some(&output.etag));
    builder = set_timestamp_header(builder, "Last-Modified", &output.last_modified);
    builder = set_optional_header(
        builder,
        http::header::CONTENT_TYPE.as_str(),
        output.content_type.as_deref(),
    );
    builder = set_optional_header(builder, "Content-Range", output.content_range.as_deref());
    builder = set_optional_header(builder, "Cache-Control", output.cache_control.as_deref());
    builder = set_optional_header(
        builder,
        "Content-Disposition",
        output.content_disposition.as_deref(),
    );
    builder = set_optional_header(
        builder,
        "Content-Encoding",
        output.content_encoding.as_deref(),
    );
    builder = set_optional_header(builder, "Expires", output.expires.as_deref());
    builder = set_optional_header(builder, "x-amz-version-id", output.version_id.as_deref());
    if output.missing_meta > 0 {
        builder = builder.header("x-amz-missing-meta", output.missing_meta);
    }
    set_metadata_headers(builder, &output.metadata)
}

fn object_status(output: &GetObjectOutput) -> http::StatusCode {
    if output.content_range.is_some() {
        http::StatusCode::PARTIAL_CONTENT
    } else {
        http::StatusCode::OK
    }
}

impl IntoS3Response for GetObjectOutput {
    fn into_s3_response(self) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let builder = http::Response::builder().status(object_status(&self));
        let builder = set_object_headers(builder, &self);
        build_response(builder, S3ResponseBody::from_bytes(self.body))
    }
}

/// HEAD rendering of a [`GetObjectOutput`]: identical headers, no body, an
/// explicit `Content-Length` so clients still learn the object size.
#[derive(Debug, Clone)]
pub struct HeadObjectResponse(pub GetObjectOutput);

impl IntoS3Response for HeadObjectResponse {
    fn into_s3_response(self) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let output = self.0;
        let mut builder = http::Response::builder().status(object_status(&output));
        if output.content_range.is_none() {
            builder = builder.header(http::header::CONTENT_LENGTH, output.total_size);
        }
        let builder = set_object_headers(builder, &output);
        build_response(builder, S3ResponseBody::empty())
    }
}

impl IntoS3Response for PutObjectOutput {
    fn into_s3_response(self) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let builder = http::Response::builder().status(http::StatusCode::OK);
        let builder = set_optional_header(builder, "ETag", Some(&self.etag));
        let builder = set_optional_header(builder, "x-amz-version-id", self.version_id.as_deref());
        build_response(builder, S3ResponseBody::empty())
    }
}

impl IntoS3Response for DeleteObjectOutput {
    fn into_s3_response(self) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let mut builder = http::Response::builder().status(http::StatusCode::NO_CONTENT);
        if self.delete_marker {
            builder = builder.header("x-amz-delete-marker", "true");
        }
        let builder = set_optional_header(builder, "x-amz-version-id", self.version_id.as_deref());
        build_response(builder, S3ResponseBody::empty())
    }
}

impl IntoS3Response for CopyObjectOutput {
    fn into_s3_response(self) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let xml = to_xml("CopyObjectResult", &self).map_err(|e| {
            S3Error::new(S3ErrorCode::InternalError)
                .with_message(format!("failed to serialize CopyObjectResult: {e}"))
        })?;
        let builder = http::Response::builder()
            .status(http::StatusCode::OK)
            .header(http::header::CONTENT_TYPE, "application/xml");
        let builder = set_optional_header(builder, "x-amz-version-id", self.version_id.as_deref());
        let builder = set_optional_header(
            builder,
            "x-amz-copy-source-version-id",
            self.source_version_id.as_deref(),
        );
        build_response(builder, S3ResponseBody::from_xml(xml))
    }
}

// ---------------------------------------------------------------------------
// Multipart operations
// ---------------------------------------------------------------------------

impl IntoS3Response for CreateMultipartUploadOutput {
    fn into_s3_response(self) -> Result<http::Response<S3ResponseBody>, S3Error> {
        xml_response("InitiateMultipartUploadResult", &self)
    }
}

impl IntoS3Response for UploadPartOutput {
    fn into_s3_response(self) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let builder = http::Response::builder().status(http::StatusCode::OK);
        let builder = set_optional_header(builder, "ETag", Some(&self.etag));
        build_response(builder, S3ResponseBody::empty())
    }
}

impl IntoS3Response for CompleteMultipartUploadOutput {
    fn into_s3_response(self) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let xml = to_xml("CompleteMultipartUploadResult", &self).map_err(|e| {
            S3Error::new(S3ErrorCode::InternalError)
                .with_message(format!("failed to serialize CompleteMultipartUploadResult: {e}"))
        })?;
        let builder = http::Response::builder()
            .status(http::StatusCode::OK)
            .header(http::header::CONTENT_TYPE, "application/xml");
        let builder = set_optional_header(builder, "x-amz-version-id", self.version_id.as_deref());
        build_response(builder, S3ResponseBody::from_xml(xml))
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Render an [`S3Error`] as the XML `<Error>` document with its mapped
/// status code.
#[must_use]
pub fn error_to_response(err: &S3Error, request_id: &str) -> http::Response<S3ResponseBody> {
    let xml = error_to_xml(
        err.code().as_str(),
        err.message(),
        err.resource(),
        request_id,
    );

    http::Response::builder()
        .status(err.status_code())
        .header(http::header::CONTENT_TYPE, "application/xml")
        .body(S3ResponseBody::from_bytes(Bytes::from(xml)))
        .unwrap_or_else(|_| {
            http::Response::builder()
                .status(http::StatusCode::INTERNAL_SERVER_ERROR)
                .body(S3ResponseBody::empty())
                .expect("static response should be valid")
        })
}
