//! Bridges the HTTP layer to the gateway.
//!
//! [`StratusHandler`] implements the `S3Handler` seam: it resolves the
//! caller from the presented access key, parses the operation's input from
//! the request, invokes the matching [`StratusGateway`] method, and renders
//! the output. A few read-path errors need transport-level treatment
//! (an empty 304, the delete-marker 405 headers); everything else flows
//! back as an `S3Error` for the service to render.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http::header::HeaderValue;

use stratus_s3_core::{CallerContext, ServiceError, StratusGateway};
use stratus_s3_http::{
    FromS3Request, HeadObjectResponse, IntoS3Response, RoutingContext, S3Handler, S3ResponseBody,
    empty_response, error_to_response, extract_access_key,
};
use stratus_s3_model::error::{S3Error, S3ErrorCode};
use stratus_s3_model::S3Operation;

#[allow(clippy::wildcard_imports)] // One input struct per operation arm below.
use stratus_s3_model::input::*;

/// The gateway wrapped for HTTP dispatch.
#[derive(Debug, Clone)]
pub struct StratusHandler {
    gateway: Arc<StratusGateway>,
}

impl StratusHandler {
    /// Wrap a gateway.
    #[must_use]
    pub fn new(gateway: StratusGateway) -> Self {
        Self {
            gateway: Arc::new(gateway),
        }
    }
}

impl S3Handler for StratusHandler {
    fn handle_operation(
        &self,
        op: S3Operation,
        parts: http::request::Parts,
        body: Bytes,
        ctx: RoutingContext,
        request_id: String,
    ) -> Pin<Box<dyn Future<Output = Result<http::Response<S3ResponseBody>, S3Error>> + Send>>
    {
        let gateway = Arc::clone(&self.gateway);
        Box::pin(async move { handle(&gateway, op, &parts, body, &ctx, &request_id).await })
    }
}

/// Resolve the transport caller for this request.
fn caller_context(
    gateway: &StratusGateway,
    parts: &http::request::Parts,
    ctx: &RoutingContext,
) -> CallerContext {
    let access_key = extract_access_key(parts, &ctx.query_params);
    CallerContext {
        identity: gateway.resolve_identity(access_key.as_deref()),
        source_ip: ctx.source_ip,
    }
}

/// Parse, invoke, render.
#[allow(clippy::too_many_lines)] // One arm per operation; splitting would obscure the table.
async fn handle(
    gateway: &StratusGateway,
    op: S3Operation,
    parts: &http::request::Parts,
    body: Bytes,
    ctx: &RoutingContext,
    request_id: &str,
) -> Result<http::Response<S3ResponseBody>, S3Error> {
    let caller = caller_context(gateway, parts, ctx);
    let bucket = ctx.bucket.as_deref();
    let key = ctx.key.as_deref();
    let q = &ctx.query_params;

    match op {
        // -- Bucket lifecycle ------------------------------------------------
        S3Operation::CreateBucket => {
            let input = CreateBucketInput::from_s3_request(parts, bucket, key, q, body)?;
            gateway.create_bucket(&caller, input)?.into_s3_response()
        }
        S3Operation::DeleteBucket => {
            let input = DeleteBucketInput::from_s3_request(parts, bucket, key, q, body)?;
            gateway.delete_bucket(&caller, input)?;
            empty_response(http::StatusCode::NO_CONTENT)
        }
        S3Operation::HeadBucket => {
            let input = HeadBucketInput::from_s3_request(parts, bucket, key, q, body)?;
            gateway.head_bucket(&caller, input)?;
            empty_response(http::StatusCode::OK)
        }
        S3Operation::ListBuckets => gateway.list_buckets(&caller)?.into_s3_response(),
        S3Operation::GetBucketLocation => {
            let input = GetBucketLocationInput::from_s3_request(parts, bucket, key, q, body)?;
            gateway.get_bucket_location(&caller, input)?.into_s3_response()
        }

        // -- Bucket configuration --------------------------------------------
        S3Operation::GetBucketVersioning => {
            let input = GetBucketVersioningInput::from_s3_request(parts, bucket, key, q, body)?;
            gateway
                .get_bucket_versioning(&caller, input)?
                .into_s3_response()
        }
        S3Operation::PutBucketVersioning => {
            let input = PutBucketVersioningInput::from_s3_request(parts, bucket, key, q, body)?;
            gateway.put_bucket_versioning(&caller, input)?;
            empty_response(http::StatusCode::OK)
        }
        S3Operation::GetBucketPolicy => {
            let input = GetBucketPolicyInput::from_s3_request(parts, bucket, key, q, body)?;
            gateway.get_bucket_policy(&caller, input)?.into_s3_response()
        }
        S3Operation::PutBucketPolicy => {
            let input = PutBucketPolicyInput::from_s3_request(parts, bucket, key, q, body)?;
            gateway.put_bucket_policy(&caller, input)?;
            empty_response(http::StatusCode::NO_CONTENT)
        }
        S3Operation::DeleteBucketPolicy => {
            let input = DeleteBucketPolicyInput::from_s3_request(parts, bucket, key, q, body)?;
            gateway.delete_bucket_policy(&caller, input)?;
            empty_response(http::StatusCode::NO_CONTENT)
        }
        S3Operation::GetBucketAcl => {
            let input = GetBucketAclInput::from_s3_request(parts, bucket, key, q, body)?;
            gateway.get_bucket_acl(&caller, input)?.into_s3_response()
        }
        S3Operation::PutBucketAcl => {
            let input = PutBucketAclInput::from_s3_request(parts, bucket, key, q, body)?;
            gateway.put_bucket_acl(&caller, input)?;
            empty_response(http::StatusCode::OK)
        }

        // -- Listings --------------------------------------------------------
        S3Operation::ListObjects => {
            let input = ListObjectsInput::from_s3_request(parts, bucket, key, q, body)?;
            gateway.list_objects(&caller, input)?.into_s3_response()
        }
        S3Operation::ListObjectVersions => {
            let input = ListObjectVersionsInput::from_s3_request(parts, bucket, key, q, body)?;
            gateway
                .list_object_versions(&caller, input)?
                .into_s3_response()
        }
        S3Operation::ListMultipartUploads => {
            let input = ListMultipartUploadsInput::from_s3_request(parts, bucket, key, q, body)?;
            gateway
                .list_multipart_uploads(&caller, input)?
                .into_s3_response()
        }

        // -- Objects ---------------------------------------------------------
        S3Operation::PutObject => {
            let input = PutObjectInput::from_s3_request(parts, bucket, key, q, body)?;
            gateway.put_object(&caller, input).await?.into_s3_response()
        }
        S3Operation::GetObject => {
            let input = GetObjectInput::from_s3_request(parts, bucket, key, q, body)?;
            match gateway.get_object(&caller, input).await {
                Ok(output) => output.into_s3_response(),
                Err(err) => render_read_error(err, request_id),
            }
        }
        S3Operation::HeadObject => {
            let input = HeadObjectInput::from_s3_request(parts, bucket, key, q, body)?;
            match gateway.head_object(&caller, input) {
                Ok(output) => HeadObjectResponse(output).into_s3_response(),
                Err(err) => render_read_error(err, request_id),
            }
        }
        S3Operation::DeleteObject => {
            let input = DeleteObjectInput::from_s3_request(parts, bucket, key, q, body)?;
            gateway.delete_object(&caller, input)?.into_s3_response()
        }
        S3Operation::DeleteObjects => {
            let input = DeleteObjectsInput::from_s3_request(parts, bucket, key, q, body)?;
            gateway.delete_objects(&caller, input)?.into_s3_response()
        }
        S3Operation::CopyObject => {
            let input = CopyObjectInput::from_s3_request(parts, bucket, key, q, body)?;
            gateway.copy_object(&caller, input).await?.into_s3_response()
        }
        S3Operation::GetObjectAcl => {
            let input = GetObjectAclInput::from_s3_request(parts, bucket, key, q, body)?;
            gateway.get_object_acl(&caller, input)?.into_s3_response()
        }
        S3Operation::PutObjectAcl => {
            let input = PutObjectAclInput::from_s3_request(parts, bucket, key, q, body)?;
            gateway.put_object_acl(&caller, input)?;
            empty_response(http::StatusCode::OK)
        }
        S3Operation::PostObject => {
            let input = PostObjectInput::from_s3_request(parts, bucket, key, q, body)?;
            let output = gateway.post_object(&caller, input).await?;
            // Browser form uploads answer 204; the interesting data rides in
            // headers.
            let mut response = empty_response(http::StatusCode::NO_CONTENT)?;
            if let Ok(hv) = HeaderValue::from_str(&output.etag) {
                response.headers_mut().insert("ETag", hv);
            }
            if let Some(version_id) = output.version_id.as_deref() {
                if let Ok(hv) = HeaderValue::from_str(version_id) {
                    response.headers_mut().insert("x-amz-version-id", hv);
                }
            }
            Ok(response)
        }

        // -- Multipart uploads -----------------------------------------------
        S3Operation::CreateMultipartUpload => {
            let input = CreateMultipartUploadInput::from_s3_request(parts, bucket, key, q, body)?;
            gateway
                .create_multipart_upload(&caller, input)?
                .into_s3_response()
        }
        S3Operation::UploadPart => {
            let input = UploadPartInput::from_s3_request(parts, bucket, key, q, body)?;
            gateway.upload_part(&caller, input).await?.into_s3_response()
        }
        S3Operation::CompleteMultipartUpload => {
            let input =
                CompleteMultipartUploadInput::from_s3_request(parts, bucket, key, q, body)?;
            gateway
                .complete_multipart_upload(&caller, input)
                .await?
                .into_s3_response()
        }
        S3Operation::AbortMultipartUpload => {
            let input = AbortMultipartUploadInput::from_s3_request(parts, bucket, key, q, body)?;
            gateway.abort_multipart_upload(&caller, input)?;
            empty_response(http::StatusCode::NO_CONTENT)
        }
        S3Operation::ListParts => {
            let input = ListPartsInput::from_s3_request(parts, bucket, key, q, body)?;
            gateway.list_parts(&caller, input)?.into_s3_response()
        }

        // -- Recognized but unsupported sub-resources ------------------------
        S3Operation::GetBucketLogging
        | S3Operation::PutBucketLogging
        | S3Operation::GetBucketWebsite
        | S3Operation::PutBucketWebsite
        | S3Operation::DeleteBucketWebsite => Err(S3Error::new(S3ErrorCode::NotImplemented)
            .with_message(format!("{} is not implemented", op.as_str()))),
    }
}

/// Transport-level rendering for GetObject/HeadObject failures.
///
/// A fresh cached copy answers an empty 304; a versionId naming a delete
/// marker answers the 405 error document plus the marker headers. All other
/// errors render through the common path.
fn render_read_error(
    err: ServiceError,
    request_id: &str,
) -> Result<http::Response<S3ResponseBody>, S3Error> {
    match err {
        ServiceError::NotModified => empty_response(http::StatusCode::NOT_MODIFIED),
        ServiceError::DeleteMarker { version_id } => {
            let s3_err = S3Error::from(ServiceError::DeleteMarker {
                version_id: version_id.clone(),
            });
            let mut response = error_to_response(&s3_err, request_id);
            response
                .headers_mut()
                .insert("x-amz-delete-marker", HeaderValue::from_static("true"));
            if let Ok(hv) = HeaderValue::from_str(&version_id) {
                response.headers_mut().insert("x-amz-version-id", hv);
            }
            Ok(response)
        }
        other => Err(other.into()),
    }
}

#[cfg(test)]
mod tests {
    use stratus_s3_core::GatewayConfig;
    use stratus_s3_http::dispatch::dispatch_operation;

    use super::*;

    fn handler() -> StratusHandler {
        StratusHandler::new(StratusGateway::new(GatewayConfig::default()))
    }

    fn request(
        method: http::Method,
        uri: &str,
        body: &str,
    ) -> (http::request::Parts, Bytes) {
        let (parts, ()) = http::Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", "AWS STRATUSEXAMPLEKEY:c2ln")
            .body(())
            .expect("valid request")
            .into_parts();
        (parts, Bytes::from(body.to_owned()))
    }

    fn ctx(bucket: Option<&str>, key: Option<&str>, op: S3Operation) -> RoutingContext {
        RoutingContext {
            bucket: bucket.map(ToOwned::to_owned),
            key: key.map(ToOwned::to_owned),
            operation: op,
            query_params: vec![],
            source_ip: None,
        }
    }

    async fn run(
        handler: &StratusHandler,
        method: http::Method,
        uri: &str,
        body: &str,
        routing: RoutingContext,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let (parts, body) = request(method, uri, body);
        dispatch_operation(handler, parts, body, routing, "test-rid".to_owned()).await
    }

    #[tokio::test]
    async fn test_should_create_bucket_and_put_and_get_object() {
        let handler = handler();

        let resp = run(
            &handler,
            http::Method::PUT,
            "/media",
            "",
            ctx(Some("media"), None, S3Operation::CreateBucket),
        )
        .await
        .expect("create bucket");
        assert_eq!(resp.status(), http::StatusCode::OK);
        assert_eq!(
            resp.headers().get("Location").and_then(|v| v.to_str().ok()),
            Some("/media")
        );

        let resp = run(
            &handler,
            http::Method::PUT,
            "/media/notes.txt",
            "hello stratus",
            ctx(Some("media"), Some("notes.txt"), S3Operation::PutObject),
        )
        .await
        .expect("put object");
        assert!(resp.headers().contains_key("ETag"));

        let resp = run(
            &handler,
            http::Method::GET,
            "/media/notes.txt",
            "",
            ctx(Some("media"), Some("notes.txt"), S3Operation::GetObject),
        )
        .await
        .expect("get object");
        assert_eq!(resp.status(), http::StatusCode::OK);
    }

    #[tokio::test]
    async fn test_should_answer_not_implemented_for_logging() {
        let handler = handler();
        let err = run(
            &handler,
            http::Method::GET,
            "/media?logging",
            "",
            ctx(Some("media"), None, S3Operation::GetBucketLogging),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), S3ErrorCode::NotImplemented);
    }

    #[tokio::test]
    async fn test_should_report_missing_bucket_as_not_found() {
        let handler = handler();
        let err = run(
            &handler,
            http::Method::GET,
            "/ghost/x",
            "",
            ctx(Some("ghost"), Some("x"), S3Operation::GetObject),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), S3ErrorCode::NoSuchBucket);
    }
}
