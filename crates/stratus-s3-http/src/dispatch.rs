//! Operation dispatch: the seam between transport and gateway logic.
//!
//! [`S3Handler`] is the trait the gateway implements; the service layer
//! calls it through [`dispatch_operation`] once routing and body collection
//! have finished. The handler receives the identified operation, the raw
//! request parts and body, and the routing context, and must produce a full
//! HTTP response.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use stratus_s3_model::S3Operation;
use stratus_s3_model::error::S3Error;

use crate::body::S3ResponseBody;
use crate::router::RoutingContext;

/// Trait the business-logic provider implements.
///
/// Uses manual future boxing so the service layer can hold the handler
/// behind `Arc<H>` without generic async-fn-in-trait restrictions.
pub trait S3Handler: Send + Sync + 'static {
    /// Handle one S3 operation and produce an HTTP response.
    ///
    /// `request_id` is the id the service minted for this request; handlers
    /// thread it into any error document they render themselves.
    fn handle_operation(
        &self,
        op: S3Operation,
        parts: http::request::Parts,
        body: Bytes,
        ctx: RoutingContext,
        request_id: String,
    ) -> Pin<Box<dyn Future<Output = Result<http::Response<S3ResponseBody>, S3Error>> + Send>>;
}

/// Dispatch a routed request to the handler.
pub async fn dispatch_operation<H: S3Handler>(
    handler: &H,
    parts: http::request::Parts,
    body: Bytes,
    ctx: RoutingContext,
    request_id: String,
) -> Result<http::Response<S3ResponseBody>, S3Error> {
    let op = ctx.operation;
    tracing::debug!(operation = %op, bucket = ?ctx.bucket, key = ?ctx.key, "dispatching S3 operation");
    handler.handle_operation(op, parts, body, ctx, request_id).await
}

/// Handler that answers `NotImplemented` for every operation.
///
/// Lets the routing and parsing layers be exercised in isolation.
#[derive(Debug, Clone, Default)]
pub struct NotImplementedHandler;

impl S3Handler for NotImplementedHandler {
    fn handle_operation(
        &self,
        op: S3Operation,
        _parts: http::request::Parts,
        _body: Bytes,
        _ctx: RoutingContext,
        _request_id: String,
    ) -> Pin<Box<dyn Future<Output = Result<http::Response<S3ResponseBody>, S3Error>> + Send>> {
        Box::pin(async move {
            Err(
                S3Error::new(stratus_s3_model::S3ErrorCode::NotImplemented)
                    .with_resource(op.as_str()),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use stratus_s3_model::S3ErrorCode;

    use super::*;

    #[tokio::test]
    async fn test_should_answer_not_implemented_from_default_handler() {
        let handler = NotImplementedHandler;
        let (parts, ()) = http::Request::builder()
            .method(http::Method::GET)
            .uri("/media")
            .body(())
            .expect("valid request")
            .into_parts();
        let ctx = RoutingContext {
            bucket: Some("media".to_owned()),
            key: None,
            operation: S3Operation::ListObjects,
            query_params: vec![],
            source_ip: None,
        };

        let err = dispatch_operation(&handler, parts, Bytes::new(), ctx, "rid".to_owned())
            .await
            .unwrap_err();
        assert_eq!(err.code(), S3ErrorCode::NotImplemented);
    }
}
