//! The hyper `Service` tying routing, dispatch, and rendering together.
//!
//! [`S3HttpService`] processes every request through the same pipeline:
//!
//! 1. Health probe interception (`GET /_stratus/health`)
//! 2. Routing via [`S3Router`]
//! 3. Request body collection
//! 4. Dispatch to the [`S3Handler`]
//! 5. Error rendering and common response headers
//!    (`x-amz-request-id`, `x-amz-id-2`, `Server`)
//!
//! Identity is not verified here. [`extract_access_key`] pulls the access
//! key a client presents out of the `Authorization` header or query string;
//! resolving it to a caller is the handler's business.

use std::convert::Infallible;
use std::future::Future;
use std::net::IpAddr;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::service::Service;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use stratus_s3_model::error::{S3Error, S3ErrorCode};

use crate::body::S3ResponseBody;
use crate::dispatch::{S3Handler, dispatch_operation};
use crate::request::query_param;
use crate::response::error_to_response;
use crate::router::S3Router;

/// Path answered with the health payload instead of S3 dispatch.
const HEALTH_PATH: &str = "/_stratus/health";

/// Configuration for the HTTP service.
#[derive(Debug, Clone)]
pub struct S3HttpConfig {
    /// Base domain for virtual-hosted-style requests.
    pub domain: String,
    /// Whether virtual-hosted-style bucket addressing is enabled.
    pub virtual_hosting: bool,
}

impl Default for S3HttpConfig {
    fn default() -> Self {
        Self {
            domain: "s3.localhost".to_owned(),
            virtual_hosting: true,
        }
    }
}

/// The S3 HTTP service.
///
/// Cloned once per connection; [`S3HttpService::for_peer`] stamps the peer
/// address onto the clone so policy conditions can see the source IP.
#[derive(Debug)]
pub struct S3HttpService<H: S3Handler> {
    handler: Arc<H>,
    router: S3Router,
    source_ip: Option<IpAddr>,
}

impl<H: S3Handler> S3HttpService<H> {
    /// Create a new service with the given handler and configuration.
    #[must_use]
    pub fn new(handler: H, config: &S3HttpConfig) -> Self {
        Self::from_shared(Arc::new(handler), config)
    }

    /// Create a new service from a shared handler.
    #[must_use]
    pub fn from_shared(handler: Arc<H>, config: &S3HttpConfig) -> Self {
        Self {
            handler,
            router: S3Router::new(&config.domain, config.virtual_hosting),
            source_ip: None,
        }
    }

    /// Clone of this service carrying the connection's peer address.
    #[must_use]
    pub fn for_peer(&self, peer: IpAddr) -> Self {
        Self {
            source_ip: Some(peer),
            ..self.clone()
        }
    }
}

impl<H: S3Handler> Clone for S3HttpService<H> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            router: self.router.clone(),
            source_ip: self.source_ip,
        }
    }
}

impl<H: S3Handler> Service<http::Request<Incoming>> for S3HttpService<H> {
    type Response = http::Response<S3ResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let handler = Arc::clone(&self.handler);
        let router = self.router.clone();
        let source_ip = self.source_ip;

        Box::pin(async move {
            let request_id = Uuid::new_v4().to_string();
            let response =
                process_request(req, handler.as_ref(), &router, source_ip, &request_id).await;
            Ok(add_common_headers(response, &request_id))
        })
    }
}

/// Run one request through the S3 pipeline.
async fn process_request<H: S3Handler>(
    req: http::Request<Incoming>,
    handler: &H,
    router: &S3Router,
    source_ip: Option<IpAddr>,
    request_id: &str,
) -> http::Response<S3ResponseBody> {
    let method = req.method().clone();
    let uri = req.uri().clone();
    debug!(%method, %uri, request_id, "processing request");

    if is_health_check(&method, uri.path()) {
        return health_check_response();
    }

    let mut ctx = match router.resolve(&req) {
        Ok(ctx) => ctx,
        Err(err) => {
            warn!(%method, %uri, error = %err, request_id, "failed to route request");
            return error_to_response(&err, request_id);
        }
    };
    ctx.source_ip = source_ip;

    info!(
        operation = %ctx.operation,
        bucket = ?ctx.bucket,
        key = ?ctx.key,
        request_id,
        "routed request"
    );

    let (parts, incoming) = req.into_parts();
    let body = match collect_body(incoming).await {
        Ok(body) => body,
        Err(err) => {
            error!(error = %err, request_id, "failed to collect request body");
            let s3_err = S3Error::new(S3ErrorCode::InternalError)
                .with_message("Failed to read request body");
            return error_to_response(&s3_err, request_id);
        }
    };

    match dispatch_operation(handler, parts, body, ctx, request_id.to_owned()).await {
        Ok(response) => response,
        Err(err) => {
            debug!(error = %err, request_id, "operation returned error");
            error_to_response(&err, request_id)
        }
    }
}

/// Collect the full body into `Bytes`. Streaming backpressure stays inside
/// hyper; the gateway operates on buffered payloads.
async fn collect_body(incoming: Incoming) -> Result<Bytes, hyper::Error> {
    let collected = incoming.collect().await?;
    Ok(collected.to_bytes())
}

/// Pull the caller's access key out of the request, without verifying any
/// signature.
///
/// Recognized carriers, in order: an `AWS4-HMAC-SHA256` Authorization
/// header (the `Credential=` scope), a legacy `AWS AKID:signature` header,
/// and the `AWSAccessKeyId` query parameter.
#[must_use]
pub fn extract_access_key(
    parts: &http::request::Parts,
    query_params: &[(String, String)],
) -> Option<String> {
    if let Some(auth) = parts
        .headers
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        if auth.starts_with("AWS4-HMAC-SHA256") {
            if let Some(idx) = auth.find("Credential=") {
                let scope = &auth[idx + "Credential=".len()..];
                let akid = scope.split(['/', ',']).next().unwrap_or("");
                if !akid.is_empty() {
                    return Some(akid.to_owned());
                }
            }
        } else if let Some(rest) = auth.strip_prefix("AWS ") {
            if let Some((akid, _signature)) = rest.split_once(':') {
                if !akid.is_empty() {
                    return Some(akid.to_owned());
                }
            }
        }
    }

    query_param(query_params, "AWSAccessKeyId").filter(|k| !k.is_empty())
}

fn is_health_check(method: &http::Method, path: &str) -> bool {
    *method == http::Method::GET && path == HEALTH_PATH
}

fn health_check_response() -> http::Response<S3ResponseBody> {
    http::Response::builder()
        .status(http::StatusCode::OK)
        .header(http::header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
        .body(S3ResponseBody::from_string(
            r#"{"status":"running","service":"stratus"}"#,
        ))
        .expect("static health response should be valid")
}

/// Stamp the common headers onto every response.
fn add_common_headers(
    mut response: http::Response<S3ResponseBody>,
    request_id: &str,
) -> http::Response<S3ResponseBody> {
    let headers = response.headers_mut();

    if let Ok(hv) = http::header::HeaderValue::from_str(request_id) {
        headers.insert("x-amz-request-id", hv.clone());
        headers.insert("x-amz-id-2", hv);
    }
    headers.insert(
        http::header::SERVER,
        http::header::HeaderValue::from_static("Stratus"),
    );

    response
}
