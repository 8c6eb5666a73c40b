//! Backend dispatch.
//!
//! # Responsibilities
//! - Turn a resolved `RouteRequest` into an upstream HTTP request
//! - Send it through a pooled hyper-util client under a deadline
//!
//! # Design Decisions
//! - `Transport` is a trait so the tee path and tests can swap the client
//! - Scheme and authority come from the backend URL; path and query come
//!   from the (possibly rewritten) request
//! - `x-request-id` is always forwarded

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, HeaderValue, Request, Response, Uri};
use futures_util::future::BoxFuture;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use url::{Position, Url};

use crate::error::TransportError;
use crate::routing::RouteRequest;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Sends a fully built request to an upstream and yields its response.
pub trait Transport: Send + Sync {
    fn send(&self, request: Request<Body>) -> BoxFuture<'static, Result<Response<Body>, TransportError>>;
}

/// `Transport` backed by the hyper-util legacy client.
#[derive(Clone)]
pub struct HyperTransport {
    client: Client<HttpConnector, Body>,
    request_timeout: Duration,
}

impl HyperTransport {
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(connect_timeout));

        let client = Client::builder(TokioExecutor::new()).build(connector);
        Self {
            client,
            request_timeout,
        }
    }
}

impl Transport for HyperTransport {
    fn send(&self, request: Request<Body>) -> BoxFuture<'static, Result<Response<Body>, TransportError>> {
        let client = self.client.clone();
        let deadline = self.request_timeout;

        Box::pin(async move {
            let response = tokio::time::timeout(deadline, client.request(request))
                .await
                .map_err(|_| TransportError::Timeout)?
                .map_err(|e| TransportError::Request(e.to_string()))?;

            let (parts, body) = response.into_parts();
            Ok(Response::from_parts(parts, Body::new(body)))
        })
    }
}

/// Build the upstream request for `request` against `backend`.
///
/// A non-root path on the backend URL is used as a prefix.
pub fn build_upstream_request(
    request: &RouteRequest,
    backend: &Url,
    request_id: &str,
) -> Result<Request<Body>, TransportError> {
    let prefix = backend.path().trim_end_matches('/');
    let target = format!(
        "{}://{}{}{}",
        backend.scheme(),
        &backend[Position::BeforeHost..Position::AfterPort],
        prefix,
        request.path_and_query()
    );
    let uri: Uri = target
        .parse()
        .map_err(|e: axum::http::uri::InvalidUri| TransportError::InvalidUri(format!("{target}: {e}")))?;

    let mut builder = Request::builder().method(request.method().clone()).uri(uri);
    if let Some(headers) = builder.headers_mut() {
        for (name, value) in request.headers() {
            if name != header::HOST {
                headers.append(name.clone(), value.clone());
            }
        }
        if let Ok(value) = HeaderValue::from_str(request_id) {
            headers.insert(X_REQUEST_ID, value);
        }
    }

    builder
        .body(Body::from(request.body().clone()))
        .map_err(|e| TransportError::Request(e.to_string()))
}
