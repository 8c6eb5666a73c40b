//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all proxy handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Build a RouteRequest and RequestContext per inbound request
//! - Resolve through the loopback resolver and dispatch tees
//! - Synthesise shunt responses or forward to upstream backends
//! - Observability (metrics, correlation IDs)

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::error::{RouteError, TransportError};
use crate::observability::metrics;
use crate::proxy::{build_upstream_request, HyperTransport, TeeDuplicator, Transport, X_REQUEST_ID};
use crate::routing::{
    Backend, LoopbackResolver, PredicateRegistry, RequestContext, RouteRequest, Router as RouteTable,
};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<LoopbackResolver>,
    pub tees: Arc<TeeDuplicator>,
    pub transport: Arc<dyn Transport>,
    pub max_body_size: usize,
}

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    rejected: Vec<RouteError>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Self {
        let transport = HyperTransport::new(
            Duration::from_secs(config.timeouts.connect_secs),
            Duration::from_secs(config.timeouts.request_secs),
        );
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a server that dispatches upstream calls through `transport`.
    pub fn with_transport(config: ProxyConfig, transport: Arc<dyn Transport>) -> Self {
        Self::with_registry(config, PredicateRegistry::with_builtins(), transport)
    }

    /// Create a server whose routes compile against `registry`, so custom
    /// predicates can sit next to (or replace) the built-ins.
    pub fn with_registry(
        config: ProxyConfig,
        registry: PredicateRegistry,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let (table, rejected) = RouteTable::compile(&config.routes, &registry);

        let resolver = Arc::new(LoopbackResolver::new(
            Arc::new(table),
            config.routing.max_loopbacks,
        ));
        let tees = Arc::new(TeeDuplicator::new(
            resolver.clone(),
            transport.clone(),
            Duration::from_secs(config.routing.tee_timeout_secs),
        ));

        let state = AppState {
            resolver,
            tees,
            transport,
            max_body_size: config.security.max_body_size,
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            rejected,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.config.routes.len().saturating_sub(self.rejected.len()),
            rejected = self.rejected.len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// The fully layered Axum router, for embedding or in-process tests.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Routes dropped at compile time, with the reason for each.
    pub fn rejected_routes(&self) -> &[RouteError] {
        &self.rejected
    }
}

/// Main proxy handler.
/// Resolves the route chain, fires tees, then shunts or forwards.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let (parts, body) = request.into_parts();
    let method_str = parts.method.to_string();

    let body = match read_body(body, state.max_body_size).await {
        Ok(bytes) => bytes,
        Err(status) => {
            tracing::warn!(request_id = %request_id, status = status.as_u16(), "Request body rejected");
            metrics::record_request(&method_str, status.as_u16(), "none", start_time);
            return status.into_response();
        }
    };

    let route_request = RouteRequest::from_parts(parts.method, &parts.uri, parts.headers, body);
    let ctx = RequestContext::new(request_id.clone());

    tracing::debug!(
        request_id = %request_id,
        method = %method_str,
        path = %route_request.path(),
        "Routing request"
    );

    let mut resolution = match state.resolver.resolve(route_request, &ctx) {
        Ok(resolution) => resolution,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Routing failed");
            for tee in e.tees {
                tracing::debug!(request_id = %request_id, tag = %tee.tag, "Dispatching tee duplicate");
                state.tees.dispatch(tee, &ctx);
            }
            let status = e.error.status_code();
            metrics::record_request(&method_str, status.as_u16(), "none", start_time);
            return (status, e.error.to_string()).into_response();
        }
    };

    for tee in std::mem::take(&mut resolution.tees) {
        tracing::debug!(request_id = %request_id, tag = %tee.tag, "Dispatching tee duplicate");
        state.tees.dispatch(tee, &ctx);
    }

    let route_name = resolution.route.name().to_string();
    let response = match resolution.route.backend() {
        Backend::Shunt => {
            let mut response = Response::new(Body::empty());
            *response.status_mut() = StatusCode::NOT_FOUND;
            response
        }
        Backend::Network(url) => {
            let sent = match build_upstream_request(&resolution.request, url, &request_id) {
                Ok(upstream) => state.transport.send(upstream).await,
                Err(e) => Err(e),
            };
            match sent {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!(request_id = %request_id, route = %route_name, error = %e, "Upstream error");
                    let status = match e {
                        TransportError::Timeout => StatusCode::GATEWAY_TIMEOUT,
                        _ => StatusCode::BAD_GATEWAY,
                    };
                    metrics::record_request(&method_str, status.as_u16(), &route_name, start_time);
                    return (status, "Upstream request failed").into_response();
                }
            }
        }
        Backend::Loopback => {
            tracing::error!(request_id = %request_id, route = %route_name, "Resolution ended on a loopback route");
            metrics::record_request(&method_str, 500, &route_name, start_time);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let (mut parts, body) = response.into_parts();
    resolution.apply_response(&mut parts);

    tracing::debug!(
        request_id = %request_id,
        route = %route_name,
        loopbacks = resolution.loopbacks(),
        status = parts.status.as_u16(),
        "Request complete"
    );
    metrics::record_request(&method_str, parts.status.as_u16(), &route_name, start_time);

    Response::from_parts(parts, body)
}

/// Buffer the request body. 413 past `limit`, 400 for any other read error.
async fn read_body(body: Body, limit: usize) -> Result<Bytes, StatusCode> {
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => Err(StatusCode::PAYLOAD_TOO_LARGE),
        Err(e) => {
            tracing::debug!(error = %e, "Failed to read request body");
            Err(StatusCode::BAD_REQUEST)
        }
    }
}
