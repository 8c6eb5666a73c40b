//! Route resolution with loopback re-entry.
//!
//! # Data Flow
//! ```text
//! request + context
//!     → router.match_request
//!     → filters::apply_request (may rewrite path, schedule tees)
//!     → backend == <loopback>?  yes → depth check → match again (same context)
//!                               no  → Resolution
//! ```
//!
//! # Design Decisions
//! - Iterative with an explicit depth counter, never native recursion
//! - The same context is reused by every pass, so a random draw taken before
//!   the loopback is not re-rolled after it
//! - Exceeding the depth is fatal for the request and never retried
//! - Tees scheduled before a failing pass travel with the error

use std::sync::Arc;

use axum::http::response::Parts;

use crate::error::RoutingError;
use crate::filters::{self, ResponsePatch, TeeRequest};
use crate::observability::metrics;
use crate::routing::context::RequestContext;
use crate::routing::request::RouteRequest;
use crate::routing::route::{Backend, Route};
use crate::routing::router::Router;

/// Loopbacks allowed per request before resolution fails.
pub const DEFAULT_MAX_LOOPBACKS: usize = 9;

/// Outcome of resolving a request to a terminal route.
#[derive(Debug)]
pub struct Resolution {
    /// Route with a shunt or network backend.
    pub route: Arc<Route>,
    /// Request after every pass's filters ran.
    pub request: RouteRequest,
    /// Names of every route visited, outermost first.
    pub visited: Vec<String>,
    /// Tee duplicates requested along the way.
    pub tees: Vec<TeeRequest>,
    patches: Vec<ResponsePatch>,
}

impl Resolution {
    pub fn loopbacks(&self) -> usize {
        self.visited.len() - 1
    }

    /// Apply response-side filter effects: innermost route first, so the
    /// outermost route has the last word.
    pub fn apply_response(&self, parts: &mut Parts) {
        for patch in self.patches.iter().rev() {
            patch.apply(parts);
        }
    }
}

/// A failed resolution, with the tee duplicates scheduled before the failure.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct ResolveError {
    pub error: RoutingError,
    pub tees: Vec<TeeRequest>,
}

/// Resolves requests against a router, following loopback backends.
#[derive(Debug, Clone)]
pub struct LoopbackResolver {
    router: Arc<Router>,
    max_loopbacks: usize,
}

impl LoopbackResolver {
    pub fn new(router: Arc<Router>, max_loopbacks: usize) -> Self {
        Self {
            router,
            max_loopbacks,
        }
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    pub fn max_loopbacks(&self) -> usize {
        self.max_loopbacks
    }

    pub fn resolve(
        &self,
        mut request: RouteRequest,
        ctx: &RequestContext,
    ) -> Result<Resolution, ResolveError> {
        let mut depth = 0;
        let mut visited = Vec::new();
        let mut tees = Vec::new();
        let mut patches = Vec::new();

        loop {
            let Some(route) = self.router.match_request(&request, ctx).cloned() else {
                return Err(ResolveError {
                    error: RoutingError::NoRouteMatched {
                        path: request.path().to_string(),
                    },
                    tees,
                });
            };

            tracing::debug!(
                request_id = %ctx.request_id(),
                route = %route.name(),
                path = %request.path(),
                depth,
                "Route matched"
            );

            let outcome = filters::apply_request(route.filters(), &mut request, ctx);
            patches.push(outcome.response);
            tees.extend(outcome.tees);
            visited.push(route.name().to_string());

            if *route.backend() != Backend::Loopback {
                return Ok(Resolution {
                    route,
                    request,
                    visited,
                    tees,
                    patches,
                });
            }

            if depth >= self.max_loopbacks {
                tracing::warn!(
                    request_id = %ctx.request_id(),
                    route = %route.name(),
                    max = self.max_loopbacks,
                    "Loopback depth exceeded"
                );
                return Err(ResolveError {
                    error: RoutingError::LoopbackDepthExceeded {
                        max: self.max_loopbacks,
                        route: route.name().to_string(),
                    },
                    tees,
                });
            }

            depth += 1;
            metrics::record_loopback(route.name());
        }
    }
}
