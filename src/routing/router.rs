//! Route lookup.
//!
//! # Responsibilities
//! - Store compiled routes
//! - Look up matching route for request
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Routes ranked once: priority, then specificity, then declaration order
//! - O(n) scan in rank order, first match wins
//! - Explicit NoMatch rather than silent default

use std::collections::HashSet;
use std::sync::Arc;

use crate::config::RouteConfig;
use crate::error::RouteError;
use crate::observability::metrics;
use crate::routing::context::RequestContext;
use crate::routing::registry::PredicateRegistry;
use crate::routing::request::RouteRequest;
use crate::routing::route::Route;

#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Arc<Route>>,
}

impl Router {
    /// Build a router from already compiled routes, given in declaration order.
    pub fn new(routes: Vec<Route>) -> Self {
        let mut routes: Vec<Arc<Route>> = routes.into_iter().map(Arc::new).collect();
        // stable sort keeps declaration order among equals
        routes.sort_by(|a, b| {
            b.priority()
                .cmp(&a.priority())
                .then_with(|| b.specificity().cmp(&a.specificity()))
        });
        Self { routes }
    }

    /// Compile route definitions, rejecting invalid ones individually.
    ///
    /// Returns the router over every valid route and the errors of the
    /// rejected ones.
    pub fn compile(configs: &[RouteConfig], registry: &PredicateRegistry) -> (Self, Vec<RouteError>) {
        let mut seen = HashSet::new();
        let mut routes = Vec::with_capacity(configs.len());
        let mut errors = Vec::new();

        for config in configs {
            if !seen.insert(config.name.as_str()) {
                errors.push(RouteError::DuplicateRoute(config.name.clone()));
                continue;
            }
            match Route::compile(config, registry) {
                Ok(route) => routes.push(route),
                Err(e) => errors.push(e),
            }
        }

        for err in &errors {
            tracing::warn!(error = %err, "Route rejected");
            metrics::record_route_rejected();
        }

        let router = Self::new(routes);
        tracing::info!(
            routes = router.len(),
            rejected = errors.len(),
            "Routing table compiled"
        );
        (router, errors)
    }

    /// Highest-ranked route whose predicates all match.
    pub fn match_request(&self, request: &RouteRequest, ctx: &RequestContext) -> Option<&Arc<Route>> {
        self.routes.iter().find(|route| route.matches(request, ctx))
    }

    /// Routes in rank order.
    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
