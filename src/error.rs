//! Error taxonomy.
//!
//! # Design Decisions
//! - Construction-time errors (`ArgumentError`, `RouteError`, `RegistryError`)
//!   reject a single predicate/route and never reach request handling
//! - Request-time errors (`RoutingError`) are isolated to one request
//! - `TransportError` surfaces to the primary path only for forwarded requests;
//!   tee failures are swallowed by the duplicator

use axum::http::StatusCode;

/// Invalid positional arguments passed to a predicate or filter spec.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArgumentError {
    #[error("{name}: expected {expected} argument(s), got {got}")]
    Count {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("{name}: argument {index} must be a {expected}")]
    Type {
        name: String,
        index: usize,
        expected: &'static str,
    },

    #[error("{name}: {reason}")]
    Range { name: String, reason: String },
}

impl ArgumentError {
    pub fn count(name: &str, expected: usize, got: usize) -> Self {
        Self::Count {
            name: name.to_string(),
            expected,
            got,
        }
    }

    pub fn type_mismatch(name: &str, index: usize, expected: &'static str) -> Self {
        Self::Type {
            name: name.to_string(),
            index,
            expected,
        }
    }

    pub fn range(name: &str, reason: impl Into<String>) -> Self {
        Self::Range {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Predicate registration failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("predicate '{0}' is already registered")]
    Duplicate(String),
}

/// Failure to compile a single route definition.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("route '{route}': unknown predicate '{name}'")]
    UnknownPredicate { route: String, name: String },

    #[error("route '{route}': unknown filter '{name}'")]
    UnknownFilter { route: String, name: String },

    #[error("route '{route}': {source}")]
    InvalidArguments {
        route: String,
        #[source]
        source: ArgumentError,
    },

    #[error("route '{route}': invalid backend '{backend}'")]
    InvalidBackend { route: String, backend: String },

    #[error("duplicate route name '{0}'")]
    DuplicateRoute(String),
}

/// Per-request routing outcome that is not a resolved route.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RoutingError {
    #[error("no route matched path {path}")]
    NoRouteMatched { path: String },

    #[error("loopback depth {max} exceeded at route '{route}'")]
    LoopbackDepthExceeded { max: usize, route: String },
}

impl RoutingError {
    /// Response status reported to the client for this outcome.
    pub fn status_code(&self) -> StatusCode {
        match self {
            RoutingError::NoRouteMatched { .. } => StatusCode::NOT_FOUND,
            RoutingError::LoopbackDepthExceeded { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Backend dispatch failure.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("upstream request failed: {0}")]
    Request(String),

    #[error("invalid upstream uri: {0}")]
    InvalidUri(String),

    #[error("upstream request timed out")]
    Timeout,
}
