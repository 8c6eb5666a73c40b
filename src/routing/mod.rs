//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path, headers) + RequestContext
//!     → router.rs (rank-ordered scan)
//!     → route.rs (AND of predicates, heaviest first)
//!     → predicate.rs (Predicate::matches per condition)
//!     → loopback.rs (filters, re-entry on <loopback>)
//!     → Return: Resolution or ResolveError (RoutingError + pending tees)
//!
//! Route Compilation (at startup):
//!     RouteConfig[]
//!     → registry.rs (predicate name → PredicateSpec)
//!     → PredicateSpec::create (argument validation)
//!     → Rank by priority, specificity, declaration order
//!     → Freeze as immutable Router
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path
//! - Deterministic: same request and same draw always match the same route
//! - Per-request state lives only in RequestContext

pub mod context;
pub mod loopback;
pub mod predicate;
pub mod registry;
pub mod request;
pub mod route;
pub mod router;

pub use context::{RandomSource, RequestContext, RANDOM_VALUE_KEY};
pub use loopback::{LoopbackResolver, Resolution, ResolveError, DEFAULT_MAX_LOOPBACKS};
pub use predicate::{Arg, Predicate, PredicateSpec};
pub use registry::PredicateRegistry;
pub use request::RouteRequest;
pub use route::{Backend, Route};
pub use router::Router;
