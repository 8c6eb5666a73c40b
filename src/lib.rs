//! Traffic-splitting HTTP proxy library.
//!
//! Routes are compiled from configuration into an immutable table. Each
//! request gets one random draw that every `TrafficSegment` predicate shares,
//! so adjacent segments partition traffic exactly, and loopback and tee
//! routes compose with the split.

pub mod config;
pub mod error;
pub mod filters;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod predicates;
pub mod proxy;
pub mod routing;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
