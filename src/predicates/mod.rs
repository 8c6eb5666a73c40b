//! Built-in predicate specs.
//!
//! # Weights
//! ```text
//! Path            100   primary discriminator
//! PathPrefix       50
//! Host             20
//! Method           10
//! Header, Tee       5
//! True, False       1
//! TrafficSegment   -1   evaluated last, adds no specificity
//! ```

pub mod header;
pub mod path;
pub mod primitive;
pub mod tee;
pub mod traffic;

use std::sync::Arc;

use crate::routing::predicate::PredicateSpec;

pub const PATH_NAME: &str = "Path";
pub const PATH_PREFIX_NAME: &str = "PathPrefix";
pub const HOST_NAME: &str = "Host";
pub const METHOD_NAME: &str = "Method";
pub const HEADER_NAME: &str = "Header";
pub const TRUE_NAME: &str = "True";
pub const FALSE_NAME: &str = "False";
pub const TEE_NAME: &str = "Tee";
pub const TRAFFIC_SEGMENT_NAME: &str = "TrafficSegment";

pub use traffic::TrafficSegmentSpec;

/// Every built-in spec, in registration order.
pub fn builtins() -> Vec<Arc<dyn PredicateSpec>> {
    vec![
        Arc::new(path::PathSpec),
        Arc::new(path::PathPrefixSpec),
        Arc::new(header::HostSpec),
        Arc::new(header::MethodSpec),
        Arc::new(header::HeaderSpec),
        Arc::new(primitive::TrueSpec),
        Arc::new(primitive::FalseSpec),
        Arc::new(tee::TeeSpec),
        Arc::new(traffic::TrafficSegmentSpec),
    ]
}
