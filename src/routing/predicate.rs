//! Predicate abstraction.
//!
//! # Responsibilities
//! - Define the `Predicate` trait evaluated per request
//! - Define the `PredicateSpec` factory that validates route arguments
//! - Provide typed positional arguments shared with filters
//!
//! # Design Decisions
//! - Predicates are immutable after creation and shared by all requests
//! - Anything request-scoped lives in `RequestContext`, never in the predicate
//! - Argument validation happens once, at route compilation

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ArgumentError;
use crate::routing::context::RequestContext;
use crate::routing::request::RouteRequest;

/// A positional argument from a route definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Arg {
    Number(f64),
    String(String),
}

impl Arg {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Arg::Number(n) => Some(*n),
            Arg::String(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Arg::String(s) => Some(s),
            Arg::Number(_) => None,
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Number(n) => write!(f, "{n}"),
            Arg::String(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<f64> for Arg {
    fn from(n: f64) -> Self {
        Arg::Number(n)
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Arg::String(s.to_string())
    }
}

/// Fail unless exactly `expected` arguments were given.
pub fn expect_args(name: &str, args: &[Arg], expected: usize) -> Result<(), ArgumentError> {
    if args.len() != expected {
        return Err(ArgumentError::count(name, expected, args.len()));
    }
    Ok(())
}

/// Numeric argument at `index`. String numerals are rejected.
pub fn number_arg(name: &str, args: &[Arg], index: usize) -> Result<f64, ArgumentError> {
    args.get(index)
        .and_then(Arg::as_number)
        .ok_or_else(|| ArgumentError::type_mismatch(name, index, "number"))
}

pub fn string_arg<'a>(name: &str, args: &'a [Arg], index: usize) -> Result<&'a str, ArgumentError> {
    args.get(index)
        .and_then(Arg::as_str)
        .ok_or_else(|| ArgumentError::type_mismatch(name, index, "string"))
}

/// Boolean condition over a request and its context.
pub trait Predicate: Send + Sync + fmt::Debug {
    /// Returns true if the request satisfies this condition.
    fn matches(&self, request: &RouteRequest, ctx: &RequestContext) -> bool;
}

/// Named factory producing predicates from route arguments.
pub trait PredicateSpec: Send + Sync {
    /// Keyword used in route definitions.
    fn name(&self) -> &str;

    /// Evaluation-order and specificity hint. Negative means evaluate last
    /// and add nothing to a route's specificity.
    fn weight(&self) -> i32 {
        0
    }

    /// Validate `args` and build the predicate.
    fn create(&self, args: &[Arg]) -> Result<Box<dyn Predicate>, ArgumentError>;
}
