//! Path predicates.
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - Paths are compared in canonical form (rooted, no trailing slash)
//! - No regex to guarantee O(n) matching

use crate::error::ArgumentError;
use crate::predicates::{PATH_NAME, PATH_PREFIX_NAME};
use crate::routing::context::RequestContext;
use crate::routing::predicate::{expect_args, string_arg, Arg, Predicate, PredicateSpec};
use crate::routing::request::{normalize_path, RouteRequest};

/// `Path("/exact")`
#[derive(Debug, Clone, Copy, Default)]
pub struct PathSpec;

/// `PathPrefix("/api")`
#[derive(Debug, Clone, Copy, Default)]
pub struct PathPrefixSpec;

/// Matches the request path exactly.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    path: String,
}

impl PathMatcher {
    pub fn new(path: &str) -> Self {
        Self {
            path: normalize_path(path).into_owned(),
        }
    }
}

impl Predicate for PathMatcher {
    fn matches(&self, request: &RouteRequest, _ctx: &RequestContext) -> bool {
        normalize_path(request.path()) == self.path
    }
}

/// Matches the request path prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Predicate for PathPrefixMatcher {
    fn matches(&self, request: &RouteRequest, _ctx: &RequestContext) -> bool {
        request.path().starts_with(&self.prefix)
    }
}

fn path_argument<'a>(name: &str, args: &'a [Arg]) -> Result<&'a str, ArgumentError> {
    expect_args(name, args, 1)?;
    let path = string_arg(name, args, 0)?;
    if !path.starts_with('/') {
        return Err(ArgumentError::range(name, "path must start with '/'"));
    }
    Ok(path)
}

impl PredicateSpec for PathSpec {
    fn name(&self) -> &str {
        PATH_NAME
    }

    fn weight(&self) -> i32 {
        100
    }

    fn create(&self, args: &[Arg]) -> Result<Box<dyn Predicate>, ArgumentError> {
        let path = path_argument(PATH_NAME, args)?;
        Ok(Box::new(PathMatcher::new(path)))
    }
}

impl PredicateSpec for PathPrefixSpec {
    fn name(&self) -> &str {
        PATH_PREFIX_NAME
    }

    fn weight(&self) -> i32 {
        50
    }

    fn create(&self, args: &[Arg]) -> Result<Box<dyn Predicate>, ArgumentError> {
        let prefix = path_argument(PATH_PREFIX_NAME, args)?;
        Ok(Box::new(PathPrefixMatcher::new(prefix)))
    }
}
