//! Constant predicates.
//!
//! `True()` is mostly used to raise a route's specificity above an otherwise
//! equivalent route; `False()` disables a route without deleting it.

use crate::error::ArgumentError;
use crate::predicates::{FALSE_NAME, TRUE_NAME};
use crate::routing::context::RequestContext;
use crate::routing::predicate::{expect_args, Arg, Predicate, PredicateSpec};
use crate::routing::request::RouteRequest;

#[derive(Debug, Clone, Copy, Default)]
pub struct TrueSpec;

#[derive(Debug, Clone, Copy, Default)]
pub struct FalseSpec;

#[derive(Debug, Clone, Copy)]
struct Constant(bool);

impl Predicate for Constant {
    fn matches(&self, _request: &RouteRequest, _ctx: &RequestContext) -> bool {
        self.0
    }
}

impl PredicateSpec for TrueSpec {
    fn name(&self) -> &str {
        TRUE_NAME
    }

    fn weight(&self) -> i32 {
        1
    }

    fn create(&self, args: &[Arg]) -> Result<Box<dyn Predicate>, ArgumentError> {
        expect_args(TRUE_NAME, args, 0)?;
        Ok(Box::new(Constant(true)))
    }
}

impl PredicateSpec for FalseSpec {
    fn name(&self) -> &str {
        FALSE_NAME
    }

    fn weight(&self) -> i32 {
        1
    }

    fn create(&self, args: &[Arg]) -> Result<Box<dyn Predicate>, ArgumentError> {
        expect_args(FALSE_NAME, args, 0)?;
        Ok(Box::new(Constant(false)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    #[test]
    fn test_constants() {
        let req = RouteRequest::new(Method::GET, "/");
        let ctx = RequestContext::new("test");

        assert!(TrueSpec.create(&[]).unwrap().matches(&req, &ctx));
        assert!(!FalseSpec.create(&[]).unwrap().matches(&req, &ctx));
        assert!(TrueSpec.create(&[Arg::from(1.0)]).is_err());
    }
}
