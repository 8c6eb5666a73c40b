//! `Tee("tag")` matches only tee duplicates created by `teeLoopback("tag")`.

use crate::error::ArgumentError;
use crate::predicates::TEE_NAME;
use crate::routing::context::RequestContext;
use crate::routing::predicate::{expect_args, string_arg, Arg, Predicate, PredicateSpec};
use crate::routing::request::RouteRequest;

#[derive(Debug, Clone, Copy, Default)]
pub struct TeeSpec;

#[derive(Debug, Clone)]
struct TeeMatcher {
    tag: String,
}

impl Predicate for TeeMatcher {
    fn matches(&self, _request: &RouteRequest, ctx: &RequestContext) -> bool {
        ctx.tee_tag() == Some(self.tag.as_str())
    }
}

impl PredicateSpec for TeeSpec {
    fn name(&self) -> &str {
        TEE_NAME
    }

    fn weight(&self) -> i32 {
        5
    }

    fn create(&self, args: &[Arg]) -> Result<Box<dyn Predicate>, ArgumentError> {
        expect_args(TEE_NAME, args, 1)?;
        let tag = string_arg(TEE_NAME, args, 0)?;
        if tag.is_empty() {
            return Err(ArgumentError::range(TEE_NAME, "tag must not be empty"));
        }
        Ok(Box::new(TeeMatcher {
            tag: tag.to_string(),
        }))
    }
}
