//! Host, method and header predicates.
//!
//! # Design Decisions
//! - Host matching is case-insensitive (per HTTP spec), port is ignored
//! - IPv6 literals keep their brackets: `[::1]:8080` has host `[::1]`
//! - Header values are compared exactly; names are case-insensitive
//! - Methods are compared by their canonical upper-case form

use axum::http::{HeaderName, HeaderValue, Method};

use crate::error::ArgumentError;
use crate::predicates::{HEADER_NAME, HOST_NAME, METHOD_NAME};
use crate::routing::context::RequestContext;
use crate::routing::predicate::{expect_args, string_arg, Arg, Predicate, PredicateSpec};
use crate::routing::request::RouteRequest;

#[derive(Debug, Clone, Copy, Default)]
pub struct HostSpec;

#[derive(Debug, Clone, Copy, Default)]
pub struct MethodSpec;

#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderSpec;

/// Matches the Host header.
#[derive(Debug, Clone)]
pub struct HostMatcher {
    expected_host: String,
}

impl HostMatcher {
    /// The host is normalized to lowercase for case-insensitive matching.
    /// A bare IPv6 address is bracketed to match the Host header form.
    pub fn new(host: impl Into<String>) -> Self {
        let host = host.into().to_lowercase();
        let expected_host = if host.contains(':') && !host.starts_with('[') {
            format!("[{host}]")
        } else {
            host
        };
        Self { expected_host }
    }
}

/// Host part of a Host header value, without the port.
fn strip_port(authority: &str) -> &str {
    if authority.starts_with('[') {
        match authority.find(']') {
            Some(end) => &authority[..=end],
            None => authority,
        }
    } else {
        authority.split(':').next().unwrap_or(authority)
    }
}

impl Predicate for HostMatcher {
    fn matches(&self, request: &RouteRequest, _ctx: &RequestContext) -> bool {
        request
            .headers()
            .get("host")
            .and_then(|h| h.to_str().ok())
            .map(|h| strip_port(h).eq_ignore_ascii_case(&self.expected_host))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone)]
struct MethodMatcher {
    method: Method,
}

impl Predicate for MethodMatcher {
    fn matches(&self, request: &RouteRequest, _ctx: &RequestContext) -> bool {
        *request.method() == self.method
    }
}

#[derive(Debug, Clone)]
struct HeaderMatcher {
    name: HeaderName,
    value: HeaderValue,
}

impl Predicate for HeaderMatcher {
    fn matches(&self, request: &RouteRequest, _ctx: &RequestContext) -> bool {
        request
            .headers()
            .get_all(&self.name)
            .iter()
            .any(|v| *v == self.value)
    }
}

impl PredicateSpec for HostSpec {
    fn name(&self) -> &str {
        HOST_NAME
    }

    fn weight(&self) -> i32 {
        20
    }

    fn create(&self, args: &[Arg]) -> Result<Box<dyn Predicate>, ArgumentError> {
        expect_args(HOST_NAME, args, 1)?;
        let host = string_arg(HOST_NAME, args, 0)?;
        if host.is_empty() {
            return Err(ArgumentError::range(HOST_NAME, "host must not be empty"));
        }
        Ok(Box::new(HostMatcher::new(host)))
    }
}

impl PredicateSpec for MethodSpec {
    fn name(&self) -> &str {
        METHOD_NAME
    }

    fn weight(&self) -> i32 {
        10
    }

    fn create(&self, args: &[Arg]) -> Result<Box<dyn Predicate>, ArgumentError> {
        expect_args(METHOD_NAME, args, 1)?;
        let raw = string_arg(METHOD_NAME, args, 0)?;
        let method = Method::from_bytes(raw.to_ascii_uppercase().as_bytes())
            .map_err(|_| ArgumentError::range(METHOD_NAME, format!("invalid method '{raw}'")))?;
        Ok(Box::new(MethodMatcher { method }))
    }
}

impl PredicateSpec for HeaderSpec {
    fn name(&self) -> &str {
        HEADER_NAME
    }

    fn weight(&self) -> i32 {
        5
    }

    fn create(&self, args: &[Arg]) -> Result<Box<dyn Predicate>, ArgumentError> {
        expect_args(HEADER_NAME, args, 2)?;
        let name = string_arg(HEADER_NAME, args, 0)?;
        let value = string_arg(HEADER_NAME, args, 1)?;

        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ArgumentError::range(HEADER_NAME, format!("invalid header name '{name}'")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| ArgumentError::range(HEADER_NAME, "invalid header value"))?;
        Ok(Box::new(HeaderMatcher { name, value }))
    }
}
