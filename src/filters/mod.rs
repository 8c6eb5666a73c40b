//! Built-in request/response filters.
//!
//! # Data Flow
//! ```text
//! Matched route
//!     → apply_request (mutate path/headers, record tee snapshots)
//!     → FilterOutcome { response patch, tee requests }
//!     → backend: shunt / network / loopback
//!     → ResponsePatch::apply on the final response
//! ```
//!
//! # Design Decisions
//! - Closed set of filters; only what loopback and tee routing need
//! - Response-side effects are recorded, not applied, until the backend answers
//! - `teeLoopback` snapshots the request at the point the filter runs

pub mod response;

use axum::http::{HeaderName, HeaderValue, StatusCode};

use crate::error::ArgumentError;
use crate::routing::context::RequestContext;
use crate::routing::predicate::{expect_args, number_arg, string_arg, Arg};
use crate::routing::request::RouteRequest;

pub use response::ResponsePatch;

pub const STATUS_NAME: &str = "status";
pub const SET_PATH_NAME: &str = "setPath";
pub const SET_REQUEST_HEADER_NAME: &str = "setRequestHeader";
pub const SET_RESPONSE_HEADER_NAME: &str = "setResponseHeader";
pub const TEE_LOOPBACK_NAME: &str = "teeLoopback";

/// A compiled filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Status(StatusCode),
    SetPath(String),
    SetRequestHeader(HeaderName, HeaderValue),
    SetResponseHeader(HeaderName, HeaderValue),
    TeeLoopback(String),
}

/// Why a filter definition could not be compiled.
#[derive(Debug)]
pub enum FilterError {
    Unknown,
    Arguments(ArgumentError),
}

impl From<ArgumentError> for FilterError {
    fn from(err: ArgumentError) -> Self {
        FilterError::Arguments(err)
    }
}

/// A request copy scheduled for duplication.
#[derive(Debug, Clone)]
pub struct TeeRequest {
    pub tag: String,
    pub request: RouteRequest,
}

/// Effects of running one route's filters.
#[derive(Debug, Default)]
pub struct FilterOutcome {
    pub response: ResponsePatch,
    pub tees: Vec<TeeRequest>,
}

impl Filter {
    /// Compile a filter from its route-definition name and arguments.
    pub fn create(name: &str, args: &[Arg]) -> Result<Self, FilterError> {
        let filter = match name {
            STATUS_NAME => {
                expect_args(name, args, 1)?;
                let code = number_arg(name, args, 0)?;
                if code.fract() != 0.0 || !(100.0..=599.0).contains(&code) {
                    return Err(ArgumentError::range(name, format!("invalid status code {code}")).into());
                }
                let status = StatusCode::from_u16(code as u16)
                    .map_err(|_| ArgumentError::range(name, format!("invalid status code {code}")))?;
                Filter::Status(status)
            }
            SET_PATH_NAME => {
                expect_args(name, args, 1)?;
                Filter::SetPath(string_arg(name, args, 0)?.to_string())
            }
            SET_REQUEST_HEADER_NAME | SET_RESPONSE_HEADER_NAME => {
                expect_args(name, args, 2)?;
                let (header, value) = header_args(name, args)?;
                if name == SET_REQUEST_HEADER_NAME {
                    Filter::SetRequestHeader(header, value)
                } else {
                    Filter::SetResponseHeader(header, value)
                }
            }
            TEE_LOOPBACK_NAME => {
                expect_args(name, args, 1)?;
                let tag = string_arg(name, args, 0)?;
                if tag.is_empty() {
                    return Err(ArgumentError::range(name, "tag must not be empty").into());
                }
                Filter::TeeLoopback(tag.to_string())
            }
            _ => return Err(FilterError::Unknown),
        };
        Ok(filter)
    }
}

fn header_args(name: &str, args: &[Arg]) -> Result<(HeaderName, HeaderValue), ArgumentError> {
    let header = string_arg(name, args, 0)?;
    let value = string_arg(name, args, 1)?;
    let header = HeaderName::from_bytes(header.as_bytes())
        .map_err(|_| ArgumentError::range(name, format!("invalid header name '{header}'")))?;
    let value = HeaderValue::from_str(value)
        .map_err(|_| ArgumentError::range(name, "invalid header value"))?;
    Ok((header, value))
}

/// Run the request side of `filters` in order.
pub fn apply_request(
    filters: &[Filter],
    request: &mut RouteRequest,
    ctx: &RequestContext,
) -> FilterOutcome {
    let mut outcome = FilterOutcome::default();

    for filter in filters {
        match filter {
            Filter::Status(status) => outcome.response.set_status(*status),
            Filter::SetPath(path) => request.set_path(path.clone()),
            Filter::SetRequestHeader(name, value) => {
                request.headers_mut().insert(name.clone(), value.clone());
            }
            Filter::SetResponseHeader(name, value) => {
                outcome.response.set_header(name.clone(), value.clone());
            }
            Filter::TeeLoopback(tag) => {
                if ctx.is_tee() {
                    tracing::debug!(
                        request_id = %ctx.request_id(),
                        tag = %tag,
                        "Skipping tee inside tee duplicate"
                    );
                    continue;
                }
                outcome.tees.push(TeeRequest {
                    tag: tag.clone(),
                    request: request.clone(),
                });
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    #[test]
    fn test_create_filters() {
        assert_eq!(
            Filter::create("status", &[Arg::from(201.0)]).unwrap(),
            Filter::Status(StatusCode::CREATED)
        );
        assert_eq!(
            Filter::create("setPath", &[Arg::from("a-loop")]).unwrap(),
            Filter::SetPath("a-loop".into())
        );
        assert!(matches!(
            Filter::create("teeLoopback", &[Arg::from("a-loop")]),
            Ok(Filter::TeeLoopback(tag)) if tag == "a-loop"
        ));
    }

    #[test]
    fn test_create_filter_errors() {
        assert!(matches!(Filter::create("nope", &[]), Err(FilterError::Unknown)));
        assert!(matches!(
            Filter::create("status", &[Arg::from("200")]),
            Err(FilterError::Arguments(ArgumentError::Type { .. }))
        ));
        assert!(Filter::create("status", &[Arg::from(99.0)]).is_err());
        assert!(Filter::create("status", &[Arg::from(200.5)]).is_err());
        assert!(Filter::create("setRequestHeader", &[Arg::from("X-A")]).is_err());
        assert!(Filter::create("teeLoopback", &[Arg::from("")]).is_err());
    }

    #[test]
    fn test_apply_request() {
        let filters = vec![
            Filter::SetRequestHeader(
                HeaderName::from_static("x-stage"),
                HeaderValue::from_static("one"),
            ),
            Filter::TeeLoopback("a-loop".into()),
            Filter::SetPath("a-loop".into()),
            Filter::Status(StatusCode::CREATED),
        ];
        let mut req = RouteRequest::new(Method::GET, "/test");
        let ctx = RequestContext::new("req-1");

        let outcome = apply_request(&filters, &mut req, &ctx);

        assert_eq!(req.path(), "/a-loop");
        assert_eq!(req.headers().get("x-stage").unwrap(), "one");
        assert_eq!(outcome.response.status(), Some(StatusCode::CREATED));
        assert_eq!(outcome.tees.len(), 1);
        // snapshot taken before setPath ran
        assert_eq!(outcome.tees[0].request.path(), "/test");
        assert_eq!(outcome.tees[0].request.headers().get("x-stage").unwrap(), "one");
    }

    #[test]
    fn test_tee_duplicates_do_not_tee_again() {
        let filters = vec![Filter::TeeLoopback("a-loop".into())];
        let mut req = RouteRequest::new(Method::GET, "/test");
        let ctx = RequestContext::new("req-1").fork_for_tee("a-loop");

        let outcome = apply_request(&filters, &mut req, &ctx);
        assert!(outcome.tees.is_empty());
    }
}
