//! Traffic segmentation.
//!
//! `TrafficSegment(min, max)` matches the fraction `max - min` of requests.
//! The interval is half-open, `[min, max)`, so adjacent segments such as
//! `[0, 0.5)` and `[0.5, 0.8)` partition traffic without overlap. The draw
//! comes from the request context and is shared by every segment evaluated
//! for the same request.

use crate::error::ArgumentError;
use crate::predicates::TRAFFIC_SEGMENT_NAME;
use crate::routing::context::RequestContext;
use crate::routing::predicate::{expect_args, number_arg, Arg, Predicate, PredicateSpec};
use crate::routing::request::RouteRequest;

#[derive(Debug, Clone, Copy, Default)]
pub struct TrafficSegmentSpec;

#[derive(Debug, Clone, Copy)]
struct TrafficSegment {
    min: f64,
    max: f64,
}

impl PredicateSpec for TrafficSegmentSpec {
    fn name(&self) -> &str {
        TRAFFIC_SEGMENT_NAME
    }

    fn weight(&self) -> i32 {
        -1
    }

    fn create(&self, args: &[Arg]) -> Result<Box<dyn Predicate>, ArgumentError> {
        expect_args(TRAFFIC_SEGMENT_NAME, args, 2)?;
        let min = number_arg(TRAFFIC_SEGMENT_NAME, args, 0)?;
        let max = number_arg(TRAFFIC_SEGMENT_NAME, args, 1)?;

        // NaN fails every comparison below, hence the negated form
        if !(0.0 <= min && min <= max && max <= 1.0) {
            return Err(ArgumentError::range(
                TRAFFIC_SEGMENT_NAME,
                format!("requires 0 <= min <= max <= 1, got min={min} max={max}"),
            ));
        }

        Ok(Box::new(TrafficSegment { min, max }))
    }
}

impl Predicate for TrafficSegment {
    fn matches(&self, _request: &RouteRequest, ctx: &RequestContext) -> bool {
        let r = ctx.random_value();
        // min == max is an empty interval
        self.min <= r && r < self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::sync::Mutex;

    fn segment(min: f64, max: f64) -> Box<dyn Predicate> {
        TrafficSegmentSpec
            .create(&[Arg::Number(min), Arg::Number(max)])
            .unwrap()
    }

    fn matches_with(p: &dyn Predicate, r: f64) -> bool {
        let ctx = RequestContext::new("test").with_random_source(move || r);
        p.matches(&RouteRequest::new(Method::GET, "/"), &ctx)
    }

    #[test]
    fn test_invalid_create_arguments() {
        let cases: Vec<Vec<Arg>> = vec![
            vec![],
            vec![Arg::from(1.0)],
            vec![Arg::from(1.0), Arg::from(0.0)],
            vec![Arg::from(0.0), Arg::from(1.1)],
            vec![Arg::from(1.0), Arg::from(2.0)],
            vec![Arg::from(0.0), Arg::from("1")],
            vec![Arg::from("0"), Arg::from(1.0)],
            vec![Arg::from(-0.1), Arg::from(0.5)],
            vec![Arg::from(0.0), Arg::from(0.5), Arg::from(1.0)],
            vec![Arg::from(f64::NAN), Arg::from(0.5)],
        ];

        for args in cases {
            assert!(
                TrafficSegmentSpec.create(&args).is_err(),
                "expected error for {args:?}"
            );
        }
    }

    #[test]
    fn test_error_kinds() {
        assert!(matches!(
            TrafficSegmentSpec.create(&[Arg::from(1.0)]),
            Err(ArgumentError::Count { expected: 2, got: 1, .. })
        ));
        assert!(matches!(
            TrafficSegmentSpec.create(&[Arg::from("0"), Arg::from(1.0)]),
            Err(ArgumentError::Type { index: 0, .. })
        ));
        assert!(matches!(
            TrafficSegmentSpec.create(&[Arg::from(0.0), Arg::from(1.1)]),
            Err(ArgumentError::Range { .. })
        ));
    }

    #[test]
    fn test_match_half_open_interval() {
        let p = segment(0.0, 0.5);

        assert!(matches_with(p.as_ref(), 0.0));
        assert!(matches_with(p.as_ref(), 0.1));
        assert!(matches_with(p.as_ref(), 0.49));

        // upper boundary is excluded
        assert!(!matches_with(p.as_ref(), 0.5));
        assert!(!matches_with(p.as_ref(), 0.6));
        assert!(!matches_with(p.as_ref(), 1.0));
    }

    #[test]
    fn test_lower_bound_inclusive() {
        let p = segment(0.5, 0.8);
        assert!(!matches_with(p.as_ref(), 0.4999));
        assert!(matches_with(p.as_ref(), 0.5));
        assert!(!matches_with(p.as_ref(), 0.8));
    }

    #[test]
    fn test_min_equals_max_never_matches() {
        let p = segment(0.5, 0.5);

        assert!(!matches_with(p.as_ref(), 0.0));
        assert!(!matches_with(p.as_ref(), 0.5));
        assert!(!matches_with(p.as_ref(), 1.0));
    }

    #[test]
    fn test_spec_metadata() {
        assert_eq!(TrafficSegmentSpec.name(), "TrafficSegment");
        assert_eq!(TrafficSegmentSpec.weight(), -1);
    }

    #[test]
    fn test_adjacent_segments_partition() {
        let segments = [segment(0.0, 0.5), segment(0.5, 0.8), segment(0.8, 1.0)];
        let rng = std::sync::Arc::new(Mutex::new(StdRng::seed_from_u64(7)));
        let mut counts = [0usize; 3];

        const N: usize = 10_000;
        for _ in 0..N {
            let rng = rng.clone();
            let ctx = RequestContext::new("split")
                .with_random_source(move || rng.lock().unwrap().gen::<f64>());
            let req = RouteRequest::new(Method::GET, "/test");

            let hits: Vec<usize> = (0..3)
                .filter(|&i| segments[i].matches(&req, &ctx))
                .collect();
            assert_eq!(hits.len(), 1, "exactly one segment per request");
            counts[hits[0]] += 1;
        }

        let expected = [0.5, 0.3, 0.2];
        for (count, share) in counts.iter().zip(expected) {
            let observed = *count as f64 / N as f64;
            assert!((observed - share).abs() < 0.03, "{counts:?}");
        }
    }
}
