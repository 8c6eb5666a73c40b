//! Per-request context.
//!
//! # Responsibilities
//! - Carry the request ID for log correlation
//! - Provide the request's random draw to probabilistic predicates
//! - Hold request-scoped decisions in a keyed state bag
//! - Mark tee duplicates so they cannot tee again
//!
//! # Design Decisions
//! - The random source is injected per context, never swapped globally
//! - A request draws at most once: the first `random_value()` call caches the
//!   draw, so every segment predicate of every route sees the same value and
//!   adjacent segments cannot overlap or leave gaps
//! - Loopback passes reuse the context; tee duplicates fork it

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;

/// Source of uniform values in `[0, 1)`.
pub type RandomSource = Arc<dyn Fn() -> f64 + Send + Sync>;

type StateValue = Arc<dyn Any + Send + Sync>;

/// State key under which the request's random draw is cached.
pub const RANDOM_VALUE_KEY: &str = "traffic.random_value";

/// Mutable, request-scoped state shared by all routing passes of one request.
pub struct RequestContext {
    request_id: String,
    random_source: RandomSource,
    state: DashMap<&'static str, StateValue>,
    tee_tag: Option<String>,
}

impl RequestContext {
    /// Create a context drawing from the process-wide generator.
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            random_source: Arc::new(fastrand::f64),
            state: DashMap::new(),
            tee_tag: None,
        }
    }

    /// Replace the random source for this request only.
    pub fn with_random_source<F>(mut self, source: F) -> Self
    where
        F: Fn() -> f64 + Send + Sync + 'static,
    {
        self.random_source = Arc::new(source);
        self
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Tag of the tee this context belongs to, if it is a tee duplicate.
    pub fn tee_tag(&self) -> Option<&str> {
        self.tee_tag.as_deref()
    }

    pub fn is_tee(&self) -> bool {
        self.tee_tag.is_some()
    }

    /// The request's random draw. Drawn on first use, then stable.
    pub fn random_value(&self) -> f64 {
        let source = &self.random_source;
        self.get_or_insert_with(RANDOM_VALUE_KEY, || source())
            .unwrap_or_else(|| source())
    }

    /// Return the value stored under `key`, storing `init()` first if absent.
    ///
    /// Returns `None` only when the key already holds a value of another type.
    /// `init` runs without any map lock held, so it may use this context. If
    /// another caller stores the key first, its value wins.
    pub fn get_or_insert_with<T, F>(&self, key: &'static str, init: F) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        let existing = self.state.get(key).map(|v| v.value().clone());
        let value = match existing {
            Some(value) => value,
            None => {
                let fresh = Arc::new(init()) as StateValue;
                self.state.entry(key).or_insert(fresh).value().clone()
            }
        };
        value.downcast_ref::<T>().cloned()
    }

    pub fn get<T>(&self, key: &'static str) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.state
            .get(key)
            .and_then(|v| v.value().downcast_ref::<T>().cloned())
    }

    pub fn insert<T>(&self, key: &'static str, value: T)
    where
        T: Send + Sync + 'static,
    {
        self.state.insert(key, Arc::new(value));
    }

    /// Derive the context of a tee duplicate.
    ///
    /// Keeps the request ID and random source; the state bag starts empty so
    /// the duplicate is matched as an independent request.
    pub fn fork_for_tee(&self, tag: impl Into<String>) -> Self {
        Self {
            request_id: self.request_id.clone(),
            random_source: self.random_source.clone(),
            state: DashMap::new(),
            tee_tag: Some(tag.into()),
        }
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_id", &self.request_id)
            .field("state_keys", &self.state.len())
            .field("tee_tag", &self.tee_tag)
            .finish()
    }
}
