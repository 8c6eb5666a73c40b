//! Compiled routes.
//!
//! # Responsibilities
//! - Resolve predicate/filter names against their registries
//! - Validate arguments once, at compile time
//! - Order predicates so selective ones are evaluated first
//! - Compute the specificity used to rank routes

use std::fmt;

use url::Url;

use crate::config::RouteConfig;
use crate::error::RouteError;
use crate::filters::{Filter, FilterError};
use crate::routing::context::RequestContext;
use crate::routing::predicate::Predicate;
use crate::routing::registry::PredicateRegistry;
use crate::routing::request::RouteRequest;

/// Where a matched request goes after its filters ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// Respond directly from the filter chain.
    Shunt,
    /// Re-enter route matching with the filtered request.
    Loopback,
    /// Forward to an upstream base URL.
    Network(Url),
}

impl Backend {
    /// Parse `shunt`, `loopback` (optionally in angle brackets) or an http URL.
    /// The upstream client speaks plain HTTP only, so https is refused here.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let keyword = trimmed
            .strip_prefix('<')
            .and_then(|s| s.strip_suffix('>'))
            .unwrap_or(trimmed);

        match keyword {
            "shunt" => Some(Backend::Shunt),
            "loopback" => Some(Backend::Loopback),
            _ => Url::parse(trimmed)
                .ok()
                .filter(|u| u.scheme() == "http" && u.host().is_some())
                .map(Backend::Network),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Shunt => write!(f, "<shunt>"),
            Backend::Loopback => write!(f, "<loopback>"),
            Backend::Network(url) => write!(f, "{url}"),
        }
    }
}

#[derive(Debug)]
struct CompiledPredicate {
    name: String,
    weight: i32,
    predicate: Box<dyn Predicate>,
}

/// A route ready for matching. Immutable and shared by all requests.
#[derive(Debug)]
pub struct Route {
    name: String,
    priority: u32,
    specificity: i64,
    predicates: Vec<CompiledPredicate>,
    filters: Vec<Filter>,
    backend: Backend,
}

impl Route {
    /// Compile a route definition.
    pub fn compile(config: &RouteConfig, registry: &PredicateRegistry) -> Result<Self, RouteError> {
        let mut predicates = Vec::with_capacity(config.predicates.len());
        for def in &config.predicates {
            let spec = registry
                .get(&def.name)
                .ok_or_else(|| RouteError::UnknownPredicate {
                    route: config.name.clone(),
                    name: def.name.clone(),
                })?;
            let predicate = spec
                .create(&def.args)
                .map_err(|source| RouteError::InvalidArguments {
                    route: config.name.clone(),
                    source,
                })?;
            predicates.push(CompiledPredicate {
                name: def.name.clone(),
                weight: spec.weight(),
                predicate,
            });
        }

        // Heaviest first: cheap, selective checks short-circuit the AND.
        predicates.sort_by(|a, b| b.weight.cmp(&a.weight));

        let specificity = predicates.iter().map(|p| i64::from(p.weight.max(0))).sum();

        let mut filters = Vec::with_capacity(config.filters.len());
        for def in &config.filters {
            let filter = Filter::create(&def.name, &def.args).map_err(|err| match err {
                FilterError::Unknown => RouteError::UnknownFilter {
                    route: config.name.clone(),
                    name: def.name.clone(),
                },
                FilterError::Arguments(source) => RouteError::InvalidArguments {
                    route: config.name.clone(),
                    source,
                },
            })?;
            filters.push(filter);
        }

        let backend = Backend::parse(&config.backend).ok_or_else(|| RouteError::InvalidBackend {
            route: config.name.clone(),
            backend: config.backend.clone(),
        })?;

        Ok(Self {
            name: config.name.clone(),
            priority: config.priority,
            specificity,
            predicates,
            filters,
            backend,
        })
    }

    /// True when every predicate matches. An empty conjunction matches all.
    pub fn matches(&self, request: &RouteRequest, ctx: &RequestContext) -> bool {
        self.predicates
            .iter()
            .all(|p| p.predicate.matches(request, ctx))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    /// Sum of the non-negative predicate weights.
    pub fn specificity(&self) -> i64 {
        self.specificity
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Predicate names in evaluation order.
    pub fn predicate_names(&self) -> impl Iterator<Item = &str> {
        self.predicates.iter().map(|p| p.name.as_str())
    }
}
