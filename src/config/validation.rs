//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (loopback bound > 0, body limit > 0)
//! - Check route definitions are well formed (names, backends)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Predicate/filter arguments are checked by route compilation, which
//!   rejects only the offending route

use std::collections::HashSet;
use std::net::SocketAddr;

use crate::config::schema::ProxyConfig;
use crate::routing::route::Backend;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid bind address '{0}'")]
    BindAddress(String),

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),

    #[error("routing.max_loopbacks must be greater than 0")]
    MaxLoopbacks,

    #[error("security.max_body_size must be greater than 0")]
    BodyLimit,

    #[error("route at index {0} has an empty name")]
    EmptyRouteName(usize),

    #[error("duplicate route name '{0}'")]
    DuplicateRouteName(String),

    #[error("route '{route}': invalid backend '{backend}'")]
    Backend { route: String, backend: String },
}

pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.routing.max_loopbacks == 0 {
        errors.push(ValidationError::MaxLoopbacks);
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::BodyLimit);
    }

    let mut names = HashSet::new();
    for (index, route) in config.routes.iter().enumerate() {
        if route.name.trim().is_empty() {
            errors.push(ValidationError::EmptyRouteName(index));
        } else if !names.insert(route.name.as_str()) {
            errors.push(ValidationError::DuplicateRouteName(route.name.clone()));
        }

        if Backend::parse(&route.backend).is_none() {
            errors.push(ValidationError::Backend {
                route: route.name.clone(),
                backend: route.backend.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouteConfig;

    fn route(name: &str, backend: &str) -> RouteConfig {
        RouteConfig {
            name: name.into(),
            priority: 0,
            predicates: Vec::new(),
            filters: Vec::new(),
            backend: backend.into(),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&ProxyConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ProxyConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.routing.max_loopbacks = 0;
        config.routes.push(route("r1", "<shunt>"));
        config.routes.push(route("r1", "<loopback>"));
        config.routes.push(route("", "somewhere"));

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::BindAddress("not-an-address".into()),
                ValidationError::MaxLoopbacks,
                ValidationError::DuplicateRouteName("r1".into()),
                ValidationError::EmptyRouteName(2),
                ValidationError::Backend {
                    route: "".into(),
                    backend: "somewhere".into()
                },
            ]
        );
    }

    #[test]
    fn test_https_backend_rejected() {
        let mut config = ProxyConfig::default();
        config.routes.push(route("secure", "https://api.example.com"));

        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::Backend {
                route: "secure".into(),
                backend: "https://api.example.com".into()
            }])
        );
    }
}
