//! Predicate registry.
//!
//! Maps route-definition keywords to predicate specs. Populated before any
//! route is compiled and read-only afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::RegistryError;
use crate::predicates;
use crate::routing::predicate::PredicateSpec;

#[derive(Default, Clone)]
pub struct PredicateRegistry {
    specs: HashMap<String, Arc<dyn PredicateSpec>>,
}

impl PredicateRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in predicate.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for spec in predicates::builtins() {
            // builtin names are distinct
            let _ = registry.register(spec);
        }
        registry
    }

    /// Register a spec under its name. Names must be unique.
    pub fn register(&mut self, spec: Arc<dyn PredicateSpec>) -> Result<(), RegistryError> {
        let name = spec.name().to_string();
        if self.specs.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }
        tracing::debug!(predicate = %name, weight = spec.weight(), "Predicate registered");
        self.specs.insert(name, spec);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn PredicateSpec>> {
        self.specs.get(name)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl std::fmt::Debug for PredicateRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.specs.keys().collect();
        names.sort();
        f.debug_struct("PredicateRegistry").field("specs", &names).finish()
    }
}
