//! Part registry
//!
//! Maps stable part type keys to constructors. The registry is an explicit
//! value handed to the [`crate::GraphStore`]; nothing is discovered at runtime.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::parts::{
    Broadcast, Code, Filter, HttpServer, Join, Part, RegisteredPart, Sink, construct_part,
};

/// Builds a part from its JSON configuration
pub type Constructor = fn(serde_json::Value) -> Result<Part>;

/// One registered part variant
#[derive(Debug, Clone, Copy)]
pub struct PartEntry {
    /// Stable type key
    pub type_key: &'static str,
    /// One-line description
    pub description: &'static str,
    construct: Constructor,
}

/// Table of known part variants
#[derive(Debug, Clone, Default)]
pub struct PartRegistry {
    entries: BTreeMap<&'static str, PartEntry>,
}

impl PartRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in part
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry
            .register::<Code>()
            .register::<Broadcast>()
            .register::<Join>()
            .register::<Filter>()
            .register::<Sink>()
            .register::<HttpServer>();
        registry
    }

    /// Add a part variant
    pub fn register<P: RegisteredPart>(&mut self) -> &mut Self {
        self.entries.insert(
            P::TYPE_KEY,
            PartEntry {
                type_key: P::TYPE_KEY,
                description: P::DESCRIPTION,
                construct: construct_part::<P>,
            },
        );
        self
    }

    /// Whether the type key is registered
    pub fn contains(&self, type_key: &str) -> bool {
        self.entries.contains_key(type_key)
    }

    /// Construct a part from its type key and configuration
    pub fn construct(&self, type_key: &str, config: serde_json::Value) -> Result<Part> {
        let entry = self
            .entries
            .get(type_key)
            .ok_or_else(|| Error::UnknownPartType(type_key.to_string()))?;
        (entry.construct)(config)
    }

    /// Registered variants, ordered by type key
    pub fn entries(&self) -> impl Iterator<Item = &PartEntry> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builtin_contains_all_parts() {
        let registry = PartRegistry::builtin();
        let keys: Vec<_> = registry.entries().map(|e| e.type_key).collect();
        assert_eq!(
            keys,
            vec!["Broadcast", "Code", "Filter", "HTTPServer", "Join", "Sink"]
        );
    }

    #[test]
    fn test_construct_known_part() {
        let registry = PartRegistry::builtin();
        let part = registry
            .construct("Sink", json!({"type": "int"}))
            .unwrap();
        assert_eq!(part.type_key(), "Sink");
    }

    #[test]
    fn test_construct_unknown_part() {
        let registry = PartRegistry::builtin();
        let err = registry.construct("Nope", json!({})).unwrap_err();
        assert!(matches!(err, Error::UnknownPartType(_)));
    }

    #[test]
    fn test_empty_registry_knows_nothing() {
        let registry = PartRegistry::new();
        assert!(!registry.contains("Code"));
        assert!(registry.construct("Code", json!({})).is_err());
    }
}
