//! # Composition Resolution
//!
//! Flattens a schema node into the constraints a body is checked against.
//!
//! - The node's own `required` and `properties` come first.
//! - Every `allOf` child is resolved recursively and its required names and
//!   properties are added: all of them must hold.
//! - Every `oneOf` / `anyOf` child is resolved recursively and only its
//!   properties are added, and only those whose name is not yet present.
//!   Alternatives never contribute required names, since the request only
//!   has to satisfy one of them.
//!
//! In both cases a property already defined keeps its first definition.
//! The schema tree is finite (reference cycles are rejected at load time),
//! so the recursion terminates.

use std::collections::BTreeMap;

use mockapi_core::Schema;

/// Required names and property definitions in effect for one schema node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedConstraints {
    /// Required property names, first occurrence order, no duplicates.
    pub required: Vec<String>,
    /// Property name to its schema.
    pub properties: BTreeMap<String, Schema>,
}

impl ResolvedConstraints {
    /// Whether the constraints say anything about the body's fields.
    pub fn is_empty(&self) -> bool {
        self.required.is_empty() && self.properties.is_empty()
    }

    fn add_required(&mut self, names: impl IntoIterator<Item = String>) {
        for name in names {
            if !self.required.contains(&name) {
                self.required.push(name);
            }
        }
    }

    fn add_properties(&mut self, properties: BTreeMap<String, Schema>) {
        for (name, schema) in properties {
            self.properties.entry(name).or_insert(schema);
        }
    }
}

/// Resolve `schema` into flat constraints. No schema resolves to nothing.
pub fn resolve(schema: Option<&Schema>) -> ResolvedConstraints {
    let mut out = ResolvedConstraints::default();
    let Some(schema) = schema else {
        return out;
    };

    out.add_required(schema.required.iter().cloned());
    out.add_properties(schema.properties.clone());

    for child in &schema.all_of {
        let nested = resolve(Some(child));
        out.add_required(nested.required);
        out.add_properties(nested.properties);
    }

    for child in schema.one_of.iter().chain(&schema.any_of) {
        out.add_properties(resolve(Some(child)).properties);
    }

    out
}
