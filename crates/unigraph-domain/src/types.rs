//! Entity and relation type registry
//!
//! Type names are interned: every [`TypeName`] handed out by a
//! [`TypeRegistry`] for the same string shares one allocation, so schema
//! entries, triples and entities can carry type references cheaply.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Interned, stable name of an entity or relation type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TypeName(Arc<str>);

impl TypeName {
    /// Create a standalone (non-interned) type name
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref().trim()))
    }

    /// Borrow the name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when both names share the same interned allocation
    pub fn ptr_eq(&self, other: &TypeName) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<String> for TypeName {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for TypeName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<TypeName> for String {
    fn from(t: TypeName) -> Self {
        t.0.to_string()
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TypeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// An entity type with its declared attribute keys
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityType {
    /// Type name
    pub name: TypeName,

    /// Attribute keys every entity of this type carries
    pub attributes: Vec<String>,

    /// Natural-language definition, if one was induced
    pub definition: Option<String>,
}

/// A relation type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationType {
    /// Type name
    pub name: TypeName,

    /// Natural-language definition, if one was induced
    pub definition: Option<String>,
}

/// Registry of entity and relation types keyed by interned names
///
/// Insertion order is preserved; prompts list types in the order they were
/// discovered.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    names: IndexMap<Arc<str>, TypeName>,
    entity_types: IndexMap<TypeName, EntityType>,
    relation_types: IndexMap<TypeName, RelationType>,
}

impl TypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the interned name for `name`, allocating it on first use
    pub fn intern(&mut self, name: &str) -> TypeName {
        let key = name.trim();
        if let Some(existing) = self.names.get(key) {
            return existing.clone();
        }
        let interned = TypeName::new(key);
        self.names.insert(Arc::clone(&interned.0), interned.clone());
        interned
    }

    /// Register (or extend) an entity type
    ///
    /// Attribute keys are merged without duplicates; an existing definition
    /// is kept unless the new one is `Some`.
    pub fn add_entity_type(
        &mut self,
        name: &str,
        attributes: &[String],
        definition: Option<String>,
    ) -> TypeName {
        let name = self.intern(name);
        let entry = self
            .entity_types
            .entry(name.clone())
            .or_insert_with(|| EntityType {
                name: name.clone(),
                attributes: Vec::new(),
                definition: None,
            });
        for attr in attributes {
            if !entry.attributes.iter().any(|a| a == attr) {
                entry.attributes.push(attr.clone());
            }
        }
        if definition.is_some() {
            entry.definition = definition;
        }
        name
    }

    /// Register a relation type
    pub fn add_relation_type(&mut self, name: &str, definition: Option<String>) -> TypeName {
        let name = self.intern(name);
        let entry = self
            .relation_types
            .entry(name.clone())
            .or_insert_with(|| RelationType {
                name: name.clone(),
                definition: None,
            });
        if definition.is_some() {
            entry.definition = definition;
        }
        name
    }

    /// Look up an entity type by name
    pub fn entity_type(&self, name: &str) -> Option<&EntityType> {
        self.names
            .get(name.trim())
            .and_then(|n| self.entity_types.get(n))
    }

    /// Look up a relation type by name
    pub fn relation_type(&self, name: &str) -> Option<&RelationType> {
        self.names
            .get(name.trim())
            .and_then(|n| self.relation_types.get(n))
    }

    /// All entity types in discovery order
    pub fn entity_types(&self) -> impl Iterator<Item = &EntityType> {
        self.entity_types.values()
    }

    /// All relation types in discovery order
    pub fn relation_types(&self) -> impl Iterator<Item = &RelationType> {
        self.relation_types.values()
    }

    /// True when no types are registered
    pub fn is_empty(&self) -> bool {
        self.entity_types.is_empty() && self.relation_types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_shares_allocation() {
        let mut registry = TypeRegistry::new();
        let a = registry.intern("Person");
        let b = registry.intern(" Person ");
        assert_eq!(a, b);
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn test_entity_type_attributes_merge() {
        let mut registry = TypeRegistry::new();
        registry.add_entity_type("Person", &["age".to_string()], None);
        registry.add_entity_type(
            "Person",
            &["age".to_string(), "gender".to_string()],
            Some("A human being".to_string()),
        );

        let person = registry.entity_type("Person").unwrap();
        assert_eq!(person.attributes, vec!["age", "gender"]);
        assert_eq!(person.definition.as_deref(), Some("A human being"));
        assert_eq!(registry.entity_types().count(), 1);
    }

    #[test]
    fn test_relation_type_lookup() {
        let mut registry = TypeRegistry::new();
        registry.add_relation_type("喜欢", Some("偏好".to_string()));
        assert!(registry.relation_type("喜欢").is_some());
        assert!(registry.relation_type("讨厌").is_none());
        assert!(registry.entity_type("喜欢").is_none());
    }

    #[test]
    fn test_type_name_serde_as_string() {
        let name = TypeName::new("Subject");
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"Subject\"");
        let back: TypeName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, name);
    }
}
