//! Induced schema records
//!
//! A schema is a list of `(head type, relation type, tail type)` entries,
//! each remembering the triples that justified it, plus a map of
//! natural-language type definitions. The serialized field names match the
//! JSON layout schemas are exchanged in.

use crate::types::{TypeName, TypeRegistry};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Type name to definition map, in the order definitions were produced
pub type Definitions = IndexMap<String, String>;

/// Reference to an entity type together with its attribute keys
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityTypeRef {
    /// Entity type name
    #[serde(rename = "Name")]
    pub name: TypeName,

    /// Attribute keys declared for the type
    #[serde(rename = "Attributes", default)]
    pub attributes: Vec<String>,
}

impl EntityTypeRef {
    /// Create a type reference
    pub fn new(name: impl Into<TypeName>, attributes: Vec<String>) -> Self {
        Self {
            name: name.into(),
            attributes,
        }
    }
}

/// One `(head type, relation type, tail type)` schema entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaEntry {
    /// Head entity type
    #[serde(rename = "DirectionalEntityType")]
    pub head: EntityTypeRef,

    /// Relation type
    #[serde(rename = "RelationType")]
    pub relation: TypeName,

    /// Tail entity type
    #[serde(rename = "DirectedEntityType")]
    pub tail: EntityTypeRef,

    /// Canonical triple string to the sentence supporting it
    #[serde(rename = "source", default)]
    pub provenance: IndexMap<String, String>,
}

impl SchemaEntry {
    /// Deduplication key of the entry
    pub fn key(&self) -> (&str, &str, &str) {
        (
            self.head.name.as_str(),
            self.relation.as_str(),
            self.tail.name.as_str(),
        )
    }

    /// True when at least one supporting sentence is recorded
    pub fn has_provenance(&self) -> bool {
        self.provenance.values().any(|s| !s.trim().is_empty())
    }
}

/// Output of schema induction and input of extraction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InducedSchema {
    /// Deduplicated schema entries
    pub entries: Vec<SchemaEntry>,

    /// Type definitions
    #[serde(default)]
    pub definitions: Definitions,
}

impl InducedSchema {
    /// Create a schema from entries and definitions
    pub fn new(entries: Vec<SchemaEntry>, definitions: Definitions) -> Self {
        Self {
            entries,
            definitions,
        }
    }

    /// Build a type registry from the entries, attaching definitions
    pub fn registry(&self) -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        for entry in &self.entries {
            for side in [&entry.head, &entry.tail] {
                registry.add_entity_type(
                    side.name.as_str(),
                    &side.attributes,
                    self.definitions.get(side.name.as_str()).cloned(),
                );
            }
        }
        for entry in &self.entries {
            registry.add_relation_type(
                entry.relation.as_str(),
                self.definitions.get(entry.relation.as_str()).cloned(),
            );
        }
        registry
    }

    /// True when the schema has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(head: &str, rel: &str, tail: &str) -> SchemaEntry {
        SchemaEntry {
            head: EntityTypeRef::new(head, vec!["age".to_string()]),
            relation: TypeName::new(rel),
            tail: EntityTypeRef::new(tail, vec![]),
            provenance: IndexMap::new(),
        }
    }

    #[test]
    fn test_registry_from_entries() {
        let mut definitions = Definitions::new();
        definitions.insert("Person".to_string(), "A human".to_string());
        let schema = InducedSchema::new(
            vec![entry("Person", "喜欢", "Subject"), entry("Person", "学习", "Subject")],
            definitions,
        );

        let registry = schema.registry();
        assert_eq!(registry.entity_types().count(), 2);
        assert_eq!(registry.relation_types().count(), 2);
        assert_eq!(
            registry.entity_type("Person").unwrap().definition.as_deref(),
            Some("A human")
        );
        assert_eq!(registry.entity_type("Person").unwrap().attributes, vec!["age"]);
    }

    #[test]
    fn test_serialized_field_names() {
        let schema = InducedSchema::new(vec![entry("Person", "喜欢", "Subject")], Definitions::new());
        let json = serde_json::to_value(&schema).unwrap();
        let first = &json["entries"][0];
        assert_eq!(first["DirectionalEntityType"]["Name"], "Person");
        assert_eq!(first["RelationType"], "喜欢");
        assert_eq!(first["DirectedEntityType"]["Name"], "Subject");
    }

    #[test]
    fn test_has_provenance_ignores_blank_sources() {
        let mut e = entry("Person", "喜欢", "Subject");
        assert!(!e.has_provenance());
        e.provenance.insert("(小明, 喜欢, 数学)".to_string(), "  ".to_string());
        assert!(!e.has_provenance());
        e.provenance.insert("(小红, 喜欢, 语文)".to_string(), "小红喜欢语文".to_string());
        assert!(e.has_provenance());
    }
}
