//! Graph records: entities, relationships and communities

use crate::schema::InducedSchema;
use crate::triple::ExtractedTriple;
use crate::types::TypeName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Unique identifier for a persisted graph based on UUIDv7
///
/// UUIDv7 ids sort chronologically, so listing graphs returns them in
/// creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GraphId(uuid::Uuid);

impl GraphId {
    /// Generate a new UUIDv7-based GraphId
    ///
    /// # Examples
    ///
    /// ```
    /// use unigraph_domain::GraphId;
    ///
    /// let id = GraphId::new();
    /// let parsed = GraphId::from_string(&id.to_string()).unwrap();
    /// assert_eq!(id, parsed);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    /// Parse a GraphId from its string form
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| format!("Invalid graph id '{}': {}", s, e))
    }
}

impl Default for GraphId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A typed entity in the knowledge graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Stable id
    pub id: String,

    /// Entity name as it appears in the text
    pub name: String,

    /// Entity type
    pub entity_type: TypeName,

    /// Attribute values keyed by the type's attribute keys
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,

    /// Embedding of [`Entity::attribute_text`]; empty until indexed
    #[serde(default)]
    pub attributes_embedding: Vec<f32>,

    /// Community id per hierarchy level
    #[serde(default)]
    pub community_ids: BTreeMap<u32, String>,
}

impl Entity {
    /// Text embedded to represent the entity: its attributes then its name
    pub fn attribute_text(&self) -> String {
        let mut parts: Vec<String> = self
            .attributes
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect();
        parts.push(format!("name: {}", self.name));
        parts.join(" ")
    }

    /// True once the indexer stored an embedding
    pub fn has_embedding(&self) -> bool {
        !self.attributes_embedding.is_empty()
    }
}

/// A typed, directed relationship between two entities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Stable id (the id of the triple it came from)
    pub id: String,

    /// Source entity id
    pub source: String,

    /// Target entity id
    pub target: String,

    /// Schema relation type
    pub relation_type: TypeName,

    /// Relation literal as extracted
    pub name: String,

    /// Free-form attributes
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,

    /// Source sentence supporting the relationship
    #[serde(default)]
    pub provenance: String,
}

/// One key finding of a community report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Short summary
    pub summary: String,

    /// Longer explanation
    #[serde(default)]
    pub explanation: String,
}

/// A community of entities at one level of the hierarchy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Community {
    /// Stable id, `"<level>-<ordinal>"`
    pub id: String,

    /// 0-based hierarchy level
    pub level: u32,

    /// Id of the enclosing community one level up
    pub parent: Option<String>,

    /// Member entity ids
    pub member_entity_ids: Vec<String>,

    /// Report title
    pub title: String,

    /// Report summary
    pub summary: String,

    /// Summary and findings rendered as one document
    pub full_content: String,

    /// Importance rating reported by the oracle
    pub rating: f32,

    /// Why the rating was given
    #[serde(default)]
    pub rating_explanation: String,

    /// Key findings
    #[serde(default)]
    pub findings: Vec<Finding>,

    /// Free-form attributes
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

/// Entities and relationships assembled from triples
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeGraph {
    /// Entities
    pub entities: Vec<Entity>,

    /// Relationships
    pub relationships: Vec<Relationship>,
}

/// Everything persisted for one graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// Graph id
    pub id: GraphId,

    /// Schema the graph was extracted with
    pub schema: Option<InducedSchema>,

    /// Extracted triples
    #[serde(default)]
    pub triples: Vec<ExtractedTriple>,

    /// Assembled graph
    #[serde(default)]
    pub graph: KnowledgeGraph,

    /// Community reports from the last indexing run
    #[serde(default)]
    pub communities: Vec<Community>,
}

impl GraphSnapshot {
    /// Create an empty snapshot with a fresh id
    pub fn new(schema: Option<InducedSchema>) -> Self {
        Self {
            id: GraphId::new(),
            schema,
            triples: Vec::new(),
            graph: KnowledgeGraph::default(),
            communities: Vec::new(),
        }
    }
}
