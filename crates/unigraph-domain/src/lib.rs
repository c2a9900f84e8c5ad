//! UniGraph Domain Layer
//!
//! This crate contains the core data model shared by every UniGraph layer.
//! It keeps its dependency footprint minimal (serde, hashing, UUIDs) and
//! defines the value objects and trait interfaces that the extraction,
//! indexing and search crates depend upon.
//!
//! ## Key Concepts
//!
//! - **Type schema**: entity and relation types discovered by schema induction
//! - **Triple**: an extracted `(head, relation, tail)` fact with provenance
//! - **Entity / Relationship**: the graph records assembled from triples
//! - **Community**: a cluster of entities at one level of the hierarchy
//! - **GraphSnapshot**: everything persisted for one graph
//!
//! ## Architecture
//!
//! This crate follows Clean Architecture:
//! - Pure data and deterministic functions only
//! - Infrastructure implementations (LLM providers, SQLite) live in other crates
//! - Trait definitions for persistence and document ingestion

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod graph;
pub mod schema;
pub mod similarity;
pub mod traits;
pub mod triple;
pub mod types;

// Re-exports for convenience
pub use graph::{Community, Entity, Finding, GraphId, GraphSnapshot, KnowledgeGraph, Relationship};
pub use schema::{Definitions, EntityTypeRef, InducedSchema, SchemaEntry};
pub use similarity::cosine_similarity;
pub use triple::{ExtractedTriple, HashWindow, TripleId};
pub use types::{EntityType, RelationType, TypeName, TypeRegistry};

/// Attribute value used whenever the source text does not supply one.
pub const UNKNOWN_ATTRIBUTE: &str = "Unknown";
