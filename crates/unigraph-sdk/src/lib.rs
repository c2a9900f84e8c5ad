//! UniGraph Rust SDK
//!
//! One facade over the whole pipeline: schema induction, triple extraction,
//! graph assembly, community indexing and local search.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use unigraph_llm::MockOracle;
//! use unigraph_sdk::{UniGraph, UniGraphConfig};
//!
//! # async fn example() -> Result<(), unigraph_sdk::SdkError> {
//! let unigraph = UniGraph::new(Arc::new(MockOracle::default()), UniGraphConfig::default())?;
//! let induced = unigraph
//!     .induce_schema("people and hobbies", vec!["Alice enjoys chess.".to_string()])
//!     .await?;
//! println!("{} entity types", induced.schema.entries.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod client;
mod config;
mod error;

pub use client::UniGraph;
pub use config::UniGraphConfig;
pub use error::SdkError;

pub use unigraph_domain::{
    Community, Entity, GraphSnapshot, InducedSchema, KnowledgeGraph, Relationship,
};
pub use unigraph_extractor::{
    ExtractionResult, InductionRequest, InductionResult, JobGate, MergeStats,
};
pub use unigraph_indexer::{IndexMetrics, IndexOutput};
pub use unigraph_search::SearchResult;
