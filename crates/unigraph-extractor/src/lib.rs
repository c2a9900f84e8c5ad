//! UniGraph Extractor
//!
//! Turns unstructured text into typed triples using an LLM as the
//! extraction oracle.
//!
//! # Overview
//!
//! Extraction happens in two jobs. Schema induction discovers the entity
//! and relation types worth modelling from a few seed chunks; the extraction
//! pipeline then runs every chunk through four prompt stages constrained by
//! that schema. Both jobs speak a fixed, delimiter-based reply format parsed
//! by the [`protocol`] module.
//!
//! # Architecture
//!
//! ```text
//! seed chunks → SchemaInducer → InducedSchema
//! chunks + InducedSchema → ExtractionPipeline → ExtractedTriple*
//! ExtractedTriple* → GraphAssembler → KnowledgeGraph
//! ```
//!
//! # Key Features
//!
//! - **Schema induction**: cumulative type dictionaries merged by embedding similarity
//! - **Staged extraction**: entities, relations, tracing ‖ type match, attributes
//! - **Stable ids**: triple ids are a pure function of the triple and the configured seed
//! - **Job gate**: competing jobs that share a [`JobGate`] never overlap
//! - **Partial failure**: a failing chunk is reported, not fatal
//!
//! # Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use unigraph_extractor::{
//!     ExtractionPipeline, ExtractorConfig, GraphAssembler, InductionConfig,
//!     InductionRequest, JobGate, SchemaInducer,
//! };
//! use unigraph_llm::MockOracle;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let oracle = Arc::new(MockOracle::default());
//! let gate = JobGate::new();
//! let chunks = vec!["小明喜欢数学。".to_string()];
//!
//! let inducer = SchemaInducer::new(oracle.clone(), InductionConfig::default())?;
//! let induced = inducer
//!     .induce(&gate, &InductionRequest::new("学生兴趣", chunks.clone()))
//!     .await?;
//!
//! let pipeline = ExtractionPipeline::new(oracle, ExtractorConfig::default())?;
//! let extracted = pipeline.extract(&gate, &induced.schema, &chunks).await?;
//!
//! let graph = GraphAssembler::new().assemble(&extracted.triples);
//! println!("{} entities, {} relationships", graph.entities.len(), graph.relationships.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod assembly;
mod config;
mod error;
mod gate;
mod induction;
mod language;
mod pipeline;
pub mod prompt;
pub mod protocol;
pub mod stages;
mod types;

#[cfg(test)]
mod tests;

pub use assembly::{GraphAssembler, MergeStats};
pub use config::{ExtractorConfig, InductionConfig};
pub use error::ExtractorError;
pub use gate::JobGate;
pub use induction::SchemaInducer;
pub use language::Language;
pub use pipeline::ExtractionPipeline;
pub use stages::{ExtractionSchema, HaltReason, StageOutcome};
pub use types::{
    ChunkFailure, ChunkHalt, ExtractionMetadata, ExtractionResult, InductionMetadata,
    InductionRequest, InductionResult,
};
