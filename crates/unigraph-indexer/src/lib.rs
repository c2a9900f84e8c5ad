//! UniGraph Indexer
//!
//! Turns an assembled knowledge graph into a searchable index.
//!
//! # Overview
//!
//! The indexer is responsible for:
//! - **Community detection**: seeded, hierarchical Leiden-style partitioning
//! - **Community reports**: one LLM-written summary per community
//! - **Entity embeddings**: a vector per entity's attribute text
//! - **Metrics collection**: communities per level, report and embedding outcomes
//!
//! # Architecture
//!
//! ```text
//! entities + relationships → WeightedGraph → hierarchical_partition → Cluster*
//! Cluster* → ReportWriter → Community*
//! entities → EntityEmbedder → entities with attribute embeddings
//! ```
//!
//! ## Community hierarchy
//!
//! | Level | Produced from | Id |
//! |-------|---------------|----|
//! | 0 | the whole graph | `0-<ordinal>` |
//! | L+1 | a level-L community larger than `max_cluster_size` | `<L+1>-<ordinal>` |
//!
//! Every level-(L+1) community is a subset of exactly one level-L community.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use unigraph_indexer::{GraphIndexer, IndexerConfig};
//! use unigraph_llm::MockOracle;
//!
//! # async fn example(graph: unigraph_domain::KnowledgeGraph) -> Result<(), Box<dyn std::error::Error>> {
//! let indexer = GraphIndexer::new(Arc::new(MockOracle::default()), IndexerConfig::default())?;
//! let output = indexer
//!     .build_index(graph.entities, graph.relationships, 2)
//!     .await?;
//! println!("{}", output.metrics.summary());
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration Presets
//!
//! ```
//! use unigraph_indexer::IndexerConfig;
//!
//! let default = IndexerConfig::default();
//! let aggressive = IndexerConfig::aggressive();
//! let lenient = IndexerConfig::lenient();
//! assert!(aggressive.report_concurrency > lenient.report_concurrency);
//! assert_eq!(default.seed, 5);
//! ```

#![warn(missing_docs)]

mod config;
mod embedding;
mod error;
mod indexer;
mod metrics;
pub mod partition;
pub mod reports;


pub use config::IndexerConfig;
pub use embedding::EntityEmbedder;
pub use error::IndexerError;
pub use indexer::{GraphIndexer, IndexOutput};
pub use metrics::IndexMetrics;
pub use reports::ReportWriter;
