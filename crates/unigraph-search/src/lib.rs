//! UniGraph Search
//!
//! Local search: answers a question from the part of an indexed knowledge
//! graph that the question is about.
//!
//! # Overview
//!
//! 1. **Mentions**: the oracle lists the entities a query mentions
//! 2. **Mapping**: mentions are embedded and matched to entity embeddings
//! 3. **Context**: reports, entities, relationships and sources are ranked
//!    and packed into a token-budgeted set of tables, counted with the
//!    `cl100k_base` byte-pair encoding
//! 4. **Answer**: the oracle answers from the tables, citing record ids
//!
//! # Depth and level
//!
//! The public `depth` is 1-based; community `level` is 0-based. A query at
//! depth `d` sees reports with `level <= d - 1`. Depth 0 is rejected with
//! [`SearchError::InvalidDepth`].
//!
//! # Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use unigraph_llm::MockOracle;
//! use unigraph_search::{LocalSearchContextBuilder, LocalSearchEngine, SearchConfig};
//!
//! # async fn example(
//! #     entities: Vec<unigraph_domain::Entity>,
//! #     relationships: Vec<unigraph_domain::Relationship>,
//! #     reports: Vec<unigraph_domain::Community>,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let builder = LocalSearchContextBuilder::new(entities, relationships, reports, SearchConfig::default())?;
//! let engine = LocalSearchEngine::new(Arc::new(MockOracle::default()), builder);
//!
//! let result = engine.search("小明喜欢什么", 1, true).await?;
//! println!("{}\n\n{}", result.answer, result.context_text);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod context;
mod engine;
mod error;
pub mod mentions;
mod tokenizer;

pub use config::SearchConfig;
pub use context::{
    max_level_for_depth, ContextData, EntityRow, LocalContext, LocalSearchContextBuilder,
    RelationshipRow, ReportRow, SourceRow,
};
pub use engine::{answer_prompt, LocalSearchEngine, SearchResult};
pub use error::SearchError;
pub use mentions::MappedEntity;
pub use tokenizer::{default_tokenizer, BpeTokenizer, HeuristicTokenizer, Tokenizer};
