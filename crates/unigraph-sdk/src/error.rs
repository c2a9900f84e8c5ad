//! Error types for the UniGraph SDK.

use thiserror::Error;
use unigraph_extractor::ExtractorError;
use unigraph_indexer::IndexerError;
use unigraph_llm::LlmError;
use unigraph_search::SearchError;

/// SDK operation errors
#[derive(Debug, Error)]
pub enum SdkError {
    /// Schema induction or extraction failed
    #[error(transparent)]
    Extractor(#[from] ExtractorError),

    /// Indexing failed
    #[error(transparent)]
    Indexer(#[from] IndexerError),

    /// Query failed
    #[error(transparent)]
    Search(#[from] SearchError),

    /// Provider could not be constructed
    #[error(transparent)]
    Provider(#[from] LlmError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}
