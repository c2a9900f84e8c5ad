//! Error types for graph indexing

use thiserror::Error;
use unigraph_llm::LlmError;

/// Errors that can occur while indexing a graph
#[derive(Error, Debug)]
pub enum IndexerError {
    /// LLM provider error during report generation
    #[error("LLM error: {0}")]
    Provider(#[from] LlmError),

    /// The partition violated the community hierarchy
    #[error("Partition error: {0}")]
    Partition(String),

    /// Invalid input records
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
