//! Error types for local search

use thiserror::Error;
use unigraph_llm::LlmError;

/// Errors that can occur while answering a query
#[derive(Error, Debug)]
pub enum SearchError {
    /// Depth is 1-based; 0 names no level
    #[error("Invalid depth {0}: depth starts at 1")]
    InvalidDepth(u32),

    /// LLM provider error, with the provider's message
    #[error("LLM error: {0}")]
    Provider(#[from] LlmError),

    /// The query did not finish before its deadline
    #[error("Query timed out")]
    Timeout,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
