//! Error types for schema induction and extraction

use thiserror::Error;
use unigraph_llm::LlmError;

/// Errors that can occur during induction or extraction
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// LLM provider error, carrying the provider's message
    #[error("LLM error: {0}")]
    Provider(#[from] LlmError),

    /// Every chunk of the job failed with a provider error
    #[error("All {chunks} chunks failed; last error: {last_error}")]
    AllChunksFailed {
        /// Number of chunks in the job
        chunks: usize,
        /// Message of the last failure
        last_error: String,
    },

    /// Extraction timeout
    #[error("Extraction timeout")]
    Timeout,

    /// The schema cannot drive extraction
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
