//! UniGraph LLM Provider Layer
//!
//! Every call UniGraph makes to a language model goes through the
//! [`Oracle`] capability: one method for text completion, one for
//! embeddings. Providers are swappable behind `Arc<dyn Oracle>`.
//!
//! # Providers
//!
//! - `MockOracle`: Scripted, deterministic oracle for testing
//! - `OpenAiCompatibleOracle`: Any OpenAI-compatible chat/embeddings API
//!
//! Embedding requests are repeated with exponential backoff through
//! [`RetryPolicy`]; completions are not.
//!
//! # Examples
//!
//! ```
//! use unigraph_llm::{MockOracle, Oracle};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let oracle = MockOracle::new("Hello from LLM!");
//! oracle.add_response("Entity Extractor", "小明: Person");
//!
//! let reply = oracle.get_response("[DEFINE AGENT: Entity Extractor] ...").await.unwrap();
//! assert_eq!(reply, "小明: Person");
//!
//! let vector = oracle.get_vector("小明").await.unwrap();
//! assert_eq!(vector.len(), oracle.dimension());
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod json;
mod mock;
pub mod openai;
mod retry;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

pub use config::OracleConfig;
pub use json::extract_json;
pub use mock::MockOracle;
pub use openai::OpenAiCompatibleOracle;
pub use retry::{embed_with_retry, RetryPolicy};

/// Errors that can occur during LLM operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Request did not finish in time
    #[error("Request timed out")]
    Timeout,

    /// Invalid provider configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

impl LlmError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LlmError::Communication(_) | LlmError::RateLimitExceeded | LlmError::Timeout
        )
    }
}

/// The capability every LLM provider exposes to UniGraph
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Complete `prompt` and return the raw response text
    async fn get_response(&self, prompt: &str) -> Result<String, LlmError>;

    /// Embed `text` into a dense vector
    async fn get_vector(&self, text: &str) -> Result<Vec<f32>, LlmError>;

    /// Model name used for logging
    fn model_name(&self) -> &str {
        "oracle"
    }
}

#[async_trait]
impl<T: Oracle + ?Sized> Oracle for Arc<T> {
    async fn get_response(&self, prompt: &str) -> Result<String, LlmError> {
        (**self).get_response(prompt).await
    }

    async fn get_vector(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        (**self).get_vector(text).await
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(LlmError::Timeout.is_transient());
        assert!(LlmError::RateLimitExceeded.is_transient());
        assert!(LlmError::Communication("reset".into()).is_transient());
        assert!(!LlmError::InvalidResponse("bad".into()).is_transient());
        assert!(!LlmError::ModelNotAvailable("m".into()).is_transient());
    }

    #[tokio::test]
    async fn test_arc_dyn_oracle_delegates() {
        let mock = MockOracle::new("shared");
        let oracle: Arc<dyn Oracle> = Arc::new(mock.clone());
        assert_eq!(oracle.get_response("x").await.unwrap(), "shared");
        assert_eq!(mock.call_count(), 1);
    }
}
