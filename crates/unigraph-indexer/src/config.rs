//! Configuration for graph indexing
//!
//! Controls community partitioning bounds, report generation and entity
//! embedding.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use unigraph_llm::RetryPolicy;

/// Configuration for the graph indexer
///
/// # Examples
///
/// ```
/// use unigraph_indexer::IndexerConfig;
///
/// let config = IndexerConfig::default();
/// assert_eq!(config.max_cluster_size, 20);
/// assert_eq!(config.seed, 5);
///
/// // Fewer concurrent calls for rate-limited providers
/// let config = IndexerConfig::lenient();
/// assert!(config.embedding_concurrency < IndexerConfig::default().embedding_concurrency);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Communities larger than this are split into a deeper level
    /// Default: 20
    pub max_cluster_size: usize,

    /// Number of hierarchy levels to build at most
    /// Default: 3
    pub max_levels: usize,

    /// Seed of the partitioner's random node order
    /// Default: 5
    pub seed: u64,

    /// Concurrent report generation calls
    /// Default: 15
    pub report_concurrency: usize,

    /// Rows of entities and relationships shown to the report writer
    /// Default: 100
    pub report_context_rows: usize,

    /// Concurrent embedding calls
    /// Default: 100
    pub embedding_concurrency: usize,

    /// Attempts per entity embedding, including the first
    /// Default: 3
    pub embedding_attempts: u32,

    /// Backoff before the second attempt (milliseconds), doubled after each
    /// further failure
    /// Default: 1000
    pub embedding_backoff_ms: u64,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            max_cluster_size: 20,
            max_levels: 3,
            seed: 5,
            report_concurrency: 15,
            report_context_rows: 100,
            embedding_concurrency: 100,
            embedding_attempts: 3,
            embedding_backoff_ms: 1000,
        }
    }
}

impl IndexerConfig {
    /// Aggressive preset: more parallel calls, fewer retries
    pub fn aggressive() -> Self {
        Self {
            report_concurrency: 32,
            embedding_concurrency: 200,
            embedding_attempts: 2,
            embedding_backoff_ms: 500,
            ..Self::default()
        }
    }

    /// Lenient preset: gentle on rate-limited providers
    pub fn lenient() -> Self {
        Self {
            report_concurrency: 4,
            embedding_concurrency: 16,
            embedding_attempts: 5,
            embedding_backoff_ms: 2000,
            ..Self::default()
        }
    }

    /// Retry policy of entity embedding requests
    pub fn embedding_retry(&self) -> RetryPolicy {
        RetryPolicy::new(self.embedding_attempts, self.embedding_backoff_ms)
    }

    /// Backoff before retrying after the `attempt`-th failure (1-based)
    pub fn embedding_backoff(&self, attempt: u32) -> Duration {
        self.embedding_retry().backoff(attempt)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_cluster_size < 2 {
            return Err("max_cluster_size must be at least 2".to_string());
        }
        if self.max_levels == 0 {
            return Err("max_levels must be greater than 0".to_string());
        }
        if self.report_concurrency == 0 || self.embedding_concurrency == 0 {
            return Err("concurrency limits must be greater than 0".to_string());
        }
        if self.embedding_attempts == 0 {
            return Err("embedding_attempts must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
