//! Configuration for schema induction and extraction

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use unigraph_domain::HashWindow;
use unigraph_llm::RetryPolicy;

/// Configuration for the extraction pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Chunks processed concurrently within one job
    pub max_concurrent_chunks: usize,

    /// Maximum time for one chunk's four-stage chain (seconds)
    pub chunk_timeout_secs: u64,

    /// Seed selecting the hash window for triple ids
    pub id_seed: u64,
}

impl ExtractorConfig {
    /// Get the chunk timeout as a Duration
    pub fn chunk_timeout(&self) -> Duration {
        Duration::from_secs(self.chunk_timeout_secs)
    }

    /// Hash window derived from `id_seed`
    ///
    /// The same seed always yields the same window, so triple ids are stable
    /// across runs sharing a configuration.
    pub fn hash_window(&self) -> HashWindow {
        let mut rng = StdRng::seed_from_u64(self.id_seed);
        let offset = rng.gen_range(0..=HashWindow::MAX_OFFSET);
        HashWindow::new(offset).unwrap_or_default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrent_chunks == 0 {
            return Err("max_concurrent_chunks must be greater than 0".to_string());
        }
        if self.chunk_timeout_secs == 0 {
            return Err("chunk_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Aggressive preset: more parallelism, shorter timeouts
    pub fn aggressive() -> Self {
        Self {
            max_concurrent_chunks: 32,
            chunk_timeout_secs: 120,
            ..Self::default()
        }
    }

    /// Lenient preset: gentle on rate-limited providers, long timeouts
    pub fn lenient() -> Self {
        Self {
            max_concurrent_chunks: 4,
            chunk_timeout_secs: 900,
            ..Self::default()
        }
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

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_chunks: 15,
            chunk_timeout_secs: 300,
            id_seed: 42,
        }
    }
}

/// Configuration for schema induction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InductionConfig {
    /// Cosine similarity above which a new type merges into an existing one
    pub merge_threshold: f32,

    /// Type names per definition request
    pub definition_batch_size: usize,

    /// Maximum time for one oracle call (seconds)
    pub call_timeout_secs: u64,

    /// Attempts per type-name embedding, including the first
    pub embedding_attempts: u32,

    /// Backoff before the second embedding attempt (milliseconds), doubled
    /// after each further failure
    pub embedding_backoff_ms: u64,
}

impl InductionConfig {
    /// Get the call timeout as a Duration
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// Retry policy of type-name embedding requests
    pub fn embedding_retry(&self) -> RetryPolicy {
        RetryPolicy::new(self.embedding_attempts, self.embedding_backoff_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.merge_threshold) {
            return Err("merge_threshold must be in [0, 1]".to_string());
        }
        if self.definition_batch_size == 0 {
            return Err("definition_batch_size must be greater than 0".to_string());
        }
        if self.call_timeout_secs == 0 {
            return Err("call_timeout_secs must be greater than 0".to_string());
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

impl Default for InductionConfig {
    fn default() -> Self {
        Self {
            merge_threshold: 0.85,
            definition_batch_size: 10,
            call_timeout_secs: 120,
            embedding_attempts: 3,
            embedding_backoff_ms: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ExtractorConfig::default().validate().is_ok());
        assert!(InductionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(ExtractorConfig::aggressive().validate().is_ok());
        assert!(ExtractorConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_invalid_concurrency() {
        let config = ExtractorConfig {
            max_concurrent_chunks: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_threshold() {
        let config = InductionConfig {
            merge_threshold: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_embedding_attempts_rejected() {
        let config = InductionConfig {
            embedding_attempts: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert_eq!(InductionConfig::default().embedding_retry().attempts, 3);
    }

    #[test]
    fn test_hash_window_is_stable_per_seed() {
        let a = ExtractorConfig::default().hash_window();
        let b = ExtractorConfig::default().hash_window();
        assert_eq!(a, b);
        assert!(a.offset() <= HashWindow::MAX_OFFSET);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ExtractorConfig::default();
        let parsed = ExtractorConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed.max_concurrent_chunks, config.max_concurrent_chunks);
        assert_eq!(parsed.id_seed, config.id_seed);
    }
}
