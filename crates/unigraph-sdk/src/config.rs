//! Combined configuration of every UniGraph layer

use serde::{Deserialize, Serialize};
use unigraph_extractor::{ExtractorConfig, InductionConfig};
use unigraph_indexer::IndexerConfig;
use unigraph_llm::OracleConfig;
use unigraph_search::SearchConfig;

/// Configuration of the provider and of every job
///
/// Each layer's settings live in their own TOML table; missing tables and
/// keys fall back to defaults.
///
/// # Examples
///
/// ```
/// use unigraph_sdk::UniGraphConfig;
///
/// let config = UniGraphConfig::from_toml(r#"
///     [oracle]
///     chat_model = "qwen-plus"
///
///     [indexer]
///     max_cluster_size = 10
/// "#).unwrap();
/// assert_eq!(config.oracle.chat_model, "qwen-plus");
/// assert_eq!(config.indexer.max_cluster_size, 10);
/// assert_eq!(config.search.token_budget, 8000);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UniGraphConfig {
    /// LLM provider
    pub oracle: OracleConfig,

    /// Schema induction
    pub induction: InductionConfig,

    /// Triple extraction
    pub extractor: ExtractorConfig,

    /// Community indexing
    pub indexer: IndexerConfig,

    /// Local search
    pub search: SearchConfig,
}

impl UniGraphConfig {
    /// Validate every section
    pub fn validate(&self) -> Result<(), String> {
        self.oracle.validate().map_err(|e| format!("oracle: {}", e))?;
        self.induction.validate().map_err(|e| format!("induction: {}", e))?;
        self.extractor.validate().map_err(|e| format!("extractor: {}", e))?;
        self.indexer.validate().map_err(|e| format!("indexer: {}", e))?;
        self.search.validate().map_err(|e| format!("search: {}", e))?;
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
