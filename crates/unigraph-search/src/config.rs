//! Configuration for local search

use serde::{Deserialize, Serialize};
use std::time::Duration;
use unigraph_llm::RetryPolicy;

/// Configuration for context assembly and answer generation
///
/// The four table shares are cumulative: the Reports table may fill up to
/// `report_share` of the budget, Reports plus Entities up to
/// `report_share + entity_share`, and so on. Share a table leaves unused
/// flows to the tables after it.
///
/// # Examples
///
/// ```
/// use unigraph_search::SearchConfig;
///
/// let config = SearchConfig::default();
/// assert_eq!(config.token_budget, 8000);
/// assert_eq!(config.top_k_entities, 10);
/// assert_eq!(config.response_type, "multiple paragraphs");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Token budget of the assembled context
    /// Default: 8000
    pub token_budget: usize,

    /// Entities kept after mapping mentions
    /// Default: 10
    pub top_k_entities: usize,

    /// Attempts at parsing the mention list before falling back to the query
    /// Default: 3
    pub mention_attempts: u32,

    /// Attempts per mention embedding, including the first
    /// Default: 3
    pub embedding_attempts: u32,

    /// Backoff before the second embedding attempt (milliseconds), doubled
    /// after each further failure
    /// Default: 1000
    pub embedding_backoff_ms: u64,

    /// Budget share of the Reports table
    /// Default: 0.25
    pub report_share: f32,

    /// Budget share of the Entities table
    /// Default: 0.25
    pub entity_share: f32,

    /// Budget share of the Relationships table
    /// Default: 0.3
    pub relationship_share: f32,

    /// Budget share of the Sources table
    /// Default: 0.2
    pub source_share: f32,

    /// Target length and format of the answer
    /// Default: "multiple paragraphs"
    pub response_type: String,

    /// Deadline for a whole query (seconds); none by default
    pub timeout_secs: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            token_budget: 8000,
            top_k_entities: 10,
            mention_attempts: 3,
            embedding_attempts: 3,
            embedding_backoff_ms: 1000,
            report_share: 0.25,
            entity_share: 0.25,
            relationship_share: 0.3,
            source_share: 0.2,
            response_type: "multiple paragraphs".to_string(),
            timeout_secs: None,
        }
    }
}

impl SearchConfig {
    /// Preset for short answers from a small context
    pub fn concise() -> Self {
        Self {
            token_budget: 4000,
            top_k_entities: 5,
            response_type: "single paragraph".to_string(),
            ..Self::default()
        }
    }

    /// Query deadline as a Duration
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Retry policy of mention embedding requests
    pub fn embedding_retry(&self) -> RetryPolicy {
        RetryPolicy::new(self.embedding_attempts, self.embedding_backoff_ms)
    }

    /// Cumulative token caps of Reports, Entities, Relationships and Sources
    pub fn table_caps(&self) -> [usize; 4] {
        let shares = [
            self.report_share,
            self.entity_share,
            self.relationship_share,
            self.source_share,
        ];
        let mut caps = [0; 4];
        let mut cumulative = 0.0f64;
        for (cap, share) in caps.iter_mut().zip(shares) {
            cumulative += share as f64;
            *cap = ((self.token_budget as f64) * cumulative.min(1.0)).floor() as usize;
        }
        caps
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.token_budget == 0 {
            return Err("token_budget must be greater than 0".to_string());
        }
        if self.top_k_entities == 0 {
            return Err("top_k_entities must be greater than 0".to_string());
        }
        if self.mention_attempts == 0 {
            return Err("mention_attempts must be greater than 0".to_string());
        }
        if self.embedding_attempts == 0 {
            return Err("embedding_attempts must be greater than 0".to_string());
        }
        let shares = [
            self.report_share,
            self.entity_share,
            self.relationship_share,
            self.source_share,
        ];
        if shares.iter().any(|s| !(0.0..=1.0).contains(s)) {
            return Err("table shares must be between 0.0 and 1.0".to_string());
        }
        if shares.iter().sum::<f32>() > 1.0 + 1e-4 {
            return Err("table shares must not add up to more than 1.0".to_string());
        }
        if self.timeout_secs == Some(0) {
            return Err("timeout_secs must be greater than 0".to_string());
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
