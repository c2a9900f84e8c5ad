//! Provider configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection settings for an OpenAI-compatible provider
///
/// One `OracleConfig` builds one provider value; that value is shared and
/// passed to every component that needs the oracle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// API base URL, e.g. `https://api.openai.com/v1`
    pub base_url: String,

    /// Bearer token; may be empty for local servers
    pub api_key: String,

    /// Model used for completions
    pub chat_model: String,

    /// Model used for embeddings
    pub embedding_model: String,

    /// Per-request timeout (seconds)
    pub timeout_secs: u64,

    /// Attempts per embedding request, including the first; completions
    /// are sent once
    pub max_attempts: u32,

    /// Sampling temperature
    pub temperature: f32,
}

impl OracleConfig {
    /// Per-request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.trim().is_empty() {
            return Err("base_url must not be empty".to_string());
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(format!("base_url must be an http(s) URL, got '{}'", self.base_url));
        }
        if self.chat_model.trim().is_empty() {
            return Err("chat_model must not be empty".to_string());
        }
        if self.embedding_model.trim().is_empty() {
            return Err("embedding_model must not be empty".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }
        if self.max_attempts == 0 {
            return Err("max_attempts must be greater than 0".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err("temperature must be in [0, 2]".to_string());
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

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            chat_model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            timeout_secs: 120,
            max_attempts: 1,
            temperature: 0.0,
        }
    }
}
