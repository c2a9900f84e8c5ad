//! OpenAI-compatible provider
//!
//! Talks to any server exposing `/chat/completions` and `/embeddings` with
//! the OpenAI request/response shapes (OpenAI, vLLM, Ollama's `/v1`, ...).
//!
//! # Examples
//!
//! ```no_run
//! use unigraph_llm::{OpenAiCompatibleOracle, OracleConfig};
//!
//! let config = OracleConfig {
//!     base_url: "http://localhost:11434/v1".to_string(),
//!     chat_model: "qwen2.5".to_string(),
//!     ..Default::default()
//! };
//! let oracle = OpenAiCompatibleOracle::new(config).unwrap();
//! ```

use crate::config::OracleConfig;
use crate::{LlmError, Oracle};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const CHAT_PATH: &str = "chat/completions";
const EMBEDDINGS_PATH: &str = "embeddings";

/// Provider for OpenAI-compatible HTTP APIs
pub struct OpenAiCompatibleOracle {
    config: OracleConfig,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAiCompatibleOracle {
    /// Create a provider from validated configuration
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Config` if the configuration is invalid or the
    /// HTTP client cannot be built.
    pub fn new(config: OracleConfig) -> Result<Self, LlmError> {
        config.validate().map_err(LlmError::Config)?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| LlmError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// The configuration this provider was built with
    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    /// Attempts granted to a request to `path`
    ///
    /// Only embeddings are repeated; a failed completion is reported at once.
    fn attempts_for(&self, path: &str) -> u32 {
        if path == EMBEDDINGS_PATH {
            self.config.max_attempts.max(1)
        } else {
            1
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// POST `body` to `path`
    ///
    /// Transient failures of embedding requests are retried with exponential
    /// backoff.
    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, LlmError>
    where
        B: Serialize + Sync,
        R: serde::de::DeserializeOwned,
    {
        let url = self.endpoint(path);
        let max_attempts = self.attempts_for(path);
        let mut attempts = 0;
        let mut last_error = None;

        while attempts < max_attempts {
            let mut request = self.client.post(&url).json(body);
            if !self.config.api_key.is_empty() {
                request = request.bearer_auth(&self.config.api_key);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.json::<R>().await.map_err(|e| {
                            LlmError::InvalidResponse(format!("Failed to parse response: {}", e))
                        });
                    }
                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(LlmError::ModelNotAvailable(format!(
                            "{} ({})",
                            self.config.chat_model, url
                        )));
                    }
                    let error = if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        LlmError::RateLimitExceeded
                    } else {
                        let error_text = response
                            .text()
                            .await
                            .unwrap_or_else(|_| "Unknown error".to_string());
                        LlmError::Communication(format!("HTTP {}: {}", status, error_text))
                    };
                    if status.is_client_error() && status != reqwest::StatusCode::TOO_MANY_REQUESTS {
                        return Err(error);
                    }
                    last_error = Some(error);
                }
                Err(e) if e.is_timeout() => {
                    last_error = Some(LlmError::Timeout);
                }
                Err(e) => {
                    last_error = Some(LlmError::Communication(format!("Request failed: {}", e)));
                }
            }

            attempts += 1;
            if attempts < max_attempts {
                // Exponential backoff: 1s, 2s, 4s, etc.
                let delay = Duration::from_secs(2u64.pow(attempts - 1));
                warn!("Request to {} failed, retrying in {:?}", url, delay);
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_error.unwrap_or_else(|| LlmError::Communication("Max retries exceeded".to_string())))
    }
}

#[async_trait]
impl Oracle for OpenAiCompatibleOracle {
    async fn get_response(&self, prompt: &str) -> Result<String, LlmError> {
        debug!("Completion request: {} chars to {}", prompt.len(), self.config.chat_model);
        let request = ChatRequest {
            model: &self.config.chat_model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.config.temperature,
        };

        let response: ChatResponse = self.post_json(CHAT_PATH, &request).await?;
        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("Missing content".to_string()))
    }

    async fn get_vector(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let request = EmbeddingRequest {
            model: &self.config.embedding_model,
            input: text,
        };

        let response: EmbeddingResponse = self.post_json(EMBEDDINGS_PATH, &request).await?;
        let embedding = response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| LlmError::InvalidResponse("Missing embedding".to_string()))?;
        if embedding.is_empty() {
            return Err(LlmError::InvalidResponse("Empty embedding".to_string()));
        }
        Ok(embedding)
    }

    fn model_name(&self) -> &str {
        &self.config.chat_model
    }
}
