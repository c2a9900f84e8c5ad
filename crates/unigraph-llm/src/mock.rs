//! Scripted oracle for deterministic testing

use crate::{LlmError, Oracle};
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Default embedding dimension of the mock
pub const DEFAULT_DIMENSION: usize = 64;

#[derive(Debug, Clone)]
struct ResponseRule {
    pattern: String,
    reply: Result<String, String>,
}

#[derive(Debug, Default)]
struct VectorFailure {
    remaining: usize,
    message: String,
}

/// Mock oracle that replays scripted responses without any network calls
///
/// Completion rules match when the prompt *contains* the rule's pattern; the
/// first matching rule wins and the default response is returned otherwise.
/// Embeddings come from explicit vector rules (exact text match) or, failing
/// that, from a deterministic hash of the text.
///
/// Clones share all state, so a test can keep a handle for assertions after
/// handing the oracle to a component.
///
/// # Examples
///
/// ```
/// use unigraph_llm::{MockOracle, Oracle};
///
/// # #[tokio::main]
/// # async fn main() {
/// let oracle = MockOracle::default();
/// oracle.add_response("Triples Extractor", "(小明, 喜欢, 数学)");
/// oracle.add_error("Attribute Extractor", "boom");
///
/// assert_eq!(
///     oracle.get_response("[DEFINE AGENT: Triples Extractor]").await.unwrap(),
///     "(小明, 喜欢, 数学)"
/// );
/// assert!(oracle.get_response("[DEFINE AGENT: Attribute Extractor]").await.is_err());
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MockOracle {
    default_response: String,
    dimension: usize,
    latency: Option<Duration>,
    rules: Arc<Mutex<Vec<ResponseRule>>>,
    vectors: Arc<Mutex<HashMap<String, Vec<f32>>>>,
    vector_failures: Arc<Mutex<HashMap<String, VectorFailure>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    embed_count: Arc<Mutex<usize>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockOracle {
    /// Create a mock returning `response` for every unmatched prompt
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            dimension: DEFAULT_DIMENSION,
            latency: None,
            rules: Arc::new(Mutex::new(Vec::new())),
            vectors: Arc::new(Mutex::new(HashMap::new())),
            vector_failures: Arc::new(Mutex::new(HashMap::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            embed_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Set the dimension of hash-derived embeddings
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension.max(1);
        self
    }

    /// Delay every call by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Embedding dimension of hash-derived vectors
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Reply with `response` to any prompt containing `pattern`
    pub fn add_response(&self, pattern: impl Into<String>, response: impl Into<String>) {
        lock(&self.rules).push(ResponseRule {
            pattern: pattern.into(),
            reply: Ok(response.into()),
        });
    }

    /// Fail any prompt containing `pattern`
    pub fn add_error(&self, pattern: impl Into<String>, message: impl Into<String>) {
        lock(&self.rules).push(ResponseRule {
            pattern: pattern.into(),
            reply: Err(message.into()),
        });
    }

    /// Return `vector` when exactly `text` is embedded
    pub fn add_vector(&self, text: impl Into<String>, vector: Vec<f32>) {
        lock(&self.vectors).insert(text.into(), vector);
    }

    /// Fail the next `times` embeddings of exactly `text`
    ///
    /// Use `usize::MAX` for a permanent failure.
    pub fn fail_vector(&self, text: impl Into<String>, times: usize) {
        let text = text.into();
        lock(&self.vector_failures).insert(
            text.clone(),
            VectorFailure {
                remaining: times,
                message: format!("embedding unavailable for '{}'", text),
            },
        );
    }

    /// Number of completion calls made
    pub fn call_count(&self) -> usize {
        lock(&self.prompts).len()
    }

    /// Number of embedding calls made
    pub fn embed_count(&self) -> usize {
        *lock(&self.embed_count)
    }

    /// All prompts received, in call order
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    /// Number of received prompts containing `pattern`
    pub fn prompts_containing(&self, pattern: &str) -> usize {
        lock(&self.prompts)
            .iter()
            .filter(|p| p.contains(pattern))
            .count()
    }

    /// Hash text with a seed to get a deterministic value in [-1, 1]
    fn hash_with_seed(text: &str, seed: u64) -> f32 {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        seed.hash(&mut hasher);
        let hash_value = hasher.finish();
        let normalized = (hash_value as f64 / u64::MAX as f64) * 2.0 - 1.0;
        normalized as f32
    }

    /// Deterministic unit-length embedding of `text`
    pub fn hash_embedding(&self, text: &str) -> Vec<f32> {
        let mut embedding: Vec<f32> = (0..self.dimension)
            .map(|i| Self::hash_with_seed(text, i as u64))
            .collect();

        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut embedding {
                *value /= magnitude;
            }
        }
        embedding
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

impl Default for MockOracle {
    fn default() -> Self {
        Self::new("")
    }
}

#[async_trait]
impl Oracle for MockOracle {
    async fn get_response(&self, prompt: &str) -> Result<String, LlmError> {
        lock(&self.prompts).push(prompt.to_string());
        self.simulate_latency().await;

        let reply = lock(&self.rules)
            .iter()
            .find(|rule| prompt.contains(&rule.pattern))
            .map(|rule| rule.reply.clone());

        match reply {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(LlmError::Communication(message)),
            None => Ok(self.default_response.clone()),
        }
    }

    async fn get_vector(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        *lock(&self.embed_count) += 1;
        self.simulate_latency().await;

        {
            let mut failures = lock(&self.vector_failures);
            if let Some(failure) = failures.get_mut(text) {
                if failure.remaining > 0 {
                    failure.remaining = failure.remaining.saturating_sub(1);
                    return Err(LlmError::Communication(failure.message.clone()));
                }
            }
        }

        if let Some(vector) = lock(&self.vectors).get(text) {
            return Ok(vector.clone());
        }
        Ok(self.hash_embedding(text))
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
