//! Entity attribute embedding with bounded concurrency and retries

use crate::config::IndexerConfig;
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::warn;
use unigraph_domain::Entity;
use unigraph_llm::{LlmError, Oracle};

/// Embeds each entity's attribute text
pub struct EntityEmbedder {
    oracle: Arc<dyn Oracle>,
    permits: Arc<Semaphore>,
    config: IndexerConfig,
}

impl EntityEmbedder {
    /// Create an embedder following the concurrency and retry settings of
    /// `config`
    pub fn new(oracle: Arc<dyn Oracle>, config: IndexerConfig) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(config.embedding_concurrency.max(1))),
            oracle,
            config,
        }
    }

    /// Store an embedding on every entity; returns the ids that failed
    ///
    /// A failing entity keeps an empty embedding and does not affect the
    /// others.
    pub async fn embed_all(&self, entities: &mut [Entity]) -> Vec<String> {
        let results = join_all(entities.iter().map(|e| self.embed(e.attribute_text()))).await;

        let mut failed = Vec::new();
        for (entity, result) in entities.iter_mut().zip(results) {
            match result {
                Ok(vector) => entity.attributes_embedding = vector,
                Err(e) => {
                    warn!("Embedding failed for entity {} ({}): {}", entity.id, entity.name, e);
                    entity.attributes_embedding.clear();
                    failed.push(entity.id.clone());
                }
            }
        }
        failed
    }

    async fn embed(&self, text: String) -> Result<Vec<f32>, LlmError> {
        let text = text.as_str();
        let vector = self
            .config
            .embedding_retry()
            .run(|| async move {
                // The semaphore is never closed
                let _permit = self.permits.acquire().await.ok();
                self.oracle.get_vector(text).await
            })
            .await?;
        if vector.is_empty() {
            return Err(LlmError::InvalidResponse("empty embedding".to_string()));
        }
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use unigraph_domain::TypeName;
    use unigraph_llm::MockOracle;

    fn entity(id: &str, name: &str) -> Entity {
        Entity {
            id: id.to_string(),
            name: name.to_string(),
            entity_type: TypeName::new("Person"),
            attributes: BTreeMap::new(),
            attributes_embedding: vec![],
            community_ids: BTreeMap::new(),
        }
    }

    fn fast_config(attempts: u32) -> IndexerConfig {
        IndexerConfig {
            embedding_attempts: attempts,
            embedding_backoff_ms: 1,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_embeds_attribute_text() {
        let oracle = MockOracle::default();
        oracle.add_vector("name: 小明", vec![1.0, 0.0]);
        let embedder = EntityEmbedder::new(Arc::new(oracle), fast_config(3));

        let mut entities = vec![entity("e1", "小明")];
        let failed = embedder.embed_all(&mut entities).await;
        assert!(failed.is_empty());
        assert_eq!(entities[0].attributes_embedding, vec![1.0, 0.0]);
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let oracle = MockOracle::default();
        oracle.fail_vector("name: 小明", 2);
        let embedder = EntityEmbedder::new(Arc::new(oracle.clone()), fast_config(3));

        let mut entities = vec![entity("e1", "小明")];
        let failed = embedder.embed_all(&mut entities).await;
        assert!(failed.is_empty());
        assert!(entities[0].has_embedding());
        assert_eq!(oracle.embed_count(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_entity_is_excluded_alone() {
        let oracle = MockOracle::default();
        oracle.fail_vector("name: 小红", usize::MAX);
        let embedder = EntityEmbedder::new(Arc::new(oracle.clone()), fast_config(3));

        let mut entities = vec![entity("e1", "小明"), entity("e2", "小红")];
        let failed = embedder.embed_all(&mut entities).await;
        assert_eq!(failed, vec!["e2".to_string()]);
        assert!(entities[0].has_embedding());
        assert!(!entities[1].has_embedding());
        // One call for 小明, three attempts for 小红
        assert_eq!(oracle.embed_count(), 4);
    }
}
