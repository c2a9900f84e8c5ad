//! Query mentions and their mapping onto graph entities

use futures::future::try_join_all;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, warn};
use unigraph_domain::{cosine_similarity, Entity};
use unigraph_llm::{embed_with_retry, extract_json, LlmError, Oracle, RetryPolicy};

/// Header of the mention extraction prompt
pub const MENTION_EXTRACTOR: &str = "[DEFINE AGENT: Mention Extractor]";

const MENTION_EXTRACTION: &str = r#"
[DEFINE AGENT: Mention Extractor]
    [DEFINE PERSONA:]
        You are an expert in finding the entities a question is about.
    [END PERSONA]

    [DEFINE INPUT]
        query: ${ {{query}} }$
    [END INPUT]

    [DEFINE CONSTRAINTS]
        faithfulness: Only extract names and concepts that appear in the <REF> query </REF>; never invent names.
        focus: Keep the protagonist entities the query is about, usually nouns, and drop supporting ones.
        output format: Output a JSON array of strings, for example ["糖尿病", "高血压"].
    [END CONSTRAINTS]

    [DEFINE INSTRUCTION]
        [COMMAND-1 <apply-constraints> faithfulness </apply-constraints> Find the named entities and the general concepts in the <REF> query </REF> that matter for answering it.]
        [COMMAND-2 <apply-constraints> focus </apply-constraints> Keep the most suitable entities; each one will be used to search the knowledge base.]
        [COMMAND-3 <apply-constraints> output format </apply-constraints> Use the specified format constraint to output your answer.]
    [END INSTRUCTION]
[END AGENT]
"#;

/// Render the mention extraction prompt
pub fn mention_prompt(query: &str) -> String {
    MENTION_EXTRACTION.replace("{{query}}", query).trim().to_string()
}

fn parse_mentions(reply: &str) -> Result<Vec<String>, String> {
    let json = extract_json(reply).map_err(|e| e.to_string())?;
    let mentions: Vec<String> =
        serde_json::from_str(&json).map_err(|e| format!("Invalid mention list: {}", e))?;
    let mut seen = HashSet::new();
    Ok(mentions
        .into_iter()
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty() && seen.insert(m.clone()))
        .collect())
}

/// Ask the oracle for the entities `query` mentions
///
/// A reply that is not a JSON string array is requested again, `attempts`
/// times in total; when every reply fails to parse, or the list is empty,
/// the query itself is the only mention. Provider errors are returned.
pub async fn extract_mentions(
    oracle: &dyn Oracle,
    query: &str,
    attempts: u32,
) -> Result<Vec<String>, LlmError> {
    let prompt = mention_prompt(query);
    for attempt in 1..=attempts.max(1) {
        let reply = oracle.get_response(&prompt).await?;
        match parse_mentions(&reply) {
            Ok(mentions) if !mentions.is_empty() => {
                debug!("Query mentions: {:?}", mentions);
                return Ok(mentions);
            }
            Ok(_) => break,
            Err(e) => debug!("Mention attempt {}/{}: {}", attempt, attempts, e),
        }
    }
    warn!("No mentions extracted; searching with the query itself");
    Ok(vec![query.to_string()])
}

/// An entity matched to a query mention
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappedEntity {
    /// Matched entity id
    pub entity_id: String,
    /// Best cosine similarity over all mentions
    pub similarity: f32,
}

/// Map mentions to the `top_k` most similar entities
///
/// Each mention embedding is requested under `retry`; an error is returned
/// only once a mention's attempts are used up. Entities without an embedding, or whose embedding dimension differs from
/// the mention's, are skipped. Each entity appears once with its highest
/// similarity; the list is sorted by similarity, ties by entity id.
pub async fn map_mentions(
    oracle: &dyn Oracle,
    mentions: &[String],
    entities: &[Entity],
    top_k: usize,
    retry: RetryPolicy,
) -> Result<Vec<MappedEntity>, LlmError> {
    let vectors =
        try_join_all(mentions.iter().map(|m| embed_with_retry(oracle, m, retry))).await?;

    let mut best: Vec<Option<f32>> = vec![None; entities.len()];
    for vector in &vectors {
        for (slot, entity) in best.iter_mut().zip(entities) {
            if !entity.has_embedding() || entity.attributes_embedding.len() != vector.len() {
                continue;
            }
            let similarity = cosine_similarity(vector, &entity.attributes_embedding);
            if slot.is_none_or(|s| similarity > s) {
                *slot = Some(similarity);
            }
        }
    }

    let mut seen = HashSet::new();
    let mut mapped: Vec<MappedEntity> = entities
        .iter()
        .zip(best)
        .filter_map(|(entity, similarity)| {
            similarity.map(|similarity| MappedEntity {
                entity_id: entity.id.clone(),
                similarity,
            })
        })
        .collect();
    mapped.sort_by(|a, b| {
        b.similarity
            .total_cmp(&a.similarity)
            .then_with(|| a.entity_id.cmp(&b.entity_id))
    });
    mapped.retain(|m| seen.insert(m.entity_id.clone()));
    mapped.truncate(top_k);
    Ok(mapped)
}
