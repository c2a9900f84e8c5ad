//! Schema induction from seed text
//!
//! Induction walks the chunks in order, because every chunk refines two
//! cumulative dictionaries (entity types and relation types) that the next
//! chunk is classified against:
//!
//! 1. mine `(head, relation, tail): source` triples from the chunk
//! 2. classify the entity names and relation phrases (two concurrent calls)
//! 3. merge the proposed types into the dictionaries by embedding similarity
//! 4. ask for attribute keys of entity types that have none yet
//! 5. turn every mined triple into a candidate schema entry
//!
//! After the last chunk the candidates are deduplicated and the surviving
//! types are defined in batches.

use crate::config::InductionConfig;
use crate::error::ExtractorError;
use crate::gate::JobGate;
use crate::language::Language;
use crate::prompt;
use crate::protocol::{
    parse_classification, parse_definitions, parse_mined_triples, MinedTriple, ProtocolError,
};
use crate::types::{InductionMetadata, InductionRequest, InductionResult};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use unigraph_domain::{
    cosine_similarity, Definitions, EntityTypeRef, InducedSchema, SchemaEntry, TripleId, TypeName,
};
use unigraph_llm::{LlmError, Oracle};

/// Similarity margin below the merge threshold at which a pair of types is
/// reported as a near duplicate
const NEAR_DUPLICATE_MARGIN: f32 = 0.1;

/// Cumulative type to member dictionary
#[derive(Debug, Default, Clone, PartialEq)]
struct TypeDictionary {
    types: IndexMap<String, Vec<String>>,
}

impl TypeDictionary {
    /// First type listing `item`
    fn type_of(&self, item: &str) -> Option<&str> {
        self.types
            .iter()
            .find(|(_, members)| members.iter().any(|m| m == item))
            .map(|(name, _)| name.as_str())
    }

    fn extend(&mut self, type_name: String, items: Vec<String>) {
        let members = self.types.entry(type_name).or_default();
        for item in items {
            if !members.contains(&item) {
                members.push(item);
            }
        }
    }
}

/// Discovers entity types, relation types and definitions from seed text
pub struct SchemaInducer {
    oracle: Arc<dyn Oracle>,
    config: InductionConfig,
}

impl SchemaInducer {
    /// Create an inducer, validating `config`
    pub fn new(oracle: Arc<dyn Oracle>, config: InductionConfig) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;
        Ok(Self { oracle, config })
    }

    /// Induction configuration
    pub fn config(&self) -> &InductionConfig {
        &self.config
    }

    /// Induce a schema from `request`
    ///
    /// Provider errors abort the job; unparseable or unmappable entries are
    /// skipped.
    pub async fn induce(
        &self,
        gate: &JobGate,
        request: &InductionRequest,
    ) -> Result<InductionResult, ExtractorError> {
        if request.aim.trim().is_empty() {
            return Err(ExtractorError::InvalidRequest("aim is empty".to_string()));
        }
        let Some(first) = request.chunks.iter().find(|c| !c.trim().is_empty()) else {
            return Err(ExtractorError::InvalidRequest(
                "no non-empty chunks to induce from".to_string(),
            ));
        };

        let _guard = gate.enter().await;
        let start = Instant::now();
        let language = Language::detect(first);
        info!(
            "Starting schema induction over {} chunks in {}",
            request.chunks.len(),
            language
        );

        let mut job = InductionJob {
            oracle: self.oracle.as_ref(),
            config: &self.config,
            language,
            embeddings: HashMap::new(),
            entity_types: TypeDictionary::default(),
            relation_types: TypeDictionary::default(),
            attributes: IndexMap::new(),
            candidates: Vec::new(),
            unmapped: 0,
        };

        for (index, chunk) in request.chunks.iter().enumerate() {
            if chunk.trim().is_empty() {
                continue;
            }
            job.process_chunk(&request.aim, request.suggestion.as_deref(), chunk)
                .await?;
            debug!(
                "Chunk {}: {} entity types, {} relation types, {} candidates",
                index,
                job.entity_types.types.len(),
                job.relation_types.types.len(),
                job.candidates.len()
            );
        }

        let candidate_entries = job.candidates.len();
        let entries = job.finalize_entries();
        let definitions = job.define(&request.aim, &entries).await?;

        let processing_time_ms = start.elapsed().as_millis() as u64;
        info!(
            "Schema induction complete: {} entries, {} definitions, {} unmapped triples in {}ms",
            entries.len(),
            definitions.len(),
            job.unmapped,
            processing_time_ms
        );

        Ok(InductionResult {
            schema: InducedSchema::new(entries, definitions),
            metadata: InductionMetadata {
                model_name: self.oracle.model_name().to_string(),
                language: language.to_string(),
                chunks: request.chunks.len(),
                candidate_entries,
                unmapped: job.unmapped,
                processing_time_ms,
            },
        })
    }
}

struct InductionJob<'a> {
    oracle: &'a dyn Oracle,
    config: &'a InductionConfig,
    language: Language,
    embeddings: HashMap<String, Vec<f32>>,
    entity_types: TypeDictionary,
    relation_types: TypeDictionary,
    attributes: IndexMap<String, Vec<String>>,
    candidates: Vec<SchemaEntry>,
    unmapped: usize,
}

impl InductionJob<'_> {
    async fn ask(&self, prompt: String) -> Result<String, ExtractorError> {
        match timeout(self.config.call_timeout(), self.oracle.get_response(&prompt)).await {
            Ok(reply) => Ok(reply?),
            Err(_) => Err(ExtractorError::Timeout),
        }
    }

    async fn embed(&mut self, text: &str) -> Result<Vec<f32>, ExtractorError> {
        if let Some(vector) = self.embeddings.get(text) {
            return Ok(vector.clone());
        }
        let oracle = self.oracle;
        let limit = self.config.call_timeout();
        let result = self
            .config
            .embedding_retry()
            .run(|| async move {
                timeout(limit, oracle.get_vector(text))
                    .await
                    .unwrap_or(Err(LlmError::Timeout))
            })
            .await;
        let vector = match result {
            Ok(vector) => vector,
            Err(LlmError::Timeout) => return Err(ExtractorError::Timeout),
            Err(e) => return Err(e.into()),
        };
        self.embeddings.insert(text.to_string(), vector.clone());
        Ok(vector)
    }

    async fn process_chunk(
        &mut self,
        aim: &str,
        suggestion: Option<&str>,
        chunk: &str,
    ) -> Result<(), ExtractorError> {
        let language = self.language.to_string();

        let reply = self
            .ask(prompt::triple_mining(aim, suggestion, chunk, &language))
            .await?;
        let mined = parse_mined_triples(&reply);
        mined.log_errors("triple mining");
        if mined.records.is_empty() {
            debug!("No triples mined from chunk");
            return Ok(());
        }

        let mut entity_names: Vec<&str> = Vec::new();
        let mut relation_names: Vec<&str> = Vec::new();
        for triple in &mined.records {
            for name in [triple.head.as_str(), triple.tail.as_str()] {
                if !entity_names.contains(&name) {
                    entity_names.push(name);
                }
            }
            if !relation_names.contains(&triple.relation.as_str()) {
                relation_names.push(&triple.relation);
            }
        }

        let entity_prompt = prompt::entity_classification(&entity_names.join(", "), &language);
        let relation_prompt =
            prompt::relation_classification(&relation_names.join(", "), &language);
        let (entity_reply, relation_reply) =
            futures::join!(self.ask(entity_prompt), self.ask(relation_prompt));
        let (entity_reply, relation_reply) = (entity_reply?, relation_reply?);

        let proposed_entities = parse_classification(&entity_reply);
        proposed_entities.log_errors("entity classification");
        let proposed_relations = parse_classification(&relation_reply);
        proposed_relations.log_errors("relation classification");

        let mut entity_types = std::mem::take(&mut self.entity_types);
        self.merge(&mut entity_types, proposed_entities.records).await?;
        self.entity_types = entity_types;

        let mut relation_types = std::mem::take(&mut self.relation_types);
        self.merge(&mut relation_types, proposed_relations.records).await?;
        self.relation_types = relation_types;

        self.reason_attributes().await?;

        for triple in mined.records {
            match self.candidate(&triple) {
                Some(entry) => self.candidates.push(entry),
                None => self.unmapped += 1,
            }
        }
        Ok(())
    }

    /// Merge proposed types into `dictionary`
    ///
    /// An exact name match extends that type; otherwise the proposed type
    /// joins the most similar existing type when the cosine similarity of
    /// their name embeddings exceeds the merge threshold, and is added as a
    /// new type if not.
    async fn merge(
        &mut self,
        dictionary: &mut TypeDictionary,
        proposed: IndexMap<String, Vec<String>>,
    ) -> Result<(), ExtractorError> {
        for (name, items) in proposed {
            if dictionary.types.contains_key(&name) {
                dictionary.extend(name, items);
                continue;
            }

            let candidate = self.embed(&name).await?;
            let existing: Vec<String> = dictionary.types.keys().cloned().collect();
            let mut best: Option<(String, f32)> = None;
            for other in existing {
                let vector = self.embed(&other).await?;
                let similarity = cosine_similarity(&candidate, &vector);
                if best.as_ref().map_or(true, |(_, s)| similarity > *s) {
                    best = Some((other, similarity));
                }
            }

            let target = match best {
                Some((other, similarity)) if similarity > self.config.merge_threshold => {
                    debug!("Merged type '{}' into '{}' ({:.3})", name, other, similarity);
                    other
                }
                Some((other, similarity))
                    if similarity > self.config.merge_threshold - NEAR_DUPLICATE_MARGIN =>
                {
                    warn!(
                        "Types '{}' and '{}' look alike ({:.3}) but stay distinct",
                        name, other, similarity
                    );
                    name
                }
                _ => name,
            };
            dictionary.extend(target, items);
        }
        Ok(())
    }

    async fn reason_attributes(&mut self) -> Result<(), ExtractorError> {
        let pending: Vec<String> = self
            .entity_types
            .types
            .keys()
            .filter(|t| !self.attributes.contains_key(*t))
            .cloned()
            .collect();
        if pending.is_empty() {
            return Ok(());
        }

        let reply = self
            .ask(prompt::attribute_reasoning(
                &pending.join("，"),
                &self.language.to_string(),
            ))
            .await?;
        let parsed = parse_classification(&reply);
        parsed.log_errors("attribute reasoning");

        for type_name in &pending {
            self.attributes.insert(type_name.clone(), Vec::new());
        }
        for (type_name, keys) in parsed.records {
            match self.attributes.get_mut(&type_name) {
                Some(existing) => {
                    for key in keys {
                        if !existing.contains(&key) {
                            existing.push(key);
                        }
                    }
                }
                None => debug!(
                    "attribute reasoning: skipped entry: {}",
                    ProtocolError::unmapped(&type_name, "not a pending entity type")
                ),
            }
        }
        Ok(())
    }

    fn type_ref(&self, type_name: &str) -> EntityTypeRef {
        EntityTypeRef::new(
            type_name,
            self.attributes.get(type_name).cloned().unwrap_or_default(),
        )
    }

    fn candidate(&self, triple: &MinedTriple) -> Option<SchemaEntry> {
        let canonical = TripleId::canonical(&triple.head, &triple.relation, &triple.tail);
        let (Some(head), Some(relation), Some(tail)) = (
            self.entity_types.type_of(&triple.head),
            self.relation_types.type_of(&triple.relation),
            self.entity_types.type_of(&triple.tail),
        ) else {
            debug!(
                "triple mining: skipped entry: {}",
                ProtocolError::unmapped(&canonical, "member has no induced type")
            );
            return None;
        };

        let mut provenance = IndexMap::new();
        provenance.insert(canonical, triple.source.clone());
        Some(SchemaEntry {
            head: self.type_ref(head),
            relation: TypeName::new(relation),
            tail: self.type_ref(tail),
            provenance,
        })
    }

    /// Deduplicate candidates by type key, keeping the latest entry with
    /// provenance, and drop keys that never had any
    fn finalize_entries(&mut self) -> Vec<SchemaEntry> {
        let mut by_key: IndexMap<(String, String, String), Option<SchemaEntry>> = IndexMap::new();
        for entry in std::mem::take(&mut self.candidates) {
            let key = {
                let (h, r, t) = entry.key();
                (h.to_string(), r.to_string(), t.to_string())
            };
            let slot = by_key.entry(key).or_insert(None);
            if entry.has_provenance() {
                *slot = Some(entry);
            }
        }

        by_key
            .into_values()
            .flatten()
            .map(|mut entry| {
                entry.head = self.type_ref(entry.head.name.as_str());
                entry.tail = self.type_ref(entry.tail.name.as_str());
                entry
            })
            .collect()
    }

    async fn define(
        &self,
        aim: &str,
        entries: &[SchemaEntry],
    ) -> Result<Definitions, ExtractorError> {
        let mut names: Vec<&str> = Vec::new();
        for entry in entries {
            for name in [entry.head.name.as_str(), entry.tail.name.as_str()] {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        for entry in entries {
            if !names.contains(&entry.relation.as_str()) {
                names.push(entry.relation.as_str());
            }
        }

        let language = self.language.to_string();
        let mut definitions = Definitions::new();
        for batch in names.chunks(self.config.definition_batch_size) {
            let reply = self
                .ask(prompt::type_definition(aim, &batch.join(", "), &language))
                .await?;
            let parsed = parse_definitions(&reply);
            parsed.log_errors("type definition");
            for (name, definition) in parsed.records {
                if batch.contains(&name.as_str()) {
                    definitions.entry(name).or_insert(definition);
                } else {
                    debug!(
                        "type definition: skipped entry: {}",
                        ProtocolError::unmapped(&name, "not in the requested batch")
                    );
                }
            }
        }
        Ok(definitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unigraph_llm::MockOracle;

    fn inducer(oracle: &MockOracle) -> SchemaInducer {
        let config = InductionConfig {
            embedding_backoff_ms: 1,
            ..Default::default()
        };
        SchemaInducer::new(Arc::new(oracle.clone()), config).unwrap()
    }

    fn scripted() -> MockOracle {
        let oracle = MockOracle::default();
        oracle.add_response("Triple Miner", "(小明, 喜欢, 数学): '小明喜欢数学'");
        oracle.add_response("Entity Classifier", "人物: 小明\n学科: 数学");
        oracle.add_response("Relation Classifier", "喜欢: 喜欢");
        oracle.add_response("Attribute Reasoner", "人物: 年龄, 性别\n学科: 领域");
        oracle.add_response("Type Definer", "人物: 人\n学科: 知识领域\n喜欢: 表示偏好");
        oracle
    }

    #[tokio::test]
    async fn test_single_chunk_induction() {
        let oracle = scripted();
        let request = InductionRequest::new("学生兴趣", vec!["小明喜欢数学".to_string()]);

        let result = inducer(&oracle).induce(&JobGate::new(), &request).await.unwrap();
        let schema = result.schema;

        assert_eq!(schema.entries.len(), 1);
        let entry = &schema.entries[0];
        assert_eq!(entry.key(), ("人物", "喜欢", "学科"));
        assert_eq!(entry.head.attributes, vec!["年龄", "性别"]);
        assert_eq!(entry.provenance["(小明, 喜欢, 数学)"], "小明喜欢数学");
        assert_eq!(schema.definitions["喜欢"], "表示偏好");
        assert_eq!(result.metadata.language, "Chinese");
        assert!(oracle.prompts()[0].contains("Chinese"));
    }

    #[tokio::test]
    async fn test_definition_order_entity_types_first() {
        let oracle = scripted();
        let request = InductionRequest::new("学生兴趣", vec!["小明喜欢数学".to_string()]);

        let result = inducer(&oracle).induce(&JobGate::new(), &request).await.unwrap();
        let keys: Vec<&str> = result.schema.definitions.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["人物", "学科", "喜欢"]);
    }

    #[tokio::test]
    async fn test_similar_types_merge_across_chunks() {
        let oracle = MockOracle::default();
        oracle.add_response("${ 小红喜欢语文 }$", "(小红, 喜欢, 语文): '小红喜欢语文'");
        oracle.add_response("Triple Miner", "(小明, 喜欢, 数学): '小明喜欢数学'");
        oracle.add_response("${ 小红, 语文 }$", "People: 小红\nSubject: 语文");
        oracle.add_response("Entity Classifier", "Person: 小明\nSubject: 数学");
        oracle.add_response("Relation Classifier", "喜欢: 喜欢");
        oracle.add_vector("Person", vec![1.0, 0.0]);
        oracle.add_vector("People", vec![0.99, 0.05]);

        let request = InductionRequest::new(
            "interests",
            vec!["小明喜欢数学".to_string(), "小红喜欢语文".to_string()],
        );
        let result = inducer(&oracle).induce(&JobGate::new(), &request).await.unwrap();

        let entry_keys: Vec<_> = result.schema.entries.iter().map(|e| e.key()).collect();
        assert_eq!(entry_keys, vec![("Person", "喜欢", "Subject")]);
        assert_eq!(result.metadata.candidate_entries, 2);
        // The latest entry with provenance wins
        assert!(result.schema.entries[0]
            .provenance
            .contains_key("(小红, 喜欢, 语文)"));
    }

    #[tokio::test]
    async fn test_merge_is_idempotent() {
        let oracle = MockOracle::default();
        let config = InductionConfig::default();
        let mut job = InductionJob {
            oracle: &oracle,
            config: &config,
            language: Language::English,
            embeddings: HashMap::new(),
            entity_types: TypeDictionary::default(),
            relation_types: TypeDictionary::default(),
            attributes: IndexMap::new(),
            candidates: Vec::new(),
            unmapped: 0,
        };

        let mut proposed = IndexMap::new();
        proposed.insert("Person".to_string(), vec!["Alice".to_string(), "Bob".to_string()]);
        proposed.insert("Place".to_string(), vec!["Paris".to_string()]);

        let mut dictionary = TypeDictionary::default();
        job.merge(&mut dictionary, proposed.clone()).await.unwrap();
        let once = dictionary.clone();
        job.merge(&mut dictionary, proposed).await.unwrap();

        assert_eq!(dictionary, once);
        assert_eq!(dictionary.types["Person"], vec!["Alice", "Bob"]);
    }

    #[tokio::test]
    async fn test_merge_by_embedding_similarity() {
        let oracle = MockOracle::default();
        oracle.add_vector("Person", vec![1.0, 0.0]);
        oracle.add_vector("People", vec![0.99, 0.05]);
        oracle.add_vector("City", vec![0.0, 1.0]);
        let config = InductionConfig::default();
        let mut job = InductionJob {
            oracle: &oracle,
            config: &config,
            language: Language::English,
            embeddings: HashMap::new(),
            entity_types: TypeDictionary::default(),
            relation_types: TypeDictionary::default(),
            attributes: IndexMap::new(),
            candidates: Vec::new(),
            unmapped: 0,
        };

        let mut dictionary = TypeDictionary::default();
        dictionary.extend("Person".to_string(), vec!["Alice".to_string()]);

        let mut proposed = IndexMap::new();
        proposed.insert("People".to_string(), vec!["Bob".to_string(), "Alice".to_string()]);
        proposed.insert("City".to_string(), vec!["Paris".to_string()]);
        job.merge(&mut dictionary, proposed).await.unwrap();

        assert_eq!(dictionary.types.len(), 2);
        assert_eq!(dictionary.types["Person"], vec!["Alice", "Bob"]);
        assert_eq!(dictionary.type_of("Paris"), Some("City"));
    }

    #[tokio::test]
    async fn test_unmapped_triples_dropped() {
        let oracle = MockOracle::default();
        oracle.add_response(
            "Triple Miner",
            "(Alice, likes, maths): 'Alice likes maths'\n(Alice, visits, Paris): 'Alice visits Paris'",
        );
        oracle.add_response("Entity Classifier", "Person: Alice\nSubject: maths");
        oracle.add_response("Relation Classifier", "likes: likes\nvisits: visits");

        let request = InductionRequest::new("interests", vec!["Alice likes maths".to_string()]);
        let result = inducer(&oracle).induce(&JobGate::new(), &request).await.unwrap();

        assert_eq!(result.schema.entries.len(), 1);
        assert_eq!(result.metadata.unmapped, 1);
        assert_eq!(result.metadata.language, "English");
    }

    #[tokio::test]
    async fn test_entries_without_provenance_dropped() {
        let oracle = MockOracle::default();
        oracle.add_response("Triple Miner", "(Alice, likes, maths)");
        oracle.add_response("Entity Classifier", "Person: Alice\nSubject: maths");
        oracle.add_response("Relation Classifier", "likes: likes");

        let request = InductionRequest::new("interests", vec!["Alice likes maths".to_string()]);
        let result = inducer(&oracle).induce(&JobGate::new(), &request).await.unwrap();

        assert!(result.schema.entries.is_empty());
        assert_eq!(result.metadata.candidate_entries, 1);
        assert_eq!(oracle.prompts_containing("Type Definer"), 0);
    }

    #[tokio::test]
    async fn test_latest_entry_with_provenance_kept() {
        let oracle = MockOracle::default();
        oracle.add_response(
            "Triple Miner",
            "(Alice, likes, maths): 'first'\n(Bob, likes, art): 'second'\n(Alice, likes, art)",
        );
        oracle.add_response("Entity Classifier", "Person: Alice, Bob\nSubject: maths, art");
        oracle.add_response("Relation Classifier", "likes: likes");

        let request = InductionRequest::new("interests", vec!["text".to_string()]);
        let result = inducer(&oracle).induce(&JobGate::new(), &request).await.unwrap();

        assert_eq!(result.schema.entries.len(), 1);
        assert_eq!(
            result.schema.entries[0].provenance.get("(Bob, likes, art)").map(String::as_str),
            Some("second")
        );
    }

    #[tokio::test]
    async fn test_definitions_batched() {
        let oracle = MockOracle::default();
        let mined: Vec<String> = (0..6)
            .map(|i| format!("(e{i}, r{i}, f{i}): 's{i}'"))
            .collect();
        oracle.add_response("Triple Miner", mined.join("\n"));
        let entity_lines: Vec<String> = (0..6).map(|i| format!("T{i}: e{i}, f{i}")).collect();
        oracle.add_response("Entity Classifier", entity_lines.join("\n"));
        let relation_lines: Vec<String> = (0..6).map(|i| format!("R{i}: r{i}")).collect();
        oracle.add_response("Relation Classifier", relation_lines.join("\n"));

        let request = InductionRequest::new("aim", vec!["text".to_string()]);
        inducer(&oracle).induce(&JobGate::new(), &request).await.unwrap();

        // 6 entity types + 6 relation types in batches of 10
        assert_eq!(oracle.prompts_containing("Type Definer"), 2);
    }

    #[tokio::test]
    async fn test_provider_error_aborts() {
        let failing = MockOracle::default();
        failing.add_response("Triple Miner", "(小明, 喜欢, 数学): '小明喜欢数学'");
        failing.add_error("Relation Classifier", "service unavailable");

        let request = InductionRequest::new("aim", vec!["小明喜欢数学".to_string()]);
        let err = inducer(&failing).induce(&JobGate::new(), &request).await.unwrap_err();
        match err {
            ExtractorError::Provider(LlmError::Communication(message)) => {
                assert_eq!(message, "service unavailable")
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_type_embedding_failure_is_retried() {
        let oracle = scripted();
        oracle.fail_vector("人物", 1);

        let request = InductionRequest::new("学生兴趣", vec!["小明喜欢数学".to_string()]);
        let result = inducer(&oracle).induce(&JobGate::new(), &request).await.unwrap();
        assert_eq!(result.schema.entries[0].key(), ("人物", "喜欢", "学科"));
        // 人物 twice, then 学科 and 喜欢 once each
        assert_eq!(oracle.embed_count(), 4);
    }

    #[tokio::test]
    async fn test_type_embedding_gives_up_after_attempts() {
        let oracle = scripted();
        oracle.fail_vector("人物", usize::MAX);

        let request = InductionRequest::new("学生兴趣", vec!["小明喜欢数学".to_string()]);
        let err = inducer(&oracle).induce(&JobGate::new(), &request).await.unwrap_err();
        assert!(matches!(err, ExtractorError::Provider(LlmError::Communication(_))));
        assert_eq!(oracle.embed_count(), 3);
    }

    #[tokio::test]
    async fn test_empty_request_rejected() {
        let oracle = MockOracle::default();
        let request = InductionRequest::new("aim", vec!["   ".to_string()]);
        let err = inducer(&oracle).induce(&JobGate::new(), &request).await.unwrap_err();
        assert!(matches!(err, ExtractorError::InvalidRequest(_)));

        let request = InductionRequest::new(" ", vec!["text".to_string()]);
        let err = inducer(&oracle).induce(&JobGate::new(), &request).await.unwrap_err();
        assert!(matches!(err, ExtractorError::InvalidRequest(_)));
        assert_eq!(oracle.call_count(), 0);
    }

    #[tokio::test]
    async fn test_suggestion_reaches_mining_prompt() {
        let oracle = scripted();
        let request = InductionRequest::new("aim", vec!["小明喜欢数学".to_string()])
            .with_suggestion("focus on hardware entities");
        inducer(&oracle).induce(&JobGate::new(), &request).await.unwrap();
        assert_eq!(oracle.prompts_containing("focus on hardware entities"), 1);
    }
}
