//! Local search context assembly
//!
//! Builds the Reports, Entities, Relationships and Sources tables for a
//! query. Rows are ranked by their relevance to the entities the query maps
//! to and appended until each table reaches its cumulative share of the
//! token budget. The text form and the structured form hold the same rows.

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::mentions::{extract_mentions, map_mentions, MappedEntity};
use crate::tokenizer::{default_tokenizer, Tokenizer};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};
use unigraph_domain::{Community, Entity, Relationship};
use unigraph_llm::Oracle;

/// Convert a 1-based depth into the deepest eligible 0-based level
///
/// # Examples
///
/// ```
/// use unigraph_search::max_level_for_depth;
///
/// assert_eq!(max_level_for_depth(1).unwrap(), 0);
/// assert_eq!(max_level_for_depth(3).unwrap(), 2);
/// assert!(max_level_for_depth(0).is_err());
/// ```
pub fn max_level_for_depth(depth: u32) -> Result<u32, SearchError> {
    depth.checked_sub(1).ok_or(SearchError::InvalidDepth(depth))
}

/// A Reports table row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    /// Community id
    pub id: String,
    /// Report title
    pub title: String,
    /// Report summary
    pub content: String,
}

/// An Entities table row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityRow {
    /// Entity id
    pub id: String,
    /// Entity name
    pub entity: String,
    /// Entity type
    pub entity_type: String,
    /// Attributes as `key: value` pairs
    pub description: String,
}

/// A Relationships table row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationshipRow {
    /// Relationship id
    pub id: String,
    /// Source entity name
    pub source: String,
    /// Target entity name
    pub target: String,
    /// Relation literal
    pub description: String,
}

/// A Sources table row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceRow {
    /// Id of the relationship the sentence supports
    pub id: String,
    /// Source sentence
    pub text: String,
}

/// Structured form of the assembled context
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContextData {
    /// Reports table
    pub reports: Vec<ReportRow>,
    /// Entities table
    pub entities: Vec<EntityRow>,
    /// Relationships table
    pub relationships: Vec<RelationshipRow>,
    /// Sources table
    pub sources: Vec<SourceRow>,
}

impl ContextData {
    /// Whether `id` is cited by a row of the table called `table`
    pub fn contains(&self, table: &str, id: &str) -> bool {
        match table {
            "Reports" => self.reports.iter().any(|r| r.id == id),
            "Entities" => self.entities.iter().any(|r| r.id == id),
            "Relationships" => self.relationships.iter().any(|r| r.id == id),
            "Sources" => self.sources.iter().any(|r| r.id == id),
            _ => false,
        }
    }
}

/// Context assembled for one query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalContext {
    /// Mentions extracted from the query
    pub mentions: Vec<String>,
    /// Entities the mentions mapped to, best first
    pub mapped: Vec<MappedEntity>,
    /// Tables as text
    pub text: String,
    /// Tables as records
    pub data: ContextData,
    /// Token count of `text`
    pub tokens: usize,
}

/// Appends rows to the context text while respecting token caps
struct TableWriter<'t> {
    tokenizer: &'t dyn Tokenizer,
    text: String,
}

impl TableWriter<'_> {
    /// Append as many `rows` as fit under `cap`; returns how many did
    fn write_table(&mut self, title: &str, header: &str, rows: &[String], cap: usize) -> usize {
        let mut written = 0;
        let mut table = format!("-----{}-----\n{}\n", title, header);
        for row in rows {
            let candidate = format!("{}{}\n", table, row);
            let separator = if self.text.is_empty() { "" } else { "\n" };
            let total = format!("{}{}{}", self.text, separator, candidate);
            if self.tokenizer.count(&total) > cap {
                break;
            }
            table = candidate;
            written += 1;
        }
        if written > 0 {
            if !self.text.is_empty() {
                self.text.push('\n');
            }
            self.text.push_str(&table);
        }
        written
    }
}

fn cell(value: &str) -> String {
    value.replace('|', "/").replace(['\r', '\n'], " ").trim().to_string()
}

/// Builds local search context over one indexed graph
pub struct LocalSearchContextBuilder {
    entities: Vec<Entity>,
    relationships: Vec<Relationship>,
    reports: Vec<Community>,
    config: SearchConfig,
    tokenizer: Arc<dyn Tokenizer>,
}

impl LocalSearchContextBuilder {
    /// Create a builder over an indexed graph, validating `config`
    pub fn new(
        entities: Vec<Entity>,
        relationships: Vec<Relationship>,
        reports: Vec<Community>,
        config: SearchConfig,
    ) -> Result<Self, SearchError> {
        config.validate().map_err(SearchError::Config)?;
        Ok(Self {
            entities,
            relationships,
            reports,
            config,
            tokenizer: default_tokenizer(),
        })
    }

    /// Count tokens with `tokenizer` instead of `cl100k_base`
    pub fn with_tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    /// The active configuration
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// The tokenizer measuring the budget
    pub fn tokenizer(&self) -> &dyn Tokenizer {
        self.tokenizer.as_ref()
    }

    /// Assemble the context for `query`
    ///
    /// Reports up to level `depth - 1` are eligible. With `infer`, the
    /// mapped entities are expanded by one relationship hop first.
    pub async fn build_context(
        &self,
        oracle: &dyn Oracle,
        query: &str,
        depth: u32,
        infer: bool,
    ) -> Result<LocalContext, SearchError> {
        let max_level = max_level_for_depth(depth)?;

        let mentions = extract_mentions(oracle, query, self.config.mention_attempts).await?;
        let mapped = map_mentions(
            oracle,
            &mentions,
            &self.entities,
            self.config.top_k_entities,
            self.config.embedding_retry(),
        )
        .await?;
        info!(
            "Query mapped {} mentions to {} entities",
            mentions.len(),
            mapped.len()
        );

        let selected = self.select(&mapped, infer);
        let (text, data) = self.assemble(&selected, max_level);
        let tokens = self.tokenizer.count(&text);
        debug!("Context holds {} tokens of {}", tokens, self.config.token_budget);

        Ok(LocalContext {
            mentions,
            mapped,
            text,
            data,
            tokens,
        })
    }

    /// Mapped entity ids in rank order, then their neighbours when inferring
    fn select(&self, mapped: &[MappedEntity], infer: bool) -> Vec<String> {
        let mut selected: Vec<String> = mapped.iter().map(|m| m.entity_id.clone()).collect();
        if infer {
            let mut seen: HashSet<String> = selected.iter().cloned().collect();
            let matched: HashSet<&str> = mapped.iter().map(|m| m.entity_id.as_str()).collect();
            for r in &self.relationships {
                for (from, to) in [(&r.source, &r.target), (&r.target, &r.source)] {
                    if matched.contains(from.as_str()) && seen.insert(to.clone()) {
                        selected.push(to.clone());
                    }
                }
            }
        }
        selected
    }

    fn assemble(&self, selected: &[String], max_level: u32) -> (String, ContextData) {
        let rank: HashMap<&str, usize> = selected
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();
        let by_id: HashMap<&str, &Entity> =
            self.entities.iter().map(|e| (e.id.as_str(), e)).collect();
        let name_of = |id: &str| by_id.get(id).map(|e| e.name.clone()).unwrap_or_else(|| id.to_string());

        // Reports: overlap with the selection, then rating, then id
        let mut reports: Vec<(usize, &Community)> = self
            .reports
            .iter()
            .filter(|c| c.level <= max_level)
            .map(|c| {
                let overlap = c
                    .member_entity_ids
                    .iter()
                    .filter(|m| rank.contains_key(m.as_str()))
                    .count();
                (overlap, c)
            })
            .filter(|(overlap, _)| *overlap > 0)
            .collect();
        reports.sort_by(|(oa, a), (ob, b)| {
            ob.cmp(oa)
                .then_with(|| b.rating.total_cmp(&a.rating))
                .then_with(|| a.id.cmp(&b.id))
        });
        let report_rows: Vec<ReportRow> = reports
            .into_iter()
            .map(|(_, c)| ReportRow {
                id: c.id.clone(),
                title: c.title.clone(),
                content: c.summary.clone(),
            })
            .collect();

        let entity_rows: Vec<EntityRow> = selected
            .iter()
            .filter_map(|id| by_id.get(id.as_str()))
            .map(|e| EntityRow {
                id: e.id.clone(),
                entity: e.name.clone(),
                entity_type: e.entity_type.to_string(),
                description: e
                    .attributes
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v))
                    .collect::<Vec<_>>()
                    .join("; "),
            })
            .collect();

        // Relationships: both endpoints selected, then one, then the rest
        let mut relationships: Vec<(usize, usize, &Relationship)> = self
            .relationships
            .iter()
            .map(|r| {
                let ends = [rank.get(r.source.as_str()), rank.get(r.target.as_str())];
                let touching = ends.iter().filter(|e| e.is_some()).count();
                let best = ends.iter().flatten().map(|&&i| i).min().unwrap_or(usize::MAX);
                (2 - touching, best, r)
            })
            .collect();
        relationships.sort_by_key(|(tier, best, _)| (*tier, *best));
        let relationship_rows: Vec<RelationshipRow> = relationships
            .iter()
            .map(|(_, _, r)| RelationshipRow {
                id: r.id.clone(),
                source: name_of(&r.source),
                target: name_of(&r.target),
                description: r.name.clone(),
            })
            .collect();

        let [report_cap, entity_cap, relationship_cap, source_cap] = self.config.table_caps();
        let mut writer = TableWriter {
            tokenizer: self.tokenizer.as_ref(),
            text: String::new(),
        };
        let mut data = ContextData::default();

        let written = writer.write_table(
            "Reports",
            "id|title|content",
            &report_rows
                .iter()
                .map(|r| format!("{}|{}|{}", cell(&r.id), cell(&r.title), cell(&r.content)))
                .collect::<Vec<_>>(),
            report_cap,
        );
        data.reports = report_rows.into_iter().take(written).collect();

        let written = writer.write_table(
            "Entities",
            "id|entity|type|description",
            &entity_rows
                .iter()
                .map(|r| {
                    format!(
                        "{}|{}|{}|{}",
                        cell(&r.id),
                        cell(&r.entity),
                        cell(&r.entity_type),
                        cell(&r.description)
                    )
                })
                .collect::<Vec<_>>(),
            entity_cap,
        );
        data.entities = entity_rows.into_iter().take(written).collect();

        let written = writer.write_table(
            "Relationships",
            "id|source|target|description",
            &relationship_rows
                .iter()
                .map(|r| {
                    format!(
                        "{}|{}|{}|{}",
                        cell(&r.id),
                        cell(&r.source),
                        cell(&r.target),
                        cell(&r.description)
                    )
                })
                .collect::<Vec<_>>(),
            relationship_cap,
        );
        data.relationships = relationship_rows.into_iter().take(written).collect();

        // Sources back the relationships that made it into the context
        let mut seen_text = HashSet::new();
        let source_rows: Vec<SourceRow> = data
            .relationships
            .iter()
            .filter_map(|row| {
                relationships
                    .iter()
                    .find(|(_, _, r)| r.id == row.id)
                    .map(|(_, _, r)| r)
            })
            .filter(|r| !r.provenance.trim().is_empty() && seen_text.insert(r.provenance.trim()))
            .map(|r| SourceRow {
                id: r.id.clone(),
                text: r.provenance.trim().to_string(),
            })
            .collect();
        let written = writer.write_table(
            "Sources",
            "id|text",
            &source_rows
                .iter()
                .map(|r| format!("{}|{}", cell(&r.id), cell(&r.text)))
                .collect::<Vec<_>>(),
            source_cap,
        );
        data.sources = source_rows.into_iter().take(written).collect();

        (writer.text, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::{BpeTokenizer, HeuristicTokenizer};
    use std::collections::BTreeMap;
    use unigraph_domain::TypeName;
    use unigraph_llm::MockOracle;

    fn entity(id: &str, name: &str, embedding: Vec<f32>) -> Entity {
        Entity {
            id: id.to_string(),
            name: name.to_string(),
            entity_type: TypeName::new("Person"),
            attributes: BTreeMap::from([("年龄".to_string(), "10".to_string())]),
            attributes_embedding: embedding,
            community_ids: BTreeMap::new(),
        }
    }

    fn relationship(id: &str, source: &str, target: &str, provenance: &str) -> Relationship {
        Relationship {
            id: id.to_string(),
            source: source.to_string(),
            target: target.to_string(),
            relation_type: TypeName::new("认识"),
            name: "认识".to_string(),
            attributes: BTreeMap::new(),
            provenance: provenance.to_string(),
        }
    }

    fn community(id: &str, level: u32, members: &[&str], rating: f32) -> Community {
        Community {
            id: id.to_string(),
            level,
            parent: None,
            member_entity_ids: members.iter().map(|m| m.to_string()).collect(),
            title: format!("title {}", id),
            summary: format!("summary {}", id),
            full_content: String::new(),
            rating,
            rating_explanation: String::new(),
            findings: vec![],
            attributes: BTreeMap::new(),
        }
    }

    /// a matches the mention; b is its neighbour; c and d are unrelated
    fn fixture(config: SearchConfig) -> (MockOracle, LocalSearchContextBuilder) {
        let oracle = MockOracle::new(r#"["a"]"#);
        oracle.add_vector("a", vec![1.0, 0.0]);
        let entities = vec![
            entity("ea", "a", vec![1.0, 0.0]),
            entity("eb", "b", vec![-1.0, 0.0]),
            entity("ec", "c", vec![-1.0, 0.0]),
            entity("ed", "d", vec![]),
        ];
        let relationships = vec![
            relationship("r-cd", "ec", "ed", "c认识d"),
            relationship("r-ab", "ea", "eb", "a认识b"),
        ];
        let reports = vec![
            community("0-0", 0, &["ea", "eb"], 5.0),
            community("0-1", 0, &["ec", "ed"], 9.0),
            community("1-0", 1, &["ea"], 8.0),
        ];
        let config = SearchConfig {
            top_k_entities: 1,
            ..config
        };
        let builder =
            LocalSearchContextBuilder::new(entities, relationships, reports, config).unwrap();
        (oracle, builder)
    }

    #[tokio::test]
    async fn test_depth_zero_rejected() {
        let (oracle, builder) = fixture(SearchConfig::default());
        let err = builder.build_context(&oracle, "a?", 0, false).await.unwrap_err();
        assert!(matches!(err, SearchError::InvalidDepth(0)));
        assert_eq!(oracle.call_count(), 0);
    }

    #[tokio::test]
    async fn test_depth_one_admits_only_top_level_reports() {
        let (oracle, builder) = fixture(SearchConfig::default());
        let context = builder.build_context(&oracle, "a?", 1, false).await.unwrap();
        let ids: Vec<&str> = context.data.reports.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["0-0"]);

        let context = builder.build_context(&oracle, "a?", 2, false).await.unwrap();
        let ids: Vec<&str> = context.data.reports.iter().map(|r| r.id.as_str()).collect();
        // Equal overlap: the higher rating comes first
        assert_eq!(ids, vec!["1-0", "0-0"]);
    }

    #[tokio::test]
    async fn test_relationship_touching_match_ranks_first() {
        let (oracle, builder) = fixture(SearchConfig::default());
        let context = builder.build_context(&oracle, "a?", 1, false).await.unwrap();

        assert_eq!(context.mapped[0].entity_id, "ea");
        let ids: Vec<&str> = context.data.relationships.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r-ab", "r-cd"]);
        assert_eq!(context.data.sources[0].id, "r-ab");
        assert!(context.text.contains("-----Entities-----\nid|entity|type|description\nea|a|Person|年龄: 10\n"));
        assert!(context.text.contains("r-ab|a|b|认识"));
    }

    #[tokio::test]
    async fn test_infer_adds_one_hop_neighbours() {
        let (oracle, builder) = fixture(SearchConfig::default());
        let plain = builder.build_context(&oracle, "a?", 1, false).await.unwrap();
        assert_eq!(plain.data.entities.len(), 1);

        let inferred = builder.build_context(&oracle, "a?", 1, true).await.unwrap();
        let ids: Vec<&str> = inferred.data.entities.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["ea", "eb"]);
    }

    #[tokio::test]
    async fn test_text_and_data_hold_the_same_rows() {
        let (oracle, builder) = fixture(SearchConfig::default());
        let context = builder.build_context(&oracle, "a?", 2, true).await.unwrap();
        for row in &context.data.relationships {
            assert!(context.text.contains(&format!("\n{}|", row.id)));
        }
        for row in &context.data.reports {
            assert!(context.data.contains("Reports", &row.id));
            assert!(context.text.contains(&format!("\n{}|", row.id)));
        }
        assert!(!context.data.contains("Reports", "missing"));
    }

    #[tokio::test]
    async fn test_budget_never_exceeded() {
        let oracle = MockOracle::new(r#"["e0"]"#);
        oracle.add_vector("e0", vec![1.0, 0.0]);
        let entities: Vec<Entity> = (0..300)
            .map(|i| entity(&format!("e{}", i), &format!("实体{}", i), vec![1.0, i as f32]))
            .collect();
        let relationships: Vec<Relationship> = (1..300)
            .map(|i| {
                relationship(
                    &format!("r{}", i),
                    "e0",
                    &format!("e{}", i),
                    &"很长的来源句子".repeat(5),
                )
            })
            .collect();
        let reports: Vec<Community> = (0..100)
            .map(|i| community(&format!("0-{}", i), 0, &["e0"], i as f32 / 10.0))
            .collect();
        let bpe = BpeTokenizer::cl100k().unwrap();

        for budget in [50, 500, 2000] {
            let config = SearchConfig {
                token_budget: budget,
                top_k_entities: 200,
                ..Default::default()
            };
            let builder = LocalSearchContextBuilder::new(
                entities.clone(),
                relationships.clone(),
                reports.clone(),
                config,
            )
            .unwrap();
            let context = builder.build_context(&oracle, "e0", 1, true).await.unwrap();
            assert!(context.tokens <= budget, "{} > {}", context.tokens, budget);
            assert_eq!(context.tokens, bpe.count(&context.text));
            assert!(context.data.relationships.len() < relationships.len());
        }
    }

    #[tokio::test]
    async fn test_heuristic_tokenizer_can_replace_bpe() {
        let (oracle, builder) = fixture(SearchConfig::default());
        let builder = builder.with_tokenizer(Arc::new(HeuristicTokenizer));
        let context = builder.build_context(&oracle, "a?", 1, false).await.unwrap();
        assert_eq!(context.tokens, HeuristicTokenizer.count(&context.text));
    }

    #[tokio::test]
    async fn test_unused_share_flows_onward() {
        // Entities have no share of their own but get what Reports left
        let (oracle, builder) = fixture(SearchConfig {
            report_share: 0.5,
            entity_share: 0.0,
            ..Default::default()
        });
        let context = builder.build_context(&oracle, "a?", 1, false).await.unwrap();
        assert!(!context.data.entities.is_empty());
    }

    #[test]
    fn test_cells_cannot_break_rows() {
        assert_eq!(cell(" a|b\nc "), "a/b c");
    }
}
