//! Metrics collected during an indexing run

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metrics collected during one indexing run
///
/// Tracks communities per level, report outcomes and embedding failures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexMetrics {
    /// Communities per hierarchy level
    pub communities: BTreeMap<u32, usize>,

    /// Reports parsed from the oracle's reply
    pub reports_generated: usize,

    /// Reports replaced by a placeholder because the reply did not parse
    pub reports_unparsed: usize,

    /// Entities that received an embedding
    pub entities_embedded: usize,

    /// Ids of entities whose embedding failed after every attempt
    pub embedding_failures: Vec<String>,

    /// Wall time of the whole run in milliseconds
    pub processing_time_ms: u64,
}

impl IndexMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a community at `level`
    pub fn record_community(&mut self, level: u32) {
        *self.communities.entry(level).or_insert(0) += 1;
    }

    /// Record a report outcome
    pub fn record_report(&mut self, parsed: bool) {
        if parsed {
            self.reports_generated += 1;
        } else {
            self.reports_unparsed += 1;
        }
    }

    /// Record an entity whose embedding failed
    pub fn record_embedding_failure(&mut self, entity_id: &str) {
        self.embedding_failures.push(entity_id.to_string());
    }

    /// Total communities across all levels
    pub fn total_communities(&self) -> usize {
        self.communities.values().sum()
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Index Metrics Summary".to_string(),
            "=====================".to_string(),
            format!("Total runtime: {}ms", self.processing_time_ms),
            String::new(),
        ];

        if !self.communities.is_empty() {
            lines.push("Communities by level:".to_string());
            for (level, count) in &self.communities {
                lines.push(format!("  {}: {}", level, count));
            }
            lines.push(format!("  Total: {}", self.total_communities()));
            lines.push(String::new());
        }

        lines.push(format!(
            "Reports: {} generated, {} unparsed",
            self.reports_generated, self.reports_unparsed
        ));
        lines.push(format!(
            "Embeddings: {} stored, {} failed",
            self.entities_embedded,
            self.embedding_failures.len()
        ));
        lines.join("\n")
    }
}
