//! Indexing orchestration: partition, report, embed

use crate::config::IndexerConfig;
use crate::embedding::EntityEmbedder;
use crate::error::IndexerError;
use crate::metrics::IndexMetrics;
use crate::partition::{check_refinement, hierarchical_partition, HierarchyBounds, WeightedGraph};
use crate::reports::{report_prompt, CommunityDraft, ReportWriter};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use unigraph_domain::{Community, Entity, Relationship};
use unigraph_llm::Oracle;

/// Result of an indexing run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexOutput {
    /// Entities with community ids and embeddings
    pub entities: Vec<Entity>,

    /// Community reports, level by level
    pub communities: Vec<Community>,

    /// Run metrics
    pub metrics: IndexMetrics,
}

/// Builds the community hierarchy, its reports and the entity embeddings
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use unigraph_indexer::{GraphIndexer, IndexerConfig};
/// use unigraph_llm::MockOracle;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let indexer = GraphIndexer::new(Arc::new(MockOracle::default()), IndexerConfig::default())?;
/// let output = indexer.build_index(vec![], vec![], 2).await?;
/// println!("{}", output.metrics.summary());
/// # Ok(())
/// # }
/// ```
pub struct GraphIndexer {
    oracle: Arc<dyn Oracle>,
    config: IndexerConfig,
}

impl GraphIndexer {
    /// Create an indexer, validating `config`
    pub fn new(oracle: Arc<dyn Oracle>, config: IndexerConfig) -> Result<Self, IndexerError> {
        config.validate().map_err(IndexerError::Config)?;
        Ok(Self { oracle, config })
    }

    /// The active configuration
    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    /// Index a graph with at most `levels` hierarchy levels
    ///
    /// Entities without any relationship get an embedding but no community.
    /// A provider error during report generation aborts the run; embedding
    /// failures only exclude the failing entity.
    pub async fn build_index(
        &self,
        entities: Vec<Entity>,
        relationships: Vec<Relationship>,
        levels: usize,
    ) -> Result<IndexOutput, IndexerError> {
        if levels == 0 {
            return Err(IndexerError::InvalidInput(
                "levels must be greater than 0".to_string(),
            ));
        }
        let start = Instant::now();
        let mut metrics = IndexMetrics::new();
        let (mut entities, relationships) = canonicalize(entities, relationships);

        info!(
            "Indexing {} entities and {} relationships ({} levels)",
            entities.len(),
            relationships.len(),
            levels
        );

        let communities = self.partition(&mut entities, &relationships, levels)?;
        for draft in &communities {
            metrics.record_community(draft.level);
        }
        info!("Partitioned into {} communities", communities.len());

        let writer = ReportWriter::new(self.oracle.clone(), self.config.report_concurrency);
        let mut reports = Vec::with_capacity(communities.len());
        for (mut community, parsed) in writer.write_all(communities).await? {
            metrics.record_report(parsed);
            community
                .attributes
                .insert("size".to_string(), community.member_entity_ids.len().to_string());
            reports.push(community);
        }
        info!("Generated {} community reports", reports.len());

        let embedder = EntityEmbedder::new(self.oracle.clone(), self.config.clone());
        let failed = embedder.embed_all(&mut entities).await;
        metrics.entities_embedded = entities.len() - failed.len();
        for id in &failed {
            metrics.record_embedding_failure(id);
        }
        info!(
            "Embedded {} entities ({} failed)",
            metrics.entities_embedded,
            failed.len()
        );

        metrics.processing_time_ms = start.elapsed().as_millis() as u64;
        Ok(IndexOutput {
            entities,
            communities: reports,
            metrics,
        })
    }

    /// Partition the graph, stamp community ids on entities and draft one
    /// report prompt per community
    fn partition(
        &self,
        entities: &mut [Entity],
        relationships: &[Relationship],
        levels: usize,
    ) -> Result<Vec<CommunityDraft>, IndexerError> {
        let known: HashSet<&str> = entities.iter().map(|e| e.id.as_str()).collect();
        let edges: Vec<&Relationship> = relationships
            .iter()
            .filter(|r| {
                let keep = r.source != r.target
                    && known.contains(r.source.as_str())
                    && known.contains(r.target.as_str());
                if !keep {
                    debug!("Relationship {} left out of the partition", r.id);
                }
                keep
            })
            .collect();

        // Nodes are the connected entity ids in sorted order
        let nodes: Vec<String> = edges
            .iter()
            .flat_map(|r| [r.source.clone(), r.target.clone()])
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let index: HashMap<&str, usize> =
            nodes.iter().enumerate().map(|(i, id)| (id.as_str(), i)).collect();

        let mut graph = WeightedGraph::new(nodes.len());
        for r in &edges {
            graph.add_edge(index[r.source.as_str()], index[r.target.as_str()], 1.0);
        }

        let clusters = hierarchical_partition(
            &graph,
            HierarchyBounds {
                max_cluster_size: self.config.max_cluster_size,
                max_levels: levels,
                seed: self.config.seed,
            },
        );
        check_refinement(&clusters).map_err(IndexerError::Partition)?;

        let mut ordinals: BTreeMap<u32, usize> = BTreeMap::new();
        let ids: Vec<String> = clusters
            .iter()
            .map(|c| {
                let ordinal = ordinals.entry(c.level).or_insert(0);
                let id = format!("{}-{}", c.level, ordinal);
                *ordinal += 1;
                id
            })
            .collect();

        let position: HashMap<String, usize> = entities
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id.clone(), i))
            .collect();
        for (cluster, id) in clusters.iter().zip(&ids) {
            for &member in &cluster.members {
                let entity = &mut entities[position[&nodes[member]]];
                entity.community_ids.insert(cluster.level, id.clone());
            }
        }

        let drafts = clusters
            .iter()
            .zip(&ids)
            .map(|(cluster, id)| {
                let member_ids: Vec<String> =
                    cluster.members.iter().map(|&m| nodes[m].clone()).collect();
                let member_set: HashSet<&str> = member_ids.iter().map(|s| s.as_str()).collect();
                let members: Vec<&Entity> = member_ids
                    .iter()
                    .map(|m| &entities[position[m]])
                    .collect();
                let internal: Vec<&Relationship> = edges
                    .iter()
                    .copied()
                    .filter(|r| {
                        member_set.contains(r.source.as_str())
                            && member_set.contains(r.target.as_str())
                    })
                    .collect();

                CommunityDraft {
                    id: id.clone(),
                    level: cluster.level,
                    parent: cluster.parent.map(|p| ids[p].clone()),
                    prompt: report_prompt(&members, &internal, self.config.report_context_rows),
                    member_entity_ids: member_ids,
                }
            })
            .collect();
        Ok(drafts)
    }
}

/// Trim ids and drop duplicate entities, keeping the first occurrence
fn canonicalize(
    entities: Vec<Entity>,
    relationships: Vec<Relationship>,
) -> (Vec<Entity>, Vec<Relationship>) {
    let mut seen = HashSet::new();
    let entities = entities
        .into_iter()
        .map(|mut e| {
            e.id = e.id.trim().to_string();
            e.community_ids.clear();
            e
        })
        .filter(|e| {
            let fresh = seen.insert(e.id.clone());
            if !fresh {
                warn!("Duplicate entity id {} ignored", e.id);
            }
            fresh
        })
        .collect();

    let relationships = relationships
        .into_iter()
        .map(|mut r| {
            r.id = r.id.trim().to_string();
            r.source = r.source.trim().to_string();
            r.target = r.target.trim().to_string();
            r
        })
        .collect();
    (entities, relationships)
}
