//! The UniGraph facade.

use crate::config::UniGraphConfig;
use crate::error::SdkError;
use std::sync::Arc;
use tracing::info;
use unigraph_domain::{
    Community, Entity, ExtractedTriple, GraphSnapshot, InducedSchema, KnowledgeGraph, Relationship,
};
use unigraph_extractor::{
    ExtractionPipeline, ExtractionResult, GraphAssembler, InductionRequest, InductionResult,
    JobGate, MergeStats, SchemaInducer,
};
use unigraph_indexer::{GraphIndexer, IndexMetrics, IndexOutput};
use unigraph_llm::{OpenAiCompatibleOracle, Oracle};
use unigraph_search::{LocalSearchContextBuilder, LocalSearchEngine, SearchResult};

/// Entry point for induction, extraction, indexing and search
///
/// One provider value is shared by every job. Induction and extraction jobs
/// started through the same `UniGraph` (or through facades sharing a
/// [`JobGate`]) run one at a time.
///
/// # Examples
///
/// ```no_run
/// use unigraph_sdk::{UniGraph, UniGraphConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let unigraph = UniGraph::from_config(UniGraphConfig::default())?;
/// let chunks = vec!["小明喜欢数学。".to_string()];
///
/// let induced = unigraph.induce_schema("学生兴趣", chunks.clone()).await?;
/// let extracted = unigraph.extract_graph(&induced.schema, &chunks).await?;
/// let graph = unigraph.assemble_graph(&extracted.triples);
/// let index = unigraph.build_index(graph.entities, graph.relationships.clone(), 2).await?;
///
/// let answer = unigraph
///     .query(index.entities, graph.relationships, index.communities, "小明喜欢什么", 1, false)
///     .await?;
/// println!("{}", answer.answer);
/// # Ok(())
/// # }
/// ```
pub struct UniGraph {
    oracle: Arc<dyn Oracle>,
    config: UniGraphConfig,
    gate: JobGate,
}

impl UniGraph {
    /// Create a facade over `oracle`, validating `config`
    ///
    /// The provider section of `config` is not used; `oracle` already is
    /// the provider.
    pub fn new(oracle: Arc<dyn Oracle>, config: UniGraphConfig) -> Result<Self, SdkError> {
        config.induction.validate().map_err(SdkError::Config)?;
        config.extractor.validate().map_err(SdkError::Config)?;
        config.indexer.validate().map_err(SdkError::Config)?;
        config.search.validate().map_err(SdkError::Config)?;
        Ok(Self {
            oracle,
            config,
            gate: JobGate::new(),
        })
    }

    /// Create a facade with an OpenAI-compatible provider built from
    /// `config.oracle`
    pub fn from_config(config: UniGraphConfig) -> Result<Self, SdkError> {
        config.validate().map_err(SdkError::Config)?;
        let oracle = OpenAiCompatibleOracle::new(config.oracle.clone())?;
        Self::new(Arc::new(oracle), config)
    }

    /// Serialize jobs with every other holder of `gate`
    pub fn with_gate(mut self, gate: JobGate) -> Self {
        self.gate = gate;
        self
    }

    /// The gate serializing this facade's jobs
    pub fn gate(&self) -> &JobGate {
        &self.gate
    }

    /// The active configuration
    pub fn config(&self) -> &UniGraphConfig {
        &self.config
    }

    /// Discover entity and relation types for `aim` from seed chunks
    pub async fn induce_schema(
        &self,
        aim: &str,
        chunks: Vec<String>,
    ) -> Result<InductionResult, SdkError> {
        self.induce(&InductionRequest::new(aim, chunks)).await
    }

    /// Run schema induction for a full request
    pub async fn induce(&self, request: &InductionRequest) -> Result<InductionResult, SdkError> {
        let inducer = SchemaInducer::new(self.oracle.clone(), self.config.induction.clone())?;
        Ok(inducer.induce(&self.gate, request).await?)
    }

    /// Extract typed triples from `chunks` under `schema`
    pub async fn extract_graph(
        &self,
        schema: &InducedSchema,
        chunks: &[String],
    ) -> Result<ExtractionResult, SdkError> {
        let pipeline = self.pipeline()?;
        Ok(pipeline.extract(&self.gate, schema, chunks).await?)
    }

    /// Build entities and relationships from triples
    pub fn assemble_graph(&self, triples: &[ExtractedTriple]) -> KnowledgeGraph {
        self.assembler().assemble(triples)
    }

    /// Add triples to an existing graph
    pub fn merge_graph(
        &self,
        graph: &mut KnowledgeGraph,
        triples: &[ExtractedTriple],
    ) -> MergeStats {
        self.assembler().merge(graph, triples)
    }

    /// Partition, report and embed a graph with at most `levels` levels
    pub async fn build_index(
        &self,
        entities: Vec<Entity>,
        relationships: Vec<Relationship>,
        levels: usize,
    ) -> Result<IndexOutput, SdkError> {
        let indexer = GraphIndexer::new(self.oracle.clone(), self.config.indexer.clone())?;
        Ok(indexer.build_index(entities, relationships, levels).await?)
    }

    /// Answer `query` over an indexed graph
    ///
    /// `depth` is 1-based: depth 1 uses top-level community reports only.
    pub async fn query(
        &self,
        entities: Vec<Entity>,
        relationships: Vec<Relationship>,
        reports: Vec<Community>,
        query: &str,
        depth: u32,
        infer: bool,
    ) -> Result<SearchResult, SdkError> {
        let builder = LocalSearchContextBuilder::new(
            entities,
            relationships,
            reports,
            self.config.search.clone(),
        )?;
        let engine = LocalSearchEngine::new(self.oracle.clone(), builder);
        Ok(engine.search(query, depth, infer).await?)
    }

    /// Extract `chunks` and merge the result into `snapshot`
    ///
    /// Returns the extraction result; the snapshot's triples and graph are
    /// extended in place.
    pub async fn extract_into(
        &self,
        snapshot: &mut GraphSnapshot,
        chunks: &[String],
    ) -> Result<ExtractionResult, SdkError> {
        let schema = snapshot
            .schema
            .clone()
            .ok_or_else(|| SdkError::Config(format!("graph {} has no schema", snapshot.id)))?;
        let extracted = self.extract_graph(&schema, chunks).await?;

        let stats = self.merge_graph(&mut snapshot.graph, &extracted.triples);
        let known: std::collections::HashSet<_> =
            snapshot.triples.iter().map(|t| t.id.clone()).collect();
        snapshot.triples.extend(
            extracted
                .triples
                .iter()
                .filter(|t| !known.contains(&t.id))
                .cloned(),
        );
        info!(
            "Graph {}: {} entities added, {} relationships added, {} duplicates ignored",
            snapshot.id, stats.entities_added, stats.relationships_added, stats.duplicates_ignored
        );
        Ok(extracted)
    }

    /// Index `snapshot` in place, replacing its communities
    pub async fn index_snapshot(
        &self,
        snapshot: &mut GraphSnapshot,
        levels: usize,
    ) -> Result<IndexMetrics, SdkError> {
        let output = self
            .build_index(
                snapshot.graph.entities.clone(),
                snapshot.graph.relationships.clone(),
                levels,
            )
            .await?;
        snapshot.graph.entities = output.entities;
        snapshot.communities = output.communities;
        Ok(output.metrics)
    }

    /// Answer `query` over an indexed snapshot
    pub async fn query_snapshot(
        &self,
        snapshot: &GraphSnapshot,
        query: &str,
        depth: u32,
        infer: bool,
    ) -> Result<SearchResult, SdkError> {
        self.query(
            snapshot.graph.entities.clone(),
            snapshot.graph.relationships.clone(),
            snapshot.communities.clone(),
            query,
            depth,
            infer,
        )
        .await
    }

    fn pipeline(&self) -> Result<ExtractionPipeline, SdkError> {
        Ok(ExtractionPipeline::new(
            self.oracle.clone(),
            self.config.extractor.clone(),
        )?)
    }

    fn assembler(&self) -> GraphAssembler {
        GraphAssembler::with_window(self.config.extractor.hash_window())
    }
}
