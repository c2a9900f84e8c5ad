//! Chunk-parallel extraction job

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::gate::JobGate;
use crate::stages::{run_chunk, ExtractionSchema, HaltReason, StageContext, StageOutcome};
use crate::types::{ChunkFailure, ChunkHalt, ExtractionMetadata, ExtractionResult};
use futures::stream::{self, StreamExt};
use indexmap::IndexMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use unigraph_domain::{ExtractedTriple, HashWindow, InducedSchema};
use unigraph_llm::{LlmError, Oracle};

enum ChunkReport {
    Triples(Vec<ExtractedTriple>),
    Halted(HaltReason),
    Failed(String),
}

/// Runs the four-stage chain over every chunk of a job
///
/// Chunks run concurrently up to `max_concurrent_chunks`; the job as a whole
/// holds the [`JobGate`] it is given. Results are reported in chunk order.
pub struct ExtractionPipeline {
    oracle: Arc<dyn Oracle>,
    config: ExtractorConfig,
    window: HashWindow,
}

impl ExtractionPipeline {
    /// Create a pipeline, validating `config`
    pub fn new(oracle: Arc<dyn Oracle>, config: ExtractorConfig) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;
        let window = config.hash_window();
        debug!("Extraction hash window offset {}", window.offset());
        Ok(Self {
            oracle,
            config,
            window,
        })
    }

    /// Window triple ids are derived with
    pub fn window(&self) -> HashWindow {
        self.window
    }

    /// Pipeline configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract typed triples from `chunks` under `schema`
    ///
    /// Halted chunks contribute nothing. Chunks failing with a provider error
    /// or timing out are listed in [`ExtractionResult::failures`]; the job
    /// errors only when every non-blank chunk failed.
    pub async fn extract(
        &self,
        gate: &JobGate,
        schema: &InducedSchema,
        chunks: &[String],
    ) -> Result<ExtractionResult, ExtractorError> {
        let prepared = ExtractionSchema::new(schema)?;
        let _guard = gate.enter().await;
        let start = Instant::now();

        let work: Vec<(usize, &str)> = chunks
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.trim().is_empty())
            .map(|(i, c)| (i, c.as_str()))
            .collect();
        if work.is_empty() {
            debug!("No non-blank chunks to extract");
            return Ok(ExtractionResult::empty(self.oracle.model_name()));
        }

        info!(
            "Starting extraction of {} chunks ({} concurrent)",
            work.len(),
            self.config.max_concurrent_chunks
        );

        let mut reports: Vec<(usize, ChunkReport)> = stream::iter(work.iter().copied())
            .map(|(index, chunk)| self.extract_chunk(&prepared, index, chunk))
            .buffer_unordered(self.config.max_concurrent_chunks)
            .collect()
            .await;
        reports.sort_by_key(|(index, _)| *index);

        let mut triples = Vec::new();
        let mut provenance = IndexMap::new();
        let mut failures = Vec::new();
        let mut halted = Vec::new();

        for (chunk_index, report) in reports {
            match report {
                ChunkReport::Triples(extracted) => {
                    for triple in extracted {
                        if provenance.contains_key(&triple.id) {
                            debug!("Duplicate triple {} ignored", triple.id);
                            continue;
                        }
                        provenance.insert(triple.id.clone(), triple.provenance.clone());
                        triples.push(triple);
                    }
                }
                ChunkReport::Halted(reason) => halted.push(ChunkHalt {
                    chunk_index,
                    reason,
                }),
                ChunkReport::Failed(reason) => failures.push(ChunkFailure {
                    chunk_index,
                    reason,
                }),
            }
        }

        if failures.len() == work.len() {
            let last_error = failures
                .last()
                .map(|f| f.reason.clone())
                .unwrap_or_default();
            return Err(ExtractorError::AllChunksFailed {
                chunks: work.len(),
                last_error,
            });
        }

        let processing_time_ms = start.elapsed().as_millis() as u64;
        info!(
            "Extraction complete: {} triples, {} halted, {} failed chunks in {}ms",
            triples.len(),
            halted.len(),
            failures.len(),
            processing_time_ms
        );

        Ok(ExtractionResult {
            triples,
            provenance,
            failures,
            halted,
            metadata: ExtractionMetadata {
                model_name: self.oracle.model_name().to_string(),
                chunks: work.len(),
                processing_time_ms,
            },
        })
    }

    async fn extract_chunk(
        &self,
        schema: &ExtractionSchema,
        index: usize,
        chunk: &str,
    ) -> (usize, ChunkReport) {
        let ctx = StageContext {
            oracle: self.oracle.as_ref(),
            schema,
            chunk,
        };

        let report = match timeout(self.config.chunk_timeout(), run_chunk(&ctx, self.window)).await
        {
            Ok(Ok(StageOutcome::Continue(triples))) => {
                debug!("Chunk {} produced {} triples", index, triples.len());
                ChunkReport::Triples(triples)
            }
            Ok(Ok(StageOutcome::Halt(reason))) => {
                debug!("Chunk {} halted: {:?}", index, reason);
                ChunkReport::Halted(reason)
            }
            Ok(Err(e)) => {
                warn!("Chunk {} failed: {}", index, e);
                ChunkReport::Failed(e.to_string())
            }
            Err(_) => {
                warn!(
                    "Chunk {} timed out after {}s",
                    index, self.config.chunk_timeout_secs
                );
                ChunkReport::Failed(LlmError::Timeout.to_string())
            }
        };
        (index, report)
    }
}
