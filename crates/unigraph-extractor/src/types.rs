//! Request and response types for induction and extraction

use crate::stages::HaltReason;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use unigraph_domain::{ExtractedTriple, InducedSchema, TripleId};

/// Request to induce a schema from seed text
#[derive(Debug, Clone)]
pub struct InductionRequest {
    /// What the graph is for, e.g. "student interests"
    pub aim: String,

    /// Optional direction such as "focus on hardware entities"
    pub suggestion: Option<String>,

    /// Seed text chunks
    pub chunks: Vec<String>,
}

impl InductionRequest {
    /// Create a request without a suggestion
    pub fn new(aim: impl Into<String>, chunks: Vec<String>) -> Self {
        Self {
            aim: aim.into(),
            suggestion: None,
            chunks,
        }
    }

    /// Attach a directional suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Result of schema induction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InductionResult {
    /// Induced schema and definitions
    pub schema: InducedSchema,

    /// Metadata about the job
    pub metadata: InductionMetadata,
}

/// Metadata about an induction job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InductionMetadata {
    /// Name of the LLM model used
    pub model_name: String,

    /// Detected prompt language
    pub language: String,

    /// Chunks processed
    pub chunks: usize,

    /// Entries before deduplication
    pub candidate_entries: usize,

    /// Candidates dropped because a name could not be mapped to a type
    pub unmapped: usize,

    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

/// Result of an extraction job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Typed triples, deduplicated by id, in chunk order
    pub triples: Vec<ExtractedTriple>,

    /// Triple id to supporting sentence
    pub provenance: IndexMap<TripleId, String>,

    /// Chunks whose provider calls failed
    pub failures: Vec<ChunkFailure>,

    /// Chunks that stopped early without producing triples
    pub halted: Vec<ChunkHalt>,

    /// Metadata about the job
    pub metadata: ExtractionMetadata,
}

impl ExtractionResult {
    pub(crate) fn empty(model_name: &str) -> Self {
        Self {
            triples: Vec::new(),
            provenance: IndexMap::new(),
            failures: Vec::new(),
            halted: Vec::new(),
            metadata: ExtractionMetadata {
                model_name: model_name.to_string(),
                chunks: 0,
                processing_time_ms: 0,
            },
        }
    }
}

/// A chunk that failed with a provider error or timed out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkFailure {
    /// Position of the chunk in the request
    pub chunk_index: usize,

    /// Reason for failure
    pub reason: String,
}

/// A chunk whose stage chain halted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkHalt {
    /// Position of the chunk in the request
    pub chunk_index: usize,

    /// Stage that produced nothing
    pub reason: HaltReason,
}

/// Metadata about an extraction job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    /// Name of the LLM model used
    pub model_name: String,

    /// Chunks processed
    pub chunks: usize,

    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}
