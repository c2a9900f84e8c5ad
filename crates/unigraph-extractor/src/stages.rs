//! The four extraction stages
//!
//! Each stage is an async function that consumes the record produced by the
//! previous stage and returns either the next record or a [`HaltReason`].
//! Records only ever grow: a later stage never mutates what an earlier stage
//! decided, it wraps it.
//!
//! ```text
//! chunk ─▶ entities ─▶ relations ─▶ (tracing ‖ type match) ─▶ attributes ─▶ triples
//! ```
//!
//! Provider errors are returned as `Err` and become chunk failures in the
//! pipeline; grammar and mapping problems are logged and skipped.

use crate::error::ExtractorError;
use crate::prompt;
use crate::protocol::{
    parse_attributes, parse_entities, parse_relation_type_matches, parse_traced_triples,
    ProtocolError, RawTriple, TracedTriple,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;
use unigraph_domain::{
    ExtractedTriple, HashWindow, InducedSchema, TripleId, TypeName, TypeRegistry,
    UNKNOWN_ATTRIBUTE,
};
use unigraph_llm::{LlmError, Oracle};

/// Why a chunk stopped before producing triples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HaltReason {
    /// Stage 1 found no entity of a schema type
    NoEntities,
    /// Stage 2 returned an empty response
    NoTriples,
    /// No triple survived tracing
    NoTracedTriples,
}

/// Result of one stage
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome<T> {
    /// Proceed with the next stage
    Continue(T),
    /// Stop this chunk; not an error
    Halt(HaltReason),
}

/// Schema prepared for prompting
///
/// Built once per job from an [`InducedSchema`]; holds the type registry and
/// the pre-rendered type listings every chunk's prompts share.
#[derive(Debug, Clone)]
pub struct ExtractionSchema {
    registry: TypeRegistry,
    entity_types: String,
    relation_types: String,
}

impl ExtractionSchema {
    /// Prepare `schema`, rejecting one without entity types
    pub fn new(schema: &InducedSchema) -> Result<Self, ExtractorError> {
        let registry = schema.registry();
        if registry.entity_types().next().is_none() {
            return Err(ExtractorError::InvalidSchema(
                "schema declares no entity types".to_string(),
            ));
        }

        let entity_types = registry
            .entity_types()
            .map(|t| describe(t.name.as_str(), t.definition.as_deref()))
            .collect::<Vec<_>>()
            .join(", ");
        let relation_types = registry
            .relation_types()
            .map(|t| describe(t.name.as_str(), t.definition.as_deref()))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(Self {
            registry,
            entity_types,
            relation_types,
        })
    }

    /// Registry of the schema's types
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// `Type(definition), ...` listing of entity types
    pub fn entity_types_prompt(&self) -> &str {
        &self.entity_types
    }

    /// `Type(definition), ...` listing of relation types
    pub fn relation_types_prompt(&self) -> &str {
        &self.relation_types
    }

    fn declared_attributes(&self, entity_type: &TypeName) -> &[String] {
        self.registry
            .entity_type(entity_type.as_str())
            .map(|t| t.attributes.as_slice())
            .unwrap_or(&[])
    }
}

fn describe(name: &str, definition: Option<&str>) -> String {
    match definition {
        Some(d) if !d.trim().is_empty() => format!("{}({})", name, d.trim()),
        _ => name.to_string(),
    }
}

/// Everything one chunk's stages share
pub struct StageContext<'a> {
    /// Oracle answering the prompts
    pub oracle: &'a dyn Oracle,
    /// Prepared schema
    pub schema: &'a ExtractionSchema,
    /// Chunk text
    pub chunk: &'a str,
}

/// Output of stage 1
#[derive(Debug, Clone, PartialEq)]
pub struct EntityStage {
    /// Entity name to schema type
    pub entities: IndexMap<String, TypeName>,
}

/// Output of stage 2
#[derive(Debug, Clone, PartialEq)]
pub struct RelationStage {
    /// Stage 1 record
    pub entity_stage: EntityStage,
    /// Raw triples reply, forwarded unparsed
    pub raw_triples: String,
}

/// Output of stage 3
#[derive(Debug, Clone, PartialEq)]
pub struct TracedStage {
    /// Stage 2 record
    pub relation_stage: RelationStage,
    /// Triples with a source whose head and tail are known entities
    pub traced: Vec<TracedTriple>,
    /// Relation type matched per triple
    pub triple_types: HashMap<RawTriple, TypeName>,
    /// Relation type matched per relation literal
    pub literal_types: HashMap<String, TypeName>,
}

impl TracedStage {
    fn entities(&self) -> &IndexMap<String, TypeName> {
        &self.relation_stage.entity_stage.entities
    }

    /// Schema relation type for `triple`, falling back to its literal
    pub fn relation_type(&self, triple: &RawTriple) -> TypeName {
        self.triple_types
            .get(triple)
            .or_else(|| self.literal_types.get(&triple.relation))
            .cloned()
            .unwrap_or_else(|| TypeName::new(&triple.relation))
    }
}

/// Output of stage 4
#[derive(Debug, Clone, PartialEq)]
pub struct AttributedStage {
    /// Stage 3 record
    pub traced_stage: TracedStage,
    /// Entity name to its full set of declared attributes
    pub attributes: HashMap<String, BTreeMap<String, String>>,
}

/// Stage 1: extract entities whose type is in the schema
pub async fn extract_entities(
    ctx: &StageContext<'_>,
) -> Result<StageOutcome<EntityStage>, LlmError> {
    let reply = ctx
        .oracle
        .get_response(&prompt::entity_extraction(
            ctx.chunk,
            ctx.schema.entity_types_prompt(),
        ))
        .await?;

    let parsed = parse_entities(&reply);
    parsed.log_errors("entity extraction");

    let mut entities = IndexMap::new();
    for (name, type_name) in parsed.records {
        match ctx.schema.registry().entity_type(&type_name) {
            Some(entity_type) => {
                entities.insert(name, entity_type.name.clone());
            }
            None => debug!(
                "entity extraction: skipped entry: {}",
                ProtocolError::unmapped(&type_name, format!("type of '{}' is not in the schema", name))
            ),
        }
    }

    if entities.is_empty() {
        return Ok(StageOutcome::Halt(HaltReason::NoEntities));
    }
    debug!("Stage 1 extracted {} entities", entities.len());
    Ok(StageOutcome::Continue(EntityStage { entities }))
}

/// Stage 2: ask for triples between the extracted entities
pub async fn extract_relations(
    ctx: &StageContext<'_>,
    entity_stage: EntityStage,
) -> Result<StageOutcome<RelationStage>, LlmError> {
    let entities = entity_stage
        .entities
        .iter()
        .map(|(name, entity_type)| format!("{}: {}", name, entity_type))
        .collect::<Vec<_>>()
        .join(", ");

    let reply = ctx
        .oracle
        .get_response(&prompt::relation_extraction(
            ctx.chunk,
            &entities,
            ctx.schema.relation_types_prompt(),
        ))
        .await?;

    let raw_triples = reply.trim().to_string();
    if raw_triples.is_empty() {
        return Ok(StageOutcome::Halt(HaltReason::NoTriples));
    }
    Ok(StageOutcome::Continue(RelationStage {
        entity_stage,
        raw_triples,
    }))
}

/// Stage 3: trace triples to sources and match relation types concurrently
pub async fn trace_and_match(
    ctx: &StageContext<'_>,
    relation_stage: RelationStage,
) -> Result<StageOutcome<TracedStage>, LlmError> {
    let trace_prompt = prompt::triples_tracing(ctx.chunk, &relation_stage.raw_triples);
    let match_prompt = prompt::relation_type_match(
        &relation_stage.raw_triples,
        ctx.schema.relation_types_prompt(),
    );

    let (traced_reply, match_reply) = futures::join!(
        ctx.oracle.get_response(&trace_prompt),
        ctx.oracle.get_response(&match_prompt)
    );
    let (traced_reply, match_reply) = (traced_reply?, match_reply?);

    let entities = &relation_stage.entity_stage.entities;
    let parsed = parse_traced_triples(&traced_reply);
    parsed.log_errors("triple tracing");
    let traced: Vec<TracedTriple> = parsed
        .records
        .into_iter()
        .filter(|t| {
            let known = entities.contains_key(&t.triple.head)
                && entities.contains_key(&t.triple.tail);
            if !known {
                debug!(
                    "triple tracing: skipped entry: {}",
                    ProtocolError::unmapped(
                        &format!("({}, {}, {})", t.triple.head, t.triple.relation, t.triple.tail),
                        "head or tail was not extracted as an entity",
                    )
                );
            }
            known
        })
        .collect();

    if traced.is_empty() {
        return Ok(StageOutcome::Halt(HaltReason::NoTracedTriples));
    }

    let matches = parse_relation_type_matches(&match_reply);
    matches.log_errors("relation type match");
    let mut triple_types = HashMap::new();
    let mut literal_types = HashMap::new();
    for m in matches.records {
        let Some(relation_type) = ctx.schema.registry().relation_type(&m.relation_type) else {
            debug!(
                "relation type match: skipped entry: {}",
                ProtocolError::unmapped(&m.relation_type, "not a schema relation type")
            );
            continue;
        };
        literal_types
            .entry(m.triple.relation.clone())
            .or_insert_with(|| relation_type.name.clone());
        triple_types.insert(m.triple, relation_type.name.clone());
    }

    Ok(StageOutcome::Continue(TracedStage {
        relation_stage,
        traced,
        triple_types,
        literal_types,
    }))
}

/// Stage 4: extract declared attributes of the entities in traced triples
pub async fn extract_attributes(
    ctx: &StageContext<'_>,
    traced_stage: TracedStage,
) -> Result<AttributedStage, LlmError> {
    let mut wanted: IndexMap<&str, &[String]> = IndexMap::new();
    for traced in &traced_stage.traced {
        for name in [&traced.triple.head, &traced.triple.tail] {
            if let Some(entity_type) = traced_stage.entities().get(name) {
                let keys = ctx.schema.declared_attributes(entity_type);
                if !keys.is_empty() {
                    wanted.insert(name.as_str(), keys);
                }
            }
        }
    }

    let mut extracted = IndexMap::new();
    if !wanted.is_empty() {
        let listing = wanted
            .iter()
            .map(|(name, keys)| format!("{}({})", name, keys.join(", ")))
            .collect::<Vec<_>>()
            .join("; ");
        let reply = ctx
            .oracle
            .get_response(&prompt::attribute_extraction(ctx.chunk, &listing))
            .await?;
        let parsed = parse_attributes(&reply);
        parsed.log_errors("attribute extraction");
        extracted = parsed.records;
    }

    let mut attributes = HashMap::new();
    for (name, entity_type) in traced_stage.entities() {
        let keys = ctx.schema.declared_attributes(entity_type);
        let found = extracted.get(name);
        let values = keys
            .iter()
            .map(|key| {
                let value = found
                    .and_then(|f| f.get(key))
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_ATTRIBUTE.to_string());
                (key.clone(), value)
            })
            .collect();
        attributes.insert(name.clone(), values);
    }

    Ok(AttributedStage {
        traced_stage,
        attributes,
    })
}

/// Turn the final record into typed triples with derived ids
pub fn finish(stage: AttributedStage, window: HashWindow) -> Vec<ExtractedTriple> {
    let traced_stage = &stage.traced_stage;
    let entities = traced_stage.entities();

    traced_stage
        .traced
        .iter()
        .filter_map(|traced| {
            let triple = &traced.triple;
            let head_type = entities.get(&triple.head)?.clone();
            let tail_type = entities.get(&triple.tail)?.clone();
            Some(ExtractedTriple {
                id: TripleId::derive(&triple.head, &triple.relation, &triple.tail, window),
                window,
                head: triple.head.clone(),
                head_type,
                head_attributes: stage.attributes.get(&triple.head).cloned().unwrap_or_default(),
                relation: triple.relation.clone(),
                relation_type: traced_stage.relation_type(triple),
                tail: triple.tail.clone(),
                tail_type,
                tail_attributes: stage.attributes.get(&triple.tail).cloned().unwrap_or_default(),
                provenance: traced.source.clone(),
            })
        })
        .collect()
}

/// Run all four stages on one chunk
pub async fn run_chunk(
    ctx: &StageContext<'_>,
    window: HashWindow,
) -> Result<StageOutcome<Vec<ExtractedTriple>>, LlmError> {
    let entity_stage = match extract_entities(ctx).await? {
        StageOutcome::Continue(stage) => stage,
        StageOutcome::Halt(reason) => return Ok(StageOutcome::Halt(reason)),
    };
    let relation_stage = match extract_relations(ctx, entity_stage).await? {
        StageOutcome::Continue(stage) => stage,
        StageOutcome::Halt(reason) => return Ok(StageOutcome::Halt(reason)),
    };
    let traced_stage = match trace_and_match(ctx, relation_stage).await? {
        StageOutcome::Continue(stage) => stage,
        StageOutcome::Halt(reason) => return Ok(StageOutcome::Halt(reason)),
    };
    let attributed = extract_attributes(ctx, traced_stage).await?;
    Ok(StageOutcome::Continue(finish(attributed, window)))
}
