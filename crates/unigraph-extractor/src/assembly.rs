//! Folding extracted triples into graph records

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;
use unigraph_domain::{
    Entity, ExtractedTriple, HashWindow, KnowledgeGraph, Relationship, TypeName,
    UNKNOWN_ATTRIBUTE,
};

/// Counts reported by [`GraphAssembler::merge`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeStats {
    /// Entities created
    pub entities_added: usize,
    /// Existing entities whose unknown attributes were filled in
    pub entities_updated: usize,
    /// Relationships created
    pub relationships_added: usize,
    /// Triples skipped because their id was already present
    pub duplicates_ignored: usize,
}

/// Builds entities and relationships from triples
///
/// Entities are keyed by `(name, type)` and get the 8-hex id of
/// `"name|type"`; relationships reuse the triple id. Merging is additive:
/// nothing already in the graph is removed or overwritten except
/// `"Unknown"` attribute values.
#[derive(Debug, Clone, Default)]
pub struct GraphAssembler {
    window: HashWindow,
}

impl GraphAssembler {
    /// Create an assembler
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an assembler deriving entity ids through `window`
    pub fn with_window(window: HashWindow) -> Self {
        Self { window }
    }

    /// Stable id of the entity `name` of type `entity_type`
    pub fn entity_id(&self, name: &str, entity_type: &str) -> String {
        self.window.apply(&format!("{}|{}", name, entity_type))
    }

    /// Build a fresh graph from `triples`
    pub fn assemble(&self, triples: &[ExtractedTriple]) -> KnowledgeGraph {
        let mut graph = KnowledgeGraph::default();
        self.merge(&mut graph, triples);
        graph
    }

    /// Add `triples` to `graph`
    pub fn merge(&self, graph: &mut KnowledgeGraph, triples: &[ExtractedTriple]) -> MergeStats {
        let mut stats = MergeStats::default();
        let mut entity_index: HashMap<String, usize> = graph
            .entities
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id.clone(), i))
            .collect();
        let mut relationship_ids: HashSet<String> =
            graph.relationships.iter().map(|r| r.id.clone()).collect();
        let mut updated: HashSet<String> = HashSet::new();

        for triple in triples {
            if relationship_ids.contains(triple.id.as_str()) {
                stats.duplicates_ignored += 1;
                continue;
            }

            let source = self.upsert(
                graph,
                &mut entity_index,
                &mut stats,
                &mut updated,
                (&triple.head, &triple.head_type, &triple.head_attributes),
            );
            let target = self.upsert(
                graph,
                &mut entity_index,
                &mut stats,
                &mut updated,
                (&triple.tail, &triple.tail_type, &triple.tail_attributes),
            );

            graph.relationships.push(Relationship {
                id: triple.id.to_string(),
                source,
                target,
                relation_type: triple.relation_type.clone(),
                name: triple.relation.clone(),
                attributes: BTreeMap::new(),
                provenance: triple.provenance.clone(),
            });
            relationship_ids.insert(triple.id.to_string());
            stats.relationships_added += 1;
        }

        stats.entities_updated = updated.len();
        debug!(
            "Merged {} triples: {} new entities, {} updated, {} new relationships, {} duplicates",
            triples.len(),
            stats.entities_added,
            stats.entities_updated,
            stats.relationships_added,
            stats.duplicates_ignored
        );
        stats
    }

    fn upsert(
        &self,
        graph: &mut KnowledgeGraph,
        index: &mut HashMap<String, usize>,
        stats: &mut MergeStats,
        updated: &mut HashSet<String>,
        (name, entity_type, attributes): (&String, &TypeName, &BTreeMap<String, String>),
    ) -> String {
        let id = self.entity_id(name, entity_type.as_str());

        match index.get(&id) {
            Some(&position) => {
                let entity = &mut graph.entities[position];
                if fill_attributes(&mut entity.attributes, attributes) {
                    updated.insert(id.clone());
                }
            }
            None => {
                index.insert(id.clone(), graph.entities.len());
                graph.entities.push(Entity {
                    id: id.clone(),
                    name: name.clone(),
                    entity_type: entity_type.clone(),
                    attributes: attributes.clone(),
                    attributes_embedding: Vec::new(),
                    community_ids: BTreeMap::new(),
                });
                stats.entities_added += 1;
            }
        }
        id
    }
}

/// Fill unknown or missing values from `incoming`; true when a known value
/// replaced an unknown one
fn fill_attributes(
    existing: &mut BTreeMap<String, String>,
    incoming: &BTreeMap<String, String>,
) -> bool {
    let mut changed = false;
    for (key, value) in incoming {
        match existing.get_mut(key) {
            Some(current) if current == UNKNOWN_ATTRIBUTE && value != UNKNOWN_ATTRIBUTE => {
                *current = value.clone();
                changed = true;
            }
            Some(_) => {}
            None => {
                existing.insert(key.clone(), value.clone());
                changed |= value != UNKNOWN_ATTRIBUTE;
            }
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use unigraph_domain::TripleId;

    fn triple(head: &str, rel: &str, tail: &str, age: &str) -> ExtractedTriple {
        let window = HashWindow::default();
        let mut head_attributes = BTreeMap::new();
        head_attributes.insert("age".to_string(), age.to_string());
        ExtractedTriple {
            id: TripleId::derive(head, rel, tail, window),
            window,
            head: head.to_string(),
            head_type: TypeName::new("Person"),
            head_attributes,
            relation: rel.to_string(),
            relation_type: TypeName::new(rel),
            tail: tail.to_string(),
            tail_type: TypeName::new("Subject"),
            tail_attributes: BTreeMap::new(),
            provenance: format!("{} {} {}", head, rel, tail),
        }
    }

    #[test]
    fn test_assemble_shares_entities() {
        let assembler = GraphAssembler::new();
        let graph = assembler.assemble(&[
            triple("Alice", "likes", "maths", UNKNOWN_ATTRIBUTE),
            triple("Alice", "likes", "art", UNKNOWN_ATTRIBUTE),
        ]);

        assert_eq!(graph.entities.len(), 3);
        assert_eq!(graph.relationships.len(), 2);
        let alice = assembler.entity_id("Alice", "Person");
        assert!(graph.relationships.iter().all(|r| r.source == alice));
        assert_eq!(alice.len(), 8);
    }

    #[test]
    fn test_relationship_reuses_triple_id_and_provenance() {
        let t = triple("Alice", "likes", "maths", "30");
        let graph = GraphAssembler::new().assemble(std::slice::from_ref(&t));
        assert_eq!(graph.relationships[0].id, t.id.as_str());
        assert_eq!(graph.relationships[0].provenance, "Alice likes maths");
        assert_eq!(graph.relationships[0].relation_type.as_str(), "likes");
    }

    #[test]
    fn test_merge_fills_unknown_attributes_and_ignores_duplicates() {
        let assembler = GraphAssembler::new();
        let mut graph = assembler.assemble(&[triple("Alice", "likes", "maths", UNKNOWN_ATTRIBUTE)]);

        let stats = assembler.merge(
            &mut graph,
            &[
                triple("Alice", "likes", "maths", "31"),
                triple("Alice", "studies", "maths", "30"),
            ],
        );

        assert_eq!(stats.duplicates_ignored, 1);
        assert_eq!(stats.relationships_added, 1);
        assert_eq!(stats.entities_added, 0);
        assert_eq!(stats.entities_updated, 1);
        assert_eq!(graph.entities[0].attributes["age"], "30");
    }

    #[test]
    fn test_known_attributes_are_not_overwritten() {
        let assembler = GraphAssembler::new();
        let mut graph = assembler.assemble(&[triple("Alice", "likes", "maths", "30")]);
        assembler.merge(&mut graph, &[triple("Alice", "studies", "art", "99")]);
        assert_eq!(graph.entities[0].attributes["age"], "30");
    }

    #[test]
    fn test_same_name_different_type_are_distinct() {
        let assembler = GraphAssembler::new();
        assert_ne!(
            assembler.entity_id("Apple", "Company"),
            assembler.entity_id("Apple", "Fruit")
        );
    }
}
