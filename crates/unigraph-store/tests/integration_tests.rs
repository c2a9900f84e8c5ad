//! Integration tests for unigraph-store
//!
//! These tests verify the save/get/delete/list cycle against a file-backed
//! database and loading documents from disk.

use std::collections::BTreeMap;
use unigraph_domain::traits::{DocumentLoader, GraphRepository};
use unigraph_domain::{
    Community, Entity, GraphId, GraphSnapshot, KnowledgeGraph, Relationship, TypeName,
};
use unigraph_store::{MemoryRepository, PlainTextLoader, SqliteRepository, StoreError};

fn populated_snapshot() -> GraphSnapshot {
    let mut snapshot = GraphSnapshot::new(None);
    snapshot.graph = KnowledgeGraph {
        entities: vec![Entity {
            id: "e1".to_string(),
            name: "小明".to_string(),
            entity_type: TypeName::new("Person"),
            attributes: BTreeMap::from([("年龄".to_string(), "10".to_string())]),
            attributes_embedding: vec![0.5, -0.25],
            community_ids: BTreeMap::from([(0, "0-0".to_string())]),
        }],
        relationships: vec![Relationship {
            id: "a1b2c3d4".to_string(),
            source: "e1".to_string(),
            target: "e2".to_string(),
            relation_type: TypeName::new("喜欢"),
            name: "喜欢".to_string(),
            attributes: BTreeMap::new(),
            provenance: "小明喜欢数学".to_string(),
        }],
    };
    snapshot.communities = vec![Community {
        id: "0-0".to_string(),
        level: 0,
        parent: None,
        member_entity_ids: vec!["e1".to_string()],
        title: "兴趣".to_string(),
        summary: "小明喜欢数学".to_string(),
        full_content: "# 兴趣".to_string(),
        rating: 4.5,
        rating_explanation: String::new(),
        findings: vec![],
        attributes: BTreeMap::new(),
    }];
    snapshot
}

#[test]
fn test_snapshot_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("unigraph.db");
    let snapshot = populated_snapshot();

    {
        let mut repo = SqliteRepository::new(&path).unwrap();
        repo.save(&snapshot).unwrap();
    }

    let repo = SqliteRepository::new(&path).unwrap();
    let loaded = repo.get(snapshot.id).unwrap().expect("snapshot should exist");
    assert_eq!(loaded, snapshot);
}

#[test]
fn test_save_replaces_existing_graph() {
    let mut repo = SqliteRepository::new(":memory:").unwrap();
    let mut snapshot = populated_snapshot();
    repo.save(&snapshot).unwrap();

    snapshot.communities.clear();
    repo.save(&snapshot).unwrap();

    assert_eq!(repo.count().unwrap(), 1);
    assert!(repo.get(snapshot.id).unwrap().unwrap().communities.is_empty());
}

#[test]
fn test_list_in_creation_order_and_delete() {
    let mut repo = SqliteRepository::new(":memory:").unwrap();
    let first = GraphSnapshot::new(None);
    let second = GraphSnapshot::new(None);
    repo.save(&second).unwrap();
    repo.save(&first).unwrap();

    let mut expected = vec![first.id, second.id];
    expected.sort();
    assert_eq!(repo.list().unwrap(), expected);

    assert!(repo.delete(first.id).unwrap());
    assert!(!repo.delete(first.id).unwrap());
    assert_eq!(repo.list().unwrap(), vec![second.id]);
}

#[test]
fn test_missing_graph() {
    let repo = SqliteRepository::new(":memory:").unwrap();
    assert!(repo.get(GraphId::new()).unwrap().is_none());
}

#[test]
fn test_memory_and_sqlite_agree() {
    let snapshot = populated_snapshot();
    let mut sqlite = SqliteRepository::new(":memory:").unwrap();
    let mut memory = MemoryRepository::new();
    sqlite.save(&snapshot).unwrap();
    memory.save(&snapshot).unwrap();

    assert_eq!(
        sqlite.get(snapshot.id).unwrap(),
        memory.get(snapshot.id).unwrap()
    );
}

#[test]
fn test_load_chunks_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.md");
    std::fs::write(&path, "小明喜欢数学。\n\n小红喜欢语文。\n").unwrap();

    let loader = PlainTextLoader::new(10);
    assert_eq!(
        loader.load_chunks(&path).unwrap(),
        vec!["小明喜欢数学。", "小红喜欢语文。"]
    );
}

#[test]
fn test_invalid_utf8_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("binary.txt");
    std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();

    let err = PlainTextLoader::default().load(&path).unwrap_err();
    assert!(matches!(err, StoreError::InvalidData(_)));
}

#[test]
fn test_missing_file_is_io_error() {
    let err = PlainTextLoader::default()
        .load(std::path::Path::new("/nonexistent/unigraph/input.txt"))
        .unwrap_err();
    assert!(matches!(err, StoreError::Io(_)));
}
