//! Command tests over a scripted oracle and an in-memory repository

use std::fs;
use std::sync::Arc;
use unigraph_cli::cli::{ExtractArgs, IndexArgs, InduceArgs, QueryArgs};
use unigraph_cli::commands;
use unigraph_cli::config::OutputFormat;
use unigraph_cli::{CliError, Formatter};
use unigraph_llm::MockOracle;
use unigraph_sdk::{UniGraph, UniGraphConfig};
use unigraph_store::{GraphRepository, MemoryRepository};

fn scripted() -> MockOracle {
    let oracle = MockOracle::default();
    oracle.add_response(
        "Community Reporter",
        r#"{"title": "小明与数学", "summary": "学生与学科", "rating": 2, "findings": []}"#,
    );
    oracle.add_response("Mention Extractor", r#"["小明"]"#);
    oracle.add_response("---Role---", "小明喜欢数学。");
    oracle.add_response("Triple Miner", "(小明, 喜欢, 数学): '小明喜欢数学'");
    oracle.add_response("Entity Classifier", "Person: 小明\nSubject: 数学");
    oracle.add_response("Relation Classifier", "喜欢: 喜欢");
    oracle.add_response("Attribute Reasoner", "Person: 年龄");
    oracle.add_response("Type Definer", "Person: 人\nSubject: 学科\n喜欢: 偏好");
    oracle.add_response("Entity Extractor", "小明: Person, 数学: Subject");
    oracle.add_response("Triples Extractor", "(小明, 喜欢, 数学)");
    oracle.add_response("Triples Tracer", "(小明, 喜欢, 数学)=>'小明喜欢数学'");
    oracle.add_response("Relationship type match", "(小明, 喜欢, 数学): 喜欢");
    oracle.add_response("Attribute Extractor", "小明(年龄: 10)");
    oracle
}

#[tokio::test]
async fn test_induce_extract_index_query() {
    let dir = tempfile::tempdir().unwrap();
    let document = dir.path().join("seed.txt");
    let schema_path = dir.path().join("schema.json");
    fs::write(&document, "小明喜欢数学\n").unwrap();

    let unigraph = UniGraph::new(Arc::new(scripted()), UniGraphConfig::default()).unwrap();
    let formatter = Formatter::new(OutputFormat::Json, false);
    let mut repository = MemoryRepository::new();

    let schema = commands::execute_induce(
        InduceArgs {
            aim: "学生兴趣".to_string(),
            suggestion: None,
            output: Some(schema_path.clone()),
            files: vec![document.clone()],
        },
        &unigraph,
        &formatter,
    )
    .await
    .unwrap();
    assert_eq!(schema.entries.len(), 1);
    assert!(schema_path.exists());

    let graph_id = commands::execute_extract(
        ExtractArgs {
            schema: schema_path,
            graph: None,
            files: vec![document],
        },
        &unigraph,
        &mut repository,
        &formatter,
    )
    .await
    .unwrap();

    let saved = repository.get(graph_id).unwrap().unwrap();
    assert_eq!(saved.triples.len(), 1);
    assert_eq!(saved.graph.entities.len(), 2);

    let metrics = commands::execute_index(
        IndexArgs {
            graph: graph_id.to_string(),
            levels: Some(1),
        },
        &unigraph,
        &mut repository,
        &formatter,
    )
    .await
    .unwrap();
    assert_eq!(metrics.total_communities(), 1);
    assert_eq!(repository.get(graph_id).unwrap().unwrap().communities.len(), 1);

    let result = commands::execute_query(
        QueryArgs {
            graph: graph_id.to_string(),
            depth: 1,
            infer: false,
            show_context: true,
            question: "小明喜欢什么".to_string(),
        },
        &unigraph,
        &repository,
        &formatter,
    )
    .await
    .unwrap();
    assert_eq!(result.answer, "小明喜欢数学。");

    let graphs = commands::execute_graphs(&repository, &formatter).unwrap();
    assert_eq!(graphs.len(), 1);
    assert_eq!(graphs[0].communities, 1);
}

#[tokio::test]
async fn test_unknown_graph_is_reported() {
    let unigraph = UniGraph::new(Arc::new(scripted()), UniGraphConfig::default()).unwrap();
    let formatter = Formatter::new(OutputFormat::Table, false);
    let repository = MemoryRepository::new();

    let err = commands::execute_query(
        QueryArgs {
            graph: unigraph_domain::GraphId::new().to_string(),
            depth: 1,
            infer: false,
            show_context: false,
            question: "q".to_string(),
        },
        &unigraph,
        &repository,
        &formatter,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CliError::GraphNotFound(_)));
}

#[tokio::test]
async fn test_malformed_graph_id_is_invalid_input() {
    let unigraph = UniGraph::new(Arc::new(scripted()), UniGraphConfig::default()).unwrap();
    let formatter = Formatter::new(OutputFormat::Table, false);
    let mut repository = MemoryRepository::new();

    let err = commands::execute_index(
        IndexArgs {
            graph: "not-a-uuid".to_string(),
            levels: None,
        },
        &unigraph,
        &mut repository,
        &formatter,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CliError::InvalidInput(_)));
}

#[test]
fn test_empty_documents_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let document = dir.path().join("empty.md");
    fs::write(&document, "\n\n").unwrap();
    assert!(matches!(
        commands::load_documents(&[document]),
        Err(CliError::InvalidInput(_))
    ));
}
