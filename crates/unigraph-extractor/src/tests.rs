//! Integration tests for induction, extraction and assembly

#[cfg(test)]
mod tests {
    use crate::{
        ExtractionPipeline, ExtractorConfig, GraphAssembler, InductionConfig, InductionRequest,
        JobGate, SchemaInducer,
    };
    use std::sync::Arc;
    use std::time::Duration;
    use unigraph_domain::UNKNOWN_ATTRIBUTE;
    use unigraph_llm::MockOracle;

    fn scripted() -> MockOracle {
        let oracle = MockOracle::default();
        // Induction
        oracle.add_response("Triple Miner", "(小明, 喜欢, 数学): '小明喜欢数学'");
        oracle.add_response("Entity Classifier", "Person: 小明\nSubject: 数学");
        oracle.add_response("Relation Classifier", "喜欢: 喜欢");
        oracle.add_response("Attribute Reasoner", "Person: 年龄");
        oracle.add_response("Type Definer", "Person: 人\nSubject: 学科\n喜欢: 偏好");
        // Extraction
        oracle.add_response("Entity Extractor", "小明: Person, 数学: Subject");
        oracle.add_response("Triples Extractor", "(小明, 喜欢, 数学)");
        oracle.add_response("Triples Tracer", "(小明, 喜欢, 数学)=>'小明喜欢数学'");
        oracle.add_response("Relationship type match", "(小明, 喜欢, 数学): 喜欢");
        oracle.add_response("Attribute Extractor", "小明(年龄: 10)");
        oracle
    }

    #[tokio::test]
    async fn test_induce_extract_assemble() {
        let oracle = scripted();
        let gate = JobGate::new();
        let chunks = vec!["小明喜欢数学".to_string()];

        let inducer = SchemaInducer::new(Arc::new(oracle.clone()), InductionConfig::default()).unwrap();
        let induced = inducer
            .induce(&gate, &InductionRequest::new("学生兴趣", chunks.clone()))
            .await
            .unwrap();
        assert_eq!(induced.schema.entries.len(), 1);

        let pipeline = ExtractionPipeline::new(Arc::new(oracle.clone()), ExtractorConfig::default()).unwrap();
        let extracted = pipeline.extract(&gate, &induced.schema, &chunks).await.unwrap();

        assert_eq!(extracted.triples.len(), 1);
        let triple = &extracted.triples[0];
        assert_eq!((triple.head.as_str(), triple.relation.as_str(), triple.tail.as_str()), ("小明", "喜欢", "数学"));
        assert_eq!(triple.id.as_str().len(), 8);
        assert!(triple.id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(extracted.provenance[&triple.id], "小明喜欢数学");
        assert_eq!(triple.head_attributes["年龄"], "10");

        // Definitions flow into the entity prompt
        assert_eq!(oracle.prompts_containing("Person(人)"), 1);

        let graph = GraphAssembler::new().assemble(&extracted.triples);
        assert_eq!(graph.entities.len(), 2);
        assert_eq!(graph.relationships.len(), 1);
    }

    #[tokio::test]
    async fn test_entities_missing_from_attribute_reply_default_to_unknown() {
        let oracle = scripted();
        let sparse = MockOracle::default();
        for (pattern, reply) in [
            ("Entity Extractor", "小明: Person, 数学: Subject"),
            ("Triples Extractor", "(小明, 喜欢, 数学)"),
            ("Triples Tracer", "(小明, 喜欢, 数学)=>'小明喜欢数学'"),
            ("Attribute Extractor", "小红(年龄: 12)"),
        ] {
            sparse.add_response(pattern, reply);
        }

        let inducer = SchemaInducer::new(Arc::new(oracle), InductionConfig::default()).unwrap();
        let induced = inducer
            .induce(&JobGate::new(), &InductionRequest::new("aim", vec!["小明喜欢数学".to_string()]))
            .await
            .unwrap();

        let pipeline =
            ExtractionPipeline::new(Arc::new(sparse), ExtractorConfig::default()).unwrap();
        let extracted = pipeline
            .extract(&JobGate::new(), &induced.schema, &["小明喜欢数学".to_string()])
            .await
            .unwrap();
        assert_eq!(extracted.triples[0].head_attributes["年龄"], UNKNOWN_ATTRIBUTE);
    }

    #[tokio::test]
    async fn test_partial_chunk_failure_is_reported() {
        let oracle = scripted();
        let inducer = SchemaInducer::new(Arc::new(oracle.clone()), InductionConfig::default()).unwrap();
        let induced = inducer
            .induce(&JobGate::new(), &InductionRequest::new("aim", vec!["小明喜欢数学".to_string()]))
            .await
            .unwrap();

        let flaky = MockOracle::default();
        flaky.add_error("${ broken chunk }$", "bad gateway");
        flaky.add_response("Entity Extractor", "小明: Person, 数学: Subject");
        flaky.add_response("Triples Extractor", "(小明, 喜欢, 数学)");
        flaky.add_response("Triples Tracer", "(小明, 喜欢, 数学)=>'小明喜欢数学'");

        let pipeline = ExtractionPipeline::new(Arc::new(flaky), ExtractorConfig::default()).unwrap();
        let chunks = vec!["小明喜欢数学".to_string(), "broken chunk".to_string()];
        let extracted = pipeline.extract(&JobGate::new(), &induced.schema, &chunks).await.unwrap();

        assert_eq!(extracted.triples.len(), 1);
        assert_eq!(extracted.failures.len(), 1);
        assert_eq!(extracted.failures[0].chunk_index, 1);
        assert!(extracted.failures[0].reason.contains("bad gateway"));
    }

    #[tokio::test]
    async fn test_jobs_sharing_a_gate_run_one_at_a_time() {
        let oracle = scripted().with_latency(Duration::from_millis(20));
        let gate = JobGate::new();
        let schema = SchemaInducer::new(Arc::new(oracle.clone()), InductionConfig::default())
            .unwrap()
            .induce(&gate, &InductionRequest::new("aim", vec!["小明喜欢数学".to_string()]))
            .await
            .unwrap()
            .schema;

        let pipeline = Arc::new(
            ExtractionPipeline::new(Arc::new(oracle.clone()), ExtractorConfig::default()).unwrap(),
        );
        let chunks = vec!["小明喜欢数学".to_string()];

        let first = pipeline.extract(&gate, &schema, &chunks);
        let second = async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            assert!(gate.is_busy());
            pipeline.extract(&gate, &schema, &chunks).await
        };
        let (a, b) = tokio::join!(first, second);

        assert_eq!(a.unwrap().triples, b.unwrap().triples);
        assert!(!gate.is_busy());
    }
}
