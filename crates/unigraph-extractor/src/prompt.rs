//! LLM prompt templates for schema induction and extraction
//!
//! Each template declares an agent header (`[DEFINE AGENT: ...]`) whose name
//! identifies the stage, the inputs, the constraints and the exact reply
//! format the matching parser in [`crate::protocol`] expects.

/// Header of the entity extraction prompt
pub const ENTITY_EXTRACTOR: &str = "[DEFINE AGENT: Entity Extractor]";
/// Header of the relation extraction prompt
pub const TRIPLES_EXTRACTOR: &str = "[DEFINE AGENT: Triples Extractor]";
/// Header of the provenance tracing prompt
pub const TRIPLES_TRACER: &str = "[DEFINE AGENT: Triples Tracer]";
/// Header of the relation type matching prompt
pub const RELATION_TYPE_MATCHER: &str = "[DEFINE AGENT: Relationship type match]";
/// Header of the attribute extraction prompt
pub const ATTRIBUTE_EXTRACTOR: &str = "[DEFINE AGENT: Attribute Extractor]";
/// Header of the induction triple mining prompt
pub const TRIPLE_MINER: &str = "[DEFINE AGENT: Triple Miner]";
/// Header of the entity classification prompt
pub const ENTITY_CLASSIFIER: &str = "[DEFINE AGENT: Entity Classifier]";
/// Header of the relation classification prompt
pub const RELATION_CLASSIFIER: &str = "[DEFINE AGENT: Relation Classifier]";
/// Header of the attribute reasoning prompt
pub const ATTRIBUTE_REASONER: &str = "[DEFINE AGENT: Attribute Reasoner]";
/// Header of the type definition prompt
pub const TYPE_DEFINER: &str = "[DEFINE AGENT: Type Definer]";

const ENTITY_EXTRACTION: &str = r#"
[DEFINE AGENT: Entity Extractor]
    [DEFINE PERSONA:]
        You are an expert in extracting entities that meet the type definition from the text provided by the user based on the entity type.
    [END PERSONA]

    [DEFINE INPUT]
        documentation: ${ {{text_chunk}} }$
        entity types with definition: ${ {{entity_types}} }$
    [END INPUT]

    [DEFINE CONSTRAINTS]
        action integrity: Ensure the integrity of the extracted entities within their original text.
        output format: The output should follow the format "entity: entity type, ...", without double quotes, using the delimiter , to separate multiple entries.
    [END CONSTRAINTS]

    [DEFINE INSTRUCTION]
        [COMMAND-1 <apply-constraints> action integrity </apply-constraints> Extract all entities in the given <REF> documentation </REF> that meet the given <REF> entity types with definition </REF>.]
        [COMMAND-2 Check and confirm that the extracted entities comply with the type definition, and extract comprehensively.]
        [COMMAND-3 <apply-constraints> output format </apply-constraints> Use the specified format constraint to output your answer.]
    [END INSTRUCTION]
[END AGENT]
"#;

const RELATION_EXTRACTION: &str = r#"
[DEFINE AGENT: Triples Extractor]
    [DEFINE PERSONA:]
        You are an expert in using the given relationships and entities to construct triples.
    [END PERSONA]

    [DEFINE INPUT]
        entities: ${ {{entities}} }$
        relationship types with definition: ${ {{relation_types}} }$
        documentation: ${ {{text_chunk}} }$
    [END INPUT]

    [DEFINE CONSTRAINTS]
        entity restriction: The entities contained in the triples you output can only come from the given <REF> entities </REF>.
        comprehensive constraint: Fully utilize all <REF> entities </REF>, thoroughly explore the relationships between entities, and avoid any omissions.
        output format: The output should follow the format "(entity1, relationship, entity2) && ...", without double quotes, using the delimiter && to separate multiple entries.
    [END CONSTRAINTS]

    [DEFINE INSTRUCTION]
        [COMMAND-1 <apply-constraints> entity restriction, comprehensive constraint </apply-constraints> Based on the <REF> entities </REF>, infer and extract relationships from <REF> documentation </REF> to construct triples.]
        [COMMAND-2 Check and confirm that the semantics and logical order of the triples are consistent with the <REF> documentation </REF>.]
        [COMMAND-3 <apply-constraints> output format </apply-constraints> Use the specified format constraint to output your answer.]
    [END INSTRUCTION]
[END AGENT]
"#;

const TRIPLES_TRACING: &str = r#"
[DEFINE AGENT: Triples Tracer]
    [DEFINE PERSONA:]
        You are an expert in tracing triples back to their source sentences.
    [END PERSONA]

    [DEFINE INPUT]
        triples_set: ${ {{triples}} }$
        documentation: ${ {{text_chunk}} }$
    [END INPUT]

    [DEFINE CONSTRAINTS]
        semantic association: The source information of each triple must be consistent with the meaning the triple expresses.
        output format: The output should follow the format "(entity1, relationship, entity2)=>'source information' && ...", without double quotes, using the delimiter && to separate multiple entries.
    [END CONSTRAINTS]

    [DEFINE INSTRUCTION]
        [COMMAND-1 Read each triple in <REF> triples_set </REF> and understand its semantics.]
        [COMMAND-2 <apply-constraints> semantic association </apply-constraints> Extract all sentences related to the triple as source information from the <REF> documentation </REF>.]
        [COMMAND-3 <apply-constraints> output format </apply-constraints> Use the specified format constraint to output your answer.]
    [END INSTRUCTION]
[END AGENT]
"#;

const RELATION_TYPE_MATCH: &str = r#"
[DEFINE AGENT: Relationship type match]
    [DEFINE PERSONA:]
        You are an expert in matching the relationship types of triples.
    [END PERSONA]

    [DEFINE INPUT]
        triples: ${ {{triples}} }$
        relationship types: ${ {{relation_types}} }$
    [END INPUT]

    [DEFINE CONSTRAINTS]
        semantic constraint: The matched relationship type must stay semantically consistent with the relationship of the triple.
        output format: The output should follow the format "(entity1, relationship, entity2): relationship type && ...", without double quotes, using the delimiter && to separate multiple entries.
    [END CONSTRAINTS]

    [DEFINE INSTRUCTION]
        [COMMAND-1 <apply-constraints> semantic constraint </apply-constraints> Based on the <REF> relationship types </REF>, match the semantically closest relationship type for the relationship in each triple.]
        [COMMAND-2 <apply-constraints> output format </apply-constraints> Use the specified format constraint to output your answer.]
    [END INSTRUCTION]
[END AGENT]
"#;

const ATTRIBUTE_EXTRACTION: &str = r#"
[DEFINE AGENT: Attribute Extractor]
    [DEFINE PERSONA:]
        You are a professional attribute extraction expert working from the given entities and attributes.
    [END PERSONA]

    [DEFINE INPUT]
        documentation: ${ {{text_chunk}} }$
        entities with attributes: ${ {{entities_with_attributes}} }$
    [END INPUT]

    [DEFINE CONSTRAINTS]
        action integrity: Every attribute of each entity must be extracted and assigned; assign None to attributes that do not exist in the documentation.
        output format: The output should follow the format "entity(attribute1: value1 && attribute2: None); ...", without double quotes, using the delimiter ; to separate multiple entries and the delimiter && to separate multiple attributes.
    [END CONSTRAINTS]

    [DEFINE INSTRUCTION]
        [COMMAND-1 <apply-constraints> action integrity </apply-constraints> Based on the <REF> documentation </REF>, extract the value of every attribute of each entity in <REF> entities with attributes </REF> as 'attribute: value' pairs.]
        [COMMAND-2 <apply-constraints> output format </apply-constraints> Use the specified format constraint to output your answer.]
    [END INSTRUCTION]
[END AGENT]
"#;

const TRIPLE_MINING: &str = r#"
[DEFINE AGENT: Triple Miner]
    [DEFINE PERSONA:]
        You are a knowledge engineer who discovers facts worth modelling in a knowledge graph.
    [END PERSONA]

    [DEFINE INPUT]
        goal: ${ {{aim}} }$
        direction: ${ {{suggestion}} }$
        documentation: ${ {{text_chunk}} }$
    [END INPUT]

    [DEFINE CONSTRAINTS]
        relevance: Only keep facts that serve the <REF> goal </REF> and follow the <REF> direction </REF> when one is given.
        language: Write entities and relationships in {{language}}.
        output format: One fact per line, following the format "(entity1, relationship, entity2): 'source sentence'".
    [END CONSTRAINTS]

    [DEFINE INSTRUCTION]
        [COMMAND-1 <apply-constraints> relevance </apply-constraints> Read the <REF> documentation </REF> and list the facts it states as triples.]
        [COMMAND-2 Quote, for every triple, the sentence of the <REF> documentation </REF> that states it.]
        [COMMAND-3 <apply-constraints> language, output format </apply-constraints> Use the specified format constraint to output your answer.]
    [END INSTRUCTION]
[END AGENT]
"#;

const ENTITY_CLASSIFICATION: &str = r#"
[DEFINE AGENT: Entity Classifier]
    [DEFINE PERSONA:]
        You are an ontology designer who groups entities into general types.
    [END PERSONA]

    [DEFINE INPUT]
        entities: ${ {{items}} }$
    [END INPUT]

    [DEFINE CONSTRAINTS]
        generality: A type names a category (for example Person, Organization), never a single entity.
        coverage: Every entity belongs to exactly one type.
        language: Write type names in {{language}}.
        output format: One type per line, following the format "type: entity1, entity2, ...".
    [END CONSTRAINTS]

    [DEFINE INSTRUCTION]
        [COMMAND-1 <apply-constraints> generality, coverage </apply-constraints> Assign each of the <REF> entities </REF> to a type.]
        [COMMAND-2 <apply-constraints> language, output format </apply-constraints> Use the specified format constraint to output your answer.]
    [END INSTRUCTION]
[END AGENT]
"#;

const RELATION_CLASSIFICATION: &str = r#"
[DEFINE AGENT: Relation Classifier]
    [DEFINE PERSONA:]
        You are an ontology designer who groups relationship phrases into relationship types.
    [END PERSONA]

    [DEFINE INPUT]
        relationships: ${ {{items}} }$
    [END INPUT]

    [DEFINE CONSTRAINTS]
        generality: A relationship type is a short predicate that covers phrases with the same meaning.
        coverage: Every relationship belongs to exactly one relationship type.
        language: Write relationship types in {{language}}.
        output format: One relationship type per line, following the format "relationship type: relationship1, relationship2, ...".
    [END CONSTRAINTS]

    [DEFINE INSTRUCTION]
        [COMMAND-1 <apply-constraints> generality, coverage </apply-constraints> Assign each of the <REF> relationships </REF> to a relationship type.]
        [COMMAND-2 <apply-constraints> language, output format </apply-constraints> Use the specified format constraint to output your answer.]
    [END INSTRUCTION]
[END AGENT]
"#;

const ATTRIBUTE_REASONING: &str = r#"
[DEFINE AGENT: Attribute Reasoner]
    [DEFINE PERSONA:]
        You are an ontology designer who decides which attributes describe each entity type.
    [END PERSONA]

    [DEFINE INPUT]
        entity types: ${ {{entity_types}} }$
    [END INPUT]

    [DEFINE CONSTRAINTS]
        usefulness: Choose at most five attributes per type that are commonly stated in text about such entities.
        language: Write attribute names in {{language}}.
        output format: One type per line, following the format "type: attribute1, attribute2, ...".
    [END CONSTRAINTS]

    [DEFINE INSTRUCTION]
        [COMMAND-1 <apply-constraints> usefulness </apply-constraints> Propose attributes for every one of the <REF> entity types </REF>.]
        [COMMAND-2 <apply-constraints> language, output format </apply-constraints> Use the specified format constraint to output your answer.]
    [END INSTRUCTION]
[END AGENT]
"#;

const TYPE_DEFINITION: &str = r#"
[DEFINE AGENT: Type Definer]
    [DEFINE PERSONA:]
        You are an ontology designer who writes one-sentence definitions of types.
    [END PERSONA]

    [DEFINE INPUT]
        goal: ${ {{aim}} }$
        types: ${ {{types}} }$
    [END INPUT]

    [DEFINE CONSTRAINTS]
        precision: A definition says what does and does not belong to the type, in the context of the <REF> goal </REF>.
        language: Write definitions in {{language}}.
        output format: One type per line, following the format "type: definition".
    [END CONSTRAINTS]

    [DEFINE INSTRUCTION]
        [COMMAND-1 <apply-constraints> precision </apply-constraints> Define each of the <REF> types </REF>.]
        [COMMAND-2 <apply-constraints> language, output format </apply-constraints> Use the specified format constraint to output your answer.]
    [END INSTRUCTION]
[END AGENT]
"#;

/// Substitute `{{name}}` placeholders in one pass
///
/// Substituted values are never re-scanned, so text containing `{{...}}`
/// is inserted verbatim. Unknown placeholders render empty.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = after[..end].trim();
                if let Some((_, value)) = vars.iter().find(|(k, _)| *k == key) {
                    out.push_str(value);
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out.trim().to_string()
}

/// Stage 1: extract typed entities
pub fn entity_extraction(text_chunk: &str, entity_types: &str) -> String {
    render(
        ENTITY_EXTRACTION,
        &[("text_chunk", text_chunk), ("entity_types", entity_types)],
    )
}

/// Stage 2: build triples between the extracted entities
pub fn relation_extraction(text_chunk: &str, entities: &str, relation_types: &str) -> String {
    render(
        RELATION_EXTRACTION,
        &[
            ("text_chunk", text_chunk),
            ("entities", entities),
            ("relation_types", relation_types),
        ],
    )
}

/// Stage 3a: trace each triple to its source sentence
pub fn triples_tracing(text_chunk: &str, triples: &str) -> String {
    render(
        TRIPLES_TRACING,
        &[("text_chunk", text_chunk), ("triples", triples)],
    )
}

/// Stage 3b: match each triple's relation to a schema relation type
pub fn relation_type_match(triples: &str, relation_types: &str) -> String {
    render(
        RELATION_TYPE_MATCH,
        &[("triples", triples), ("relation_types", relation_types)],
    )
}

/// Stage 4: extract attribute values
pub fn attribute_extraction(text_chunk: &str, entities_with_attributes: &str) -> String {
    render(
        ATTRIBUTE_EXTRACTION,
        &[
            ("text_chunk", text_chunk),
            ("entities_with_attributes", entities_with_attributes),
        ],
    )
}

/// Induction: mine triples with provenance from seed text
pub fn triple_mining(aim: &str, suggestion: Option<&str>, text_chunk: &str, language: &str) -> String {
    render(
        TRIPLE_MINING,
        &[
            ("aim", aim),
            ("suggestion", suggestion.unwrap_or("none")),
            ("text_chunk", text_chunk),
            ("language", language),
        ],
    )
}

/// Induction: classify entity names into types
pub fn entity_classification(items: &str, language: &str) -> String {
    render(
        ENTITY_CLASSIFICATION,
        &[("items", items), ("language", language)],
    )
}

/// Induction: classify relation phrases into relation types
pub fn relation_classification(items: &str, language: &str) -> String {
    render(
        RELATION_CLASSIFICATION,
        &[("items", items), ("language", language)],
    )
}

/// Induction: propose attribute keys per entity type
pub fn attribute_reasoning(entity_types: &str, language: &str) -> String {
    render(
        ATTRIBUTE_REASONING,
        &[("entity_types", entity_types), ("language", language)],
    )
}

/// Induction: define a batch of type names
pub fn type_definition(aim: &str, types: &str, language: &str) -> String {
    render(
        TYPE_DEFINITION,
        &[("aim", aim), ("types", types), ("language", language)],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_once() {
        let out = render("a {{x}} b {{ y }} c", &[("x", "{{y}}"), ("y", "Y")]);
        assert_eq!(out, "a {{y}} b Y c");
    }

    #[test]
    fn test_render_unknown_and_unclosed() {
        assert_eq!(render("a {{missing}} b", &[]), "a  b");
        assert_eq!(render("a {{open", &[]), "a {{open");
    }

    #[test]
    fn test_every_template_starts_with_its_header() {
        let cases = [
            (entity_extraction("t", "e"), ENTITY_EXTRACTOR),
            (relation_extraction("t", "e", "r"), TRIPLES_EXTRACTOR),
            (triples_tracing("t", "x"), TRIPLES_TRACER),
            (relation_type_match("x", "r"), RELATION_TYPE_MATCHER),
            (attribute_extraction("t", "e"), ATTRIBUTE_EXTRACTOR),
            (triple_mining("a", None, "t", "English"), TRIPLE_MINER),
            (entity_classification("i", "English"), ENTITY_CLASSIFIER),
            (relation_classification("i", "English"), RELATION_CLASSIFIER),
            (attribute_reasoning("e", "English"), ATTRIBUTE_REASONER),
            (type_definition("a", "t", "English"), TYPE_DEFINER),
        ];
        for (prompt, header) in cases {
            assert!(prompt.starts_with(header), "{} missing header", header);
            assert!(!prompt.contains("{{"), "{} left a placeholder", header);
        }
    }

    #[test]
    fn test_headers_do_not_leak_into_other_prompts() {
        let prompts = [
            entity_extraction("t", "e"),
            relation_extraction("t", "e", "r"),
            triples_tracing("t", "x"),
            relation_type_match("x", "r"),
            attribute_extraction("t", "e"),
        ];
        for (i, prompt) in prompts.iter().enumerate() {
            let headers = [
                ENTITY_EXTRACTOR,
                TRIPLES_EXTRACTOR,
                TRIPLES_TRACER,
                RELATION_TYPE_MATCHER,
                ATTRIBUTE_EXTRACTOR,
            ];
            for (j, header) in headers.iter().enumerate() {
                assert_eq!(prompt.contains(header), i == j);
            }
        }
    }

    #[test]
    fn test_chunk_is_embedded() {
        let prompt = entity_extraction("小明喜欢数学", "Person(人)");
        assert!(prompt.contains("小明喜欢数学"));
        assert!(prompt.contains("Person(人)"));
    }
}
