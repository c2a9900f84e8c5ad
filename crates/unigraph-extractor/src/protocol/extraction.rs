//! Parsers for the four extraction-stage reply formats

use super::tokenizer::{
    clean_token, closing_bracket_end, parse_triple_ref, split_colon, split_entries,
};
use super::{Parsed, ProtocolError};
use indexmap::IndexMap;
use std::collections::BTreeMap;
use unigraph_domain::UNKNOWN_ATTRIBUTE;

const MULTI_ENTRY: &[&str] = &["&&", "\n"];

/// A triple as written by the oracle, before typing
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawTriple {
    /// Head entity name
    pub head: String,
    /// Relation literal
    pub relation: String,
    /// Tail entity name
    pub tail: String,
}

impl RawTriple {
    fn from_parts((head, relation, tail): (String, String, String)) -> Self {
        Self {
            head,
            relation,
            tail,
        }
    }
}

/// A triple with the sentence supporting it
#[derive(Debug, Clone, PartialEq)]
pub struct TracedTriple {
    /// The triple
    pub triple: RawTriple,
    /// Supporting sentence
    pub source: String,
}

/// A triple matched to a schema relation type
#[derive(Debug, Clone, PartialEq)]
pub struct TypeMatch {
    /// The triple
    pub triple: RawTriple,
    /// Matched relation type
    pub relation_type: String,
}

/// Parse `name: type, name: type` into an ordered name to type map
///
/// Later duplicates overwrite earlier ones. Entries without a colon are
/// skipped.
///
/// # Examples
///
/// ```
/// use unigraph_extractor::protocol::parse_entities;
///
/// let parsed = parse_entities("A: T1, B: T2");
/// assert_eq!(parsed.records.get("A").map(String::as_str), Some("T1"));
/// assert_eq!(parsed.records.get("B").map(String::as_str), Some("T2"));
/// assert!(parsed.errors.is_empty());
/// ```
pub fn parse_entities(reply: &str) -> Parsed<IndexMap<String, String>> {
    let normalized = reply.replace('\t', " ");
    let mut records = IndexMap::new();
    let mut errors = Vec::new();

    for entry in split_entries(&normalized, &[",", "，", "\n"]) {
        let Some((name, entity_type)) = split_colon(entry) else {
            errors.push(ProtocolError::malformed(entry, "expected 'entity: type'"));
            continue;
        };
        let (name, entity_type) = (clean_token(name), clean_token(entity_type));
        if name.is_empty() || entity_type.is_empty() {
            errors.push(ProtocolError::malformed(entry, "empty entity or type"));
            continue;
        }
        records.insert(name.to_string(), entity_type.to_string());
    }

    Parsed { records, errors }
}

/// Parse `(head, relation, tail) && ...`
pub fn parse_triples(reply: &str) -> Parsed<Vec<RawTriple>> {
    let mut records = Vec::new();
    let mut errors = Vec::new();

    for entry in split_entries(reply, MULTI_ENTRY) {
        match parse_triple_ref(entry) {
            Some(parts) => records.push(RawTriple::from_parts(parts)),
            None => errors.push(ProtocolError::malformed(entry, "expected '(head, relation, tail)'")),
        }
    }

    Parsed { records, errors }
}

/// Parse `(head, relation, tail)=>'source' && ...`
pub fn parse_traced_triples(reply: &str) -> Parsed<Vec<TracedTriple>> {
    let mut records = Vec::new();
    let mut errors = Vec::new();

    for entry in split_entries(reply, MULTI_ENTRY) {
        let Some((triple_part, source_part)) = entry.split_once("=>") else {
            errors.push(ProtocolError::malformed(entry, "missing '=>'"));
            continue;
        };
        let Some(parts) = parse_triple_ref(triple_part) else {
            errors.push(ProtocolError::malformed(entry, "expected '(head, relation, tail)'"));
            continue;
        };
        let source = clean_token(source_part);
        if source.is_empty() {
            errors.push(ProtocolError::malformed(entry, "empty source"));
            continue;
        }
        records.push(TracedTriple {
            triple: RawTriple::from_parts(parts),
            source: source.to_string(),
        });
    }

    Parsed { records, errors }
}

/// Parse `(head, relation, tail): relation type && ...`
pub fn parse_relation_type_matches(reply: &str) -> Parsed<Vec<TypeMatch>> {
    let mut records = Vec::new();
    let mut errors = Vec::new();

    for entry in split_entries(reply, MULTI_ENTRY) {
        let Some(end) = closing_bracket_end(entry) else {
            errors.push(ProtocolError::malformed(entry, "expected '(head, relation, tail): type'"));
            continue;
        };
        let Some(parts) = parse_triple_ref(&entry[..end]) else {
            errors.push(ProtocolError::malformed(entry, "expected three triple members"));
            continue;
        };
        let rest = entry[end..].trim_start();
        let rest = rest
            .strip_prefix(':')
            .or_else(|| rest.strip_prefix('：'))
            .unwrap_or("");
        let relation_type = clean_token(rest);
        if relation_type.is_empty() {
            errors.push(ProtocolError::malformed(entry, "missing relation type"));
            continue;
        }
        records.push(TypeMatch {
            triple: RawTriple::from_parts(parts),
            relation_type: relation_type.to_string(),
        });
    }

    Parsed { records, errors }
}

/// Normalize an extracted attribute value
///
/// Empty values and the usual "no value" spellings become
/// [`UNKNOWN_ATTRIBUTE`].
pub fn normalize_attribute_value(value: &str) -> String {
    let value = clean_token(value);
    let missing = value.is_empty()
        || ["none", "null", "n/a", "unknown", "nil"]
            .iter()
            .any(|m| value.eq_ignore_ascii_case(m))
        || matches!(value, "无" | "未知" | "未提及");
    if missing {
        UNKNOWN_ATTRIBUTE.to_string()
    } else {
        value.to_string()
    }
}

/// Parse `name(key: value && key: value); ...`
pub fn parse_attributes(reply: &str) -> Parsed<IndexMap<String, BTreeMap<String, String>>> {
    let mut records: IndexMap<String, BTreeMap<String, String>> = IndexMap::new();
    let mut errors = Vec::new();

    for entry in split_entries(reply, &[";", "；", "\n"]) {
        let Some(open) = entry.find(['(', '（']) else {
            errors.push(ProtocolError::malformed(entry, "expected 'entity(attr: value)'"));
            continue;
        };
        let name = clean_token(&entry[..open]);
        if name.is_empty() {
            errors.push(ProtocolError::malformed(entry, "empty entity name"));
            continue;
        }

        let bracketed = &entry[open..];
        let inner = match closing_bracket_end(bracketed) {
            Some(end) => strip_outer_bracket(&bracketed[..end]),
            // Tolerate a missing closing bracket at the end of the reply
            None => strip_outer_bracket(bracketed),
        };

        let attributes = records.entry(name.to_string()).or_default();
        for pair in split_entries(inner, &["&&"]) {
            match split_colon(pair) {
                Some((key, value)) if !clean_token(key).is_empty() => {
                    attributes.insert(
                        clean_token(key).to_string(),
                        normalize_attribute_value(value),
                    );
                }
                _ => errors.push(ProtocolError::malformed(pair, "expected 'attribute: value'")),
            }
        }
    }

    Parsed { records, errors }
}

fn strip_outer_bracket(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix('(')
        .or_else(|| text.strip_prefix('（'))
        .unwrap_or(text);
    text.strip_suffix(')')
        .or_else(|| text.strip_suffix('）'))
        .unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entities_simple() {
        let parsed = parse_entities("A: T1, B: T2");
        let expected: IndexMap<String, String> = [("A", "T1"), ("B", "T2")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(parsed.records, expected);
        assert!(parsed.errors.is_empty());
    }

    #[test]
    fn test_entities_malformed_entry_skipped() {
        let parsed = parse_entities("A: T1, broken, B: T2");
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.errors.len(), 1);
        assert!(matches!(&parsed.errors[0], ProtocolError::Malformed { entry, .. } if entry == "broken"));
    }

    #[test]
    fn test_entities_full_width_and_newlines() {
        let parsed = parse_entities("小明：人物，\n数学: 学科\t");
        assert_eq!(parsed.records.get("小明").map(String::as_str), Some("人物"));
        assert_eq!(parsed.records.get("数学").map(String::as_str), Some("学科"));
    }

    #[test]
    fn test_entities_empty_reply() {
        let parsed = parse_entities("   ");
        assert!(parsed.records.is_empty());
        assert!(parsed.errors.is_empty());
    }

    #[test]
    fn test_entities_empty_type_rejected() {
        let parsed = parse_entities("A: , B: T2");
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.errors.len(), 1);
    }

    #[test]
    fn test_triples() {
        let parsed = parse_triples("(小明, 喜欢, 数学) && (小明, 就读于, 实验小学) && 小红");
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records[1].relation, "就读于");
        assert_eq!(parsed.errors.len(), 1);
    }

    #[test]
    fn test_traced_triples() {
        let parsed = parse_traced_triples(
            "(小明, 喜欢, 数学)=>'小明喜欢数学。' && (小明, 讨厌, 英语)=>'他不喜欢英语' && (x, y)=>'z'",
        );
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records[0].source, "小明喜欢数学。");
        assert_eq!(parsed.records[1].triple.tail, "英语");
        assert_eq!(parsed.errors.len(), 1);
    }

    #[test]
    fn test_traced_triples_missing_arrow_and_source() {
        let parsed = parse_traced_triples("(a, r, b): 'src' && (a, r, c)=>''");
        assert!(parsed.records.is_empty());
        assert_eq!(parsed.errors.len(), 2);
    }

    #[test]
    fn test_relation_type_matches() {
        let parsed = parse_relation_type_matches(
            "(小明, 喜欢, 数学): 喜欢 && (小明, 就读于, 实验小学)：就读 && 喜欢",
        );
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records[0].relation_type, "喜欢");
        assert_eq!(parsed.records[1].relation_type, "就读");
        assert_eq!(parsed.errors.len(), 1);
    }

    #[test]
    fn test_relation_type_match_missing_type() {
        let parsed = parse_relation_type_matches("(a, r, b):   ");
        assert!(parsed.records.is_empty());
        assert_eq!(parsed.errors.len(), 1);
    }

    #[test]
    fn test_attributes() {
        let parsed = parse_attributes("小明(年龄: 10 && 性别: None); 数学(领域: 理科)");
        let xiaoming = &parsed.records["小明"];
        assert_eq!(xiaoming["年龄"], "10");
        assert_eq!(xiaoming["性别"], UNKNOWN_ATTRIBUTE);
        assert_eq!(parsed.records["数学"]["领域"], "理科");
        assert!(parsed.errors.is_empty());
    }

    #[test]
    fn test_attributes_value_with_parentheses_and_missing_close() {
        let parsed = parse_attributes("Alice(birth: 1990 (approx) && role: engineer); Bob(role: manager");
        assert_eq!(parsed.records["Alice"]["birth"], "1990 (approx)");
        assert_eq!(parsed.records["Bob"]["role"], "manager");
    }

    #[test]
    fn test_attributes_malformed() {
        let parsed = parse_attributes("no brackets here; Carol(age 30)");
        assert_eq!(parsed.records.len(), 1);
        assert!(parsed.records["Carol"].is_empty());
        assert_eq!(parsed.errors.len(), 2);
    }

    #[test]
    fn test_normalize_attribute_value() {
        assert_eq!(normalize_attribute_value(" None "), UNKNOWN_ATTRIBUTE);
        assert_eq!(normalize_attribute_value(""), UNKNOWN_ATTRIBUTE);
        assert_eq!(normalize_attribute_value("无"), UNKNOWN_ATTRIBUTE);
        assert_eq!(normalize_attribute_value("'10'"), "10");
    }
}
