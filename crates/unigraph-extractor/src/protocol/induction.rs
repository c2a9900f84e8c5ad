//! Parsers for the line-oriented schema-induction reply formats

use super::tokenizer::{clean_token, closing_bracket_end, parse_triple_ref, split_colon, strip_list_marker};
use super::{Parsed, ProtocolError};
use indexmap::IndexMap;

/// A triple mined from seed text together with its source sentence
#[derive(Debug, Clone, PartialEq)]
pub struct MinedTriple {
    /// Head entity name
    pub head: String,
    /// Relation literal
    pub relation: String,
    /// Tail entity name
    pub tail: String,
    /// Supporting sentence
    pub source: String,
}

/// Parse one `(head, relation, tail): source` per line
///
/// Lines without a bracketed triple are skipped; a missing source yields
/// an empty `source` rather than an error.
pub fn parse_mined_triples(reply: &str) -> Parsed<Vec<MinedTriple>> {
    let mut records = Vec::new();
    let mut errors = Vec::new();

    for line in reply.lines().map(strip_list_marker) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some(open) = line.find(['(', '（']) else {
            errors.push(ProtocolError::malformed(line, "no bracketed triple"));
            continue;
        };
        let bracketed = &line[open..];
        let Some(end) = closing_bracket_end(bracketed) else {
            errors.push(ProtocolError::malformed(line, "unclosed bracket"));
            continue;
        };
        let Some((head, relation, tail)) = parse_triple_ref(&bracketed[..end]) else {
            errors.push(ProtocolError::malformed(line, "expected three triple members"));
            continue;
        };

        let rest = bracketed[end..].trim_start();
        let rest = rest
            .strip_prefix(':')
            .or_else(|| rest.strip_prefix('：'))
            .or_else(|| rest.strip_prefix("=>"))
            .unwrap_or(rest);

        records.push(MinedTriple {
            head,
            relation,
            tail,
            source: clean_token(rest).to_string(),
        });
    }

    Parsed { records, errors }
}

/// Parse `type: item1, item2、item3` lines into a type to items map
///
/// Items are deduplicated preserving first-seen order; a type repeated on
/// several lines accumulates its items.
///
/// # Examples
///
/// ```
/// use unigraph_extractor::protocol::parse_classification;
///
/// let parsed = parse_classification("**人物**: 小明, 小红\n学科：数学、语文");
/// assert_eq!(parsed.records["人物"], vec!["小明", "小红"]);
/// assert_eq!(parsed.records["学科"], vec!["数学", "语文"]);
/// ```
pub fn parse_classification(reply: &str) -> Parsed<IndexMap<String, Vec<String>>> {
    let mut records: IndexMap<String, Vec<String>> = IndexMap::new();
    let mut errors = Vec::new();

    for line in reply.lines().map(strip_list_marker) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((type_name, items)) = split_colon(line) else {
            errors.push(ProtocolError::malformed(line, "expected 'type: item, item'"));
            continue;
        };
        let type_name = clean_token(type_name);
        let items: Vec<&str> = items
            .split([',', '，', '、', ';', '；'])
            .map(clean_token)
            .filter(|i| !i.is_empty())
            .collect();
        if type_name.is_empty() || items.is_empty() {
            errors.push(ProtocolError::malformed(line, "empty type or item list"));
            continue;
        }

        let values = records.entry(type_name.to_string()).or_default();
        for item in items {
            if !values.iter().any(|v| v == item) {
                values.push(item.to_string());
            }
        }
    }

    Parsed { records, errors }
}

/// Parse `type: definition` lines; the first definition of a type wins
pub fn parse_definitions(reply: &str) -> Parsed<IndexMap<String, String>> {
    let mut records = IndexMap::new();
    let mut errors = Vec::new();

    for line in reply.lines().map(strip_list_marker) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = split_colon(line) else {
            errors.push(ProtocolError::malformed(line, "expected 'type: definition'"));
            continue;
        };
        let (key, value) = (clean_token(key), value.trim());
        if key.is_empty() || value.is_empty() {
            errors.push(ProtocolError::malformed(line, "empty type or definition"));
            continue;
        }
        records
            .entry(key.to_string())
            .or_insert_with(|| value.to_string());
    }

    Parsed { records, errors }
}
