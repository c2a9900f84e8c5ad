//! Entry tokenizer and shared lexical helpers

/// Split `input` on any of `delimiters` occurring outside brackets
///
/// Both ASCII `()` and full-width `（）` brackets nest. A single-quoted span
/// opened directly after `=>` is opaque too, so a source sentence may contain
/// the delimiter. Entries are trimmed and empty entries dropped.
///
/// # Examples
///
/// ```
/// use unigraph_extractor::protocol::tokenizer::split_entries;
///
/// let entries = split_entries("(a, r, b)=>'x && y' && (c, r, d)=>'z'", &["&&"]);
/// assert_eq!(entries, vec!["(a, r, b)=>'x && y'", "(c, r, d)=>'z'"]);
/// ```
pub fn split_entries<'a>(input: &'a str, delimiters: &[&str]) -> Vec<&'a str> {
    let mut entries = Vec::new();
    let mut depth: usize = 0;
    let mut in_source_quote = false;
    let mut start = 0;
    let mut i = 0;

    while i < input.len() {
        let rest = &input[i..];

        if in_source_quote {
            if rest.starts_with('\'') && closes_source_quote(&rest[1..], delimiters) {
                in_source_quote = false;
            }
            i += char_len(rest);
            continue;
        }

        if rest.starts_with("=>'") {
            in_source_quote = true;
            i += 3;
            continue;
        }

        if rest.starts_with('(') || rest.starts_with('（') {
            depth += 1;
        } else if rest.starts_with(')') || rest.starts_with('）') {
            depth = depth.saturating_sub(1);
        } else if depth == 0 {
            if let Some(delim) = delimiters.iter().find(|d| rest.starts_with(**d)) {
                push_entry(&mut entries, &input[start..i]);
                i += delim.len();
                start = i;
                continue;
            }
        }
        i += char_len(rest);
    }
    push_entry(&mut entries, &input[start..]);
    entries
}

/// A quote closes a source span when only whitespace separates it from the
/// next delimiter or the end of input
fn closes_source_quote(after: &str, delimiters: &[&str]) -> bool {
    let inline = after.trim_start_matches([' ', '\t']);
    let skipped = after.trim_start();
    skipped.is_empty()
        || delimiters
            .iter()
            .any(|d| inline.starts_with(d) || skipped.starts_with(d))
}

fn char_len(s: &str) -> usize {
    s.chars().next().map(char::len_utf8).unwrap_or(1)
}

fn push_entry<'a>(entries: &mut Vec<&'a str>, entry: &'a str) {
    let entry = entry.trim();
    if !entry.is_empty() {
        entries.push(entry);
    }
}

/// Split at the first ASCII or full-width colon
pub fn split_colon(entry: &str) -> Option<(&str, &str)> {
    let idx = entry.find([':', '：'])?;
    let sep_len = entry[idx..].chars().next().map(char::len_utf8).unwrap_or(1);
    Some((&entry[..idx], &entry[idx + sep_len..]))
}

/// Strip whitespace, quotes and markdown emphasis from both ends
pub fn clean_token(token: &str) -> &str {
    token.trim_matches(|c: char| {
        c.is_whitespace() || matches!(c, '"' | '\'' | '*' | '`' | '“' | '”' | '‘' | '’' | '「' | '」')
    })
}

/// Remove list markers such as `- `, `* `, `1. ` from the start of a line
pub fn strip_list_marker(line: &str) -> &str {
    let line = line.trim_start();
    let line = line
        .strip_prefix("- ")
        .or_else(|| line.strip_prefix("• "))
        .unwrap_or(line);
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix(". ").or_else(|| rest.strip_prefix("、")) {
            return rest.trim_start();
        }
    }
    line
}

/// Parse `(head, relation, tail)` with ASCII or full-width brackets/commas
///
/// Returns `None` unless there are exactly three non-empty members.
pub fn parse_triple_ref(text: &str) -> Option<(String, String, String)> {
    let inner = text.trim();
    let inner = inner
        .strip_prefix('(')
        .or_else(|| inner.strip_prefix('（'))?;
    let inner = inner
        .trim_end()
        .strip_suffix(')')
        .or_else(|| inner.trim_end().strip_suffix('）'))?;

    let parts: Vec<&str> = inner.split([',', '，']).map(clean_token).collect();
    match parts.as_slice() {
        [h, r, t] if !h.is_empty() && !r.is_empty() && !t.is_empty() => {
            Some((h.to_string(), r.to_string(), t.to_string()))
        }
        _ => None,
    }
}

/// Byte index just past the bracket closing the one at the start of `text`
pub fn closing_bracket_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, c) in text.char_indices() {
        match c {
            '(' | '（' => depth += 1,
            ')' | '）' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx + c.len_utf8());
                }
            }
            _ if depth == 0 => return None,
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_respects_parentheses() {
        let entries = split_entries("小明(age: 10 && gender: 男); 数学(field: 理科)", &[";"]);
        assert_eq!(entries, vec!["小明(age: 10 && gender: 男)", "数学(field: 理科)"]);
    }

    #[test]
    fn test_split_multiple_delimiters_and_blank_entries() {
        let entries = split_entries("A: T1,B: T2，\nC: T3,,", &[",", "，", "\n"]);
        assert_eq!(entries, vec!["A: T1", "B: T2", "C: T3"]);
    }

    #[test]
    fn test_apostrophe_inside_source_is_kept() {
        let entries = split_entries("(a, r, b)=>'it's fine' && (c, r, d)=>'ok'", &["&&"]);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], "(a, r, b)=>'it's fine'");
    }

    #[test]
    fn test_source_quote_closes_before_newline_delimiter() {
        let entries = split_entries("(a, r, b)=>'x'\n(c, r, d)=>'y'", &["&&", "\n"]);
        assert_eq!(entries, vec!["(a, r, b)=>'x'", "(c, r, d)=>'y'"]);
    }

    #[test]
    fn test_unbalanced_close_does_not_underflow() {
        let entries = split_entries(") a && b", &["&&"]);
        assert_eq!(entries, vec![") a", "b"]);
    }

    #[test]
    fn test_split_colon_full_width() {
        assert_eq!(split_colon("人物：小明"), Some(("人物", "小明")));
        assert_eq!(split_colon("no colon"), None);
    }

    #[test]
    fn test_clean_token() {
        assert_eq!(clean_token(" **Person** "), "Person");
        assert_eq!(clean_token("\"小明\""), "小明");
    }

    #[test]
    fn test_strip_list_marker() {
        assert_eq!(strip_list_marker("- Person: a"), "Person: a");
        assert_eq!(strip_list_marker("12. Person: a"), "Person: a");
        assert_eq!(strip_list_marker("Person: a"), "Person: a");
    }

    #[test]
    fn test_parse_triple_ref_variants() {
        let expected = Some(("小明".to_string(), "喜欢".to_string(), "数学".to_string()));
        assert_eq!(parse_triple_ref("(小明, 喜欢, 数学)"), expected);
        assert_eq!(parse_triple_ref("（小明，喜欢，数学）"), expected);
        assert_eq!(parse_triple_ref("( 小明 ,喜欢, '数学' )"), expected);
        assert_eq!(parse_triple_ref("(小明, 喜欢)"), None);
        assert_eq!(parse_triple_ref("小明, 喜欢, 数学"), None);
        assert_eq!(parse_triple_ref("(小明, , 数学)"), None);
    }

    #[test]
    fn test_closing_bracket_end() {
        assert_eq!(closing_bracket_end("(a, (b), c): x"), Some(11));
        assert_eq!(closing_bracket_end("（a，b，c）：x"), Some("（a，b，c）".len()));
        assert_eq!(closing_bracket_end("(a, b"), None);
        assert_eq!(closing_bracket_end("a (b)"), None);
    }
}
