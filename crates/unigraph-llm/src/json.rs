//! JSON payload extraction from LLM replies

use crate::LlmError;

/// Extract JSON from a reply, handling markdown code blocks
///
/// LLMs sometimes wrap JSON in ```` ```json ```` fences or add a sentence
/// before it. Fenced content is unwrapped; otherwise the span from the first
/// `{`/`[` to the matching last `}`/`]` is returned.
///
/// # Examples
///
/// ```
/// use unigraph_llm::extract_json;
///
/// let reply = "```json\n[\"小明\"]\n```";
/// assert_eq!(extract_json(reply).unwrap(), "[\"小明\"]");
/// ```
pub fn extract_json(response: &str) -> Result<String, LlmError> {
    let trimmed = response.trim();

    if trimmed.starts_with("```") {
        let lines: Vec<&str> = trimmed.lines().collect();
        if lines.len() < 2 {
            return Err(LlmError::InvalidResponse("Empty code block".to_string()));
        }
        // Skip first line (```json or ```) and the closing fence if present
        let end = if lines[lines.len() - 1].trim_start().starts_with("```") {
            lines.len() - 1
        } else {
            lines.len()
        };
        let body = lines[1..end].join("\n");
        if body.trim().is_empty() {
            return Err(LlmError::InvalidResponse("Empty code block".to_string()));
        }
        return Ok(body.trim().to_string());
    }

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return Ok(trimmed.to_string());
    }

    let start = trimmed.find(['{', '[']);
    let end = trimmed.rfind(['}', ']']);
    match (start, end) {
        (Some(s), Some(e)) if e > s => Ok(trimmed[s..=e].to_string()),
        _ => Err(LlmError::InvalidResponse(format!(
            "No JSON payload in response: {}",
            truncate(trimmed, 80)
        ))),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}
