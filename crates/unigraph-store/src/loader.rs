//! Plain text document loading and paragraph chunking

use crate::StoreError;
use std::path::Path;
use tracing::debug;
use unigraph_domain::traits::DocumentLoader;

const SUPPORTED_EXTENSIONS: [&str; 3] = ["txt", "md", "markdown"];

/// Loads UTF-8 text and markdown files
///
/// # Examples
///
/// ```
/// use unigraph_store::PlainTextLoader;
///
/// let loader = PlainTextLoader::new(10);
/// let chunks = loader.chunk("小明喜欢数学。\n\n小红喜欢语文。\n\n\n");
/// assert_eq!(chunks, vec!["小明喜欢数学。", "小红喜欢语文。"]);
/// ```
#[derive(Debug, Clone)]
pub struct PlainTextLoader {
    max_chunk_chars: usize,
}

impl Default for PlainTextLoader {
    fn default() -> Self {
        Self::new(1200)
    }
}

impl PlainTextLoader {
    /// Create a loader whose chunks hold at most `max_chunk_chars` characters
    pub fn new(max_chunk_chars: usize) -> Self {
        Self {
            max_chunk_chars: max_chunk_chars.max(1),
        }
    }

    /// Load `path` and split it into chunks
    pub fn load_chunks(&self, path: &Path) -> Result<Vec<String>, StoreError> {
        let text = self.load(path)?;
        let chunks = self.chunk(&text);
        debug!("Loaded {} chunks from {}", chunks.len(), path.display());
        Ok(chunks)
    }

    /// Split text into chunks at blank lines
    ///
    /// Paragraphs are combined while they fit; a paragraph longer than the
    /// limit is split at character boundaries.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let normalized = text.replace("\r\n", "\n");
        let paragraphs = normalized
            .split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty());

        let mut chunks = Vec::new();
        let mut current = String::new();
        for paragraph in paragraphs {
            let len = paragraph.chars().count();
            let current_len = current.chars().count();

            if current_len > 0 && current_len + 2 + len > self.max_chunk_chars {
                chunks.push(std::mem::take(&mut current));
            }
            if len > self.max_chunk_chars {
                chunks.extend(self.split_at_char_limit(paragraph));
                continue;
            }
            if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(paragraph);
        }
        if !current.is_empty() {
            chunks.push(current);
        }
        chunks
    }

    fn split_at_char_limit(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        chars
            .chunks(self.max_chunk_chars)
            .map(|c| c.iter().collect())
            .collect()
    }
}

impl DocumentLoader for PlainTextLoader {
    type Error = StoreError;

    fn load(&self, path: &Path) -> Result<String, Self::Error> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(StoreError::UnsupportedFormat(path.display().to_string()));
        }

        let bytes = std::fs::read(path)?;
        String::from_utf8(bytes)
            .map_err(|e| StoreError::InvalidData(format!("{} is not UTF-8: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_paragraphs_combine() {
        let loader = PlainTextLoader::new(100);
        let chunks = loader.chunk("First paragraph.\n\nSecond paragraph.");
        assert_eq!(chunks, vec!["First paragraph.\n\nSecond paragraph."]);
    }

    #[test]
    fn test_limit_starts_new_chunk() {
        let loader = PlainTextLoader::new(20);
        let chunks = loader.chunk("First paragraph.\r\n\r\nSecond paragraph.");
        assert_eq!(chunks, vec!["First paragraph.", "Second paragraph."]);
    }

    #[test]
    fn test_long_paragraph_split_on_char_boundaries() {
        let loader = PlainTextLoader::new(4);
        let chunks = loader.chunk("小明喜欢数学和语文");
        assert_eq!(chunks, vec!["小明喜欢", "数学和语", "文"]);
    }

    #[test]
    fn test_blank_text_has_no_chunks() {
        assert!(PlainTextLoader::default().chunk("  \n\n \n").is_empty());
    }

    #[test]
    fn test_unsupported_extension() {
        let err = PlainTextLoader::default()
            .load(Path::new("report.pdf"))
            .unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedFormat(_)));
    }
}
