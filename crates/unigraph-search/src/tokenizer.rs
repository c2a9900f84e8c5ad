//! Token counting for the context budget
//!
//! [`default_tokenizer`] counts with the `cl100k_base` byte-pair encoding
//! used by OpenAI chat models. [`HeuristicTokenizer`] stands in when that
//! vocabulary cannot be loaded.

use std::sync::{Arc, OnceLock};
use tiktoken_rs::{cl100k_base, CoreBPE};
use tracing::warn;

/// Counts tokens in text
///
/// The context writer measures the whole text after every row, so counts
/// need not be additive across appended text.
pub trait Tokenizer: Send + Sync {
    /// Number of tokens in `text`
    fn count(&self, text: &str) -> usize;
}

/// Byte-pair encoding token counts over the `cl100k_base` vocabulary
///
/// # Examples
///
/// ```
/// use unigraph_search::{BpeTokenizer, Tokenizer};
///
/// let tokenizer = BpeTokenizer::cl100k().unwrap();
/// assert_eq!(tokenizer.count("hello world"), 2);
/// ```
#[derive(Clone)]
pub struct BpeTokenizer {
    bpe: Arc<CoreBPE>,
}

impl BpeTokenizer {
    /// Load the `cl100k_base` vocabulary
    ///
    /// The vocabulary is parsed once per process and shared afterwards.
    pub fn cl100k() -> Result<Self, String> {
        static CL100K: OnceLock<Result<Arc<CoreBPE>, String>> = OnceLock::new();
        CL100K
            .get_or_init(|| {
                cl100k_base()
                    .map(Arc::new)
                    .map_err(|e| format!("Failed to load cl100k_base: {}", e))
            })
            .clone()
            .map(|bpe| Self { bpe })
    }
}

impl Tokenizer for BpeTokenizer {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }
}

/// The `cl100k_base` tokenizer, or the heuristic when it cannot be loaded
pub fn default_tokenizer() -> Arc<dyn Tokenizer> {
    match BpeTokenizer::cl100k() {
        Ok(tokenizer) => Arc::new(tokenizer),
        Err(e) => {
            warn!("{}; estimating tokens heuristically", e);
            Arc::new(HeuristicTokenizer)
        }
    }
}

/// Provider-independent token estimate, the fallback of [`default_tokenizer`]
///
/// Every CJK character is one token; all other characters are estimated at
/// four per token.
///
/// # Examples
///
/// ```
/// use unigraph_search::{HeuristicTokenizer, Tokenizer};
///
/// let tokenizer = HeuristicTokenizer;
/// assert_eq!(tokenizer.count("小明喜欢数学"), 6);
/// assert_eq!(tokenizer.count("hello world"), 3);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicTokenizer;

impl Tokenizer for HeuristicTokenizer {
    fn count(&self, text: &str) -> usize {
        let (cjk, other) = text.chars().fold((0usize, 0usize), |(cjk, other), c| {
            if is_cjk(c) {
                (cjk + 1, other)
            } else {
                (cjk, other + 1)
            }
        });
        cjk + other.div_ceil(4)
    }
}

fn is_cjk(c: char) -> bool {
    matches!(c as u32,
        0x3040..=0x30FF      // Hiragana, Katakana
        | 0x3400..=0x4DBF    // CJK Extension A
        | 0x4E00..=0x9FFF    // CJK Unified Ideographs
        | 0xAC00..=0xD7AF    // Hangul syllables
        | 0xF900..=0xFAFF    // CJK Compatibility Ideographs
        | 0xFF00..=0xFFEF    // Fullwidth forms
        | 0x3000..=0x303F    // CJK punctuation
        | 0x20000..=0x2FA1F) // Extensions B and later
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_bpe_counts() {
        let tokenizer = BpeTokenizer::cl100k().unwrap();
        assert_eq!(tokenizer.count(""), 0);
        assert_eq!(tokenizer.count("hello world"), 2);
        assert!(tokenizer.count("小明喜欢数学") >= 3);
    }

    #[test]
    fn test_default_is_bpe() {
        let tokenizer = default_tokenizer();
        let text = "-----Entities-----\nid|entity|type|description\n";
        assert_eq!(tokenizer.count(text), BpeTokenizer::cl100k().unwrap().count(text));
    }

    #[test]
    fn test_mixed_text() {
        let tokenizer = HeuristicTokenizer;
        assert_eq!(tokenizer.count(""), 0);
        assert_eq!(tokenizer.count("abcd"), 1);
        assert_eq!(tokenizer.count("abcde"), 2);
        assert_eq!(tokenizer.count("小明 likes"), 2 + 2);
        assert_eq!(tokenizer.count("，。"), 2);
    }

    proptest! {
        #[test]
        fn prop_count_is_monotone_under_append(a in "\\PC*", b in "\\PC*") {
            let tokenizer = HeuristicTokenizer;
            let joined = format!("{}{}", a, b);
            prop_assert!(tokenizer.count(&joined) >= tokenizer.count(&a));
        }
    }
}
