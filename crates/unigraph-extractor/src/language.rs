//! Prompt language detection

use serde::{Deserialize, Serialize};
use std::fmt;

/// Language the induction prompts ask the oracle to answer in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    /// Simplified Chinese
    Chinese,
    /// English
    English,
}

impl Language {
    /// Chinese when CJK characters outnumber Latin letters
    ///
    /// # Examples
    ///
    /// ```
    /// use unigraph_extractor::Language;
    ///
    /// assert_eq!(Language::detect("小明喜欢数学"), Language::Chinese);
    /// assert_eq!(Language::detect("Alice likes maths"), Language::English);
    /// ```
    pub fn detect(text: &str) -> Self {
        let (cjk, latin) = text.chars().fold((0usize, 0usize), |(cjk, latin), c| {
            if is_cjk(c) {
                (cjk + 1, latin)
            } else if c.is_ascii_alphabetic() {
                (cjk, latin + 1)
            } else {
                (cjk, latin)
            }
        });
        if cjk > latin {
            Language::Chinese
        } else {
            Language::English
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Chinese => f.write_str("Chinese"),
            Language::English => f.write_str("English"),
        }
    }
}

/// CJK unified ideographs (base block and extension A)
pub fn is_cjk(c: char) -> bool {
    matches!(c, '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}')
}
