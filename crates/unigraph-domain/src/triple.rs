//! Extracted triples and their content-derived identifiers

use crate::types::TypeName;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// Contiguous slice of a SHA-256 hex digest used as an identifier
///
/// The digest has 64 hex characters; a window selects [`HashWindow::WIDTH`]
/// of them starting at `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct HashWindow {
    offset: usize,
}

impl HashWindow {
    /// Number of hex characters in an identifier
    pub const WIDTH: usize = 8;

    /// Largest valid offset
    pub const MAX_OFFSET: usize = 64 - Self::WIDTH;

    /// Create a window at `offset`
    pub fn new(offset: usize) -> Result<Self, String> {
        if offset > Self::MAX_OFFSET {
            return Err(format!(
                "hash window offset {} exceeds maximum {}",
                offset,
                Self::MAX_OFFSET
            ));
        }
        Ok(Self { offset })
    }

    /// Start of the window
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Hash `input` and return the windowed hex slice
    pub fn apply(&self, input: &str) -> String {
        let digest = hex::encode(Sha256::digest(input.as_bytes()));
        digest[self.offset..self.offset + Self::WIDTH].to_string()
    }
}

impl Default for HashWindow {
    fn default() -> Self {
        Self { offset: 0 }
    }
}

impl TryFrom<usize> for HashWindow {
    type Error = String;

    fn try_from(offset: usize) -> Result<Self, Self::Error> {
        Self::new(offset)
    }
}

impl From<HashWindow> for usize {
    fn from(w: HashWindow) -> Self {
        w.offset
    }
}

/// Stable 8-hex-character identifier of a triple
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TripleId(String);

impl TripleId {
    /// Canonical string a triple id is derived from
    pub fn canonical(head: &str, relation: &str, tail: &str) -> String {
        format!("({}, {}, {})", head, relation, tail)
    }

    /// Derive the id of `(head, relation, tail)` under `window`
    ///
    /// # Examples
    ///
    /// ```
    /// use unigraph_domain::{HashWindow, TripleId};
    ///
    /// let window = HashWindow::new(3).unwrap();
    /// let a = TripleId::derive("小明", "喜欢", "数学", window);
    /// let b = TripleId::derive("小明", "喜欢", "数学", window);
    /// assert_eq!(a, b);
    /// assert_eq!(a.as_str().len(), 8);
    /// ```
    pub fn derive(head: &str, relation: &str, tail: &str, window: HashWindow) -> Self {
        Self(window.apply(&Self::canonical(head, relation, tail)))
    }

    /// Wrap an existing id string
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TripleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A typed triple produced by the extraction pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedTriple {
    /// Content-derived id
    pub id: TripleId,

    /// Window the id was derived with
    pub window: HashWindow,

    /// Head entity name
    pub head: String,

    /// Head entity type
    pub head_type: TypeName,

    /// Head entity attributes
    pub head_attributes: BTreeMap<String, String>,

    /// Relation literal as extracted
    pub relation: String,

    /// Schema relation type (falls back to the literal)
    pub relation_type: TypeName,

    /// Tail entity name
    pub tail: String,

    /// Tail entity type
    pub tail_type: TypeName,

    /// Tail entity attributes
    pub tail_attributes: BTreeMap<String, String>,

    /// Source sentence supporting the triple
    pub provenance: String,
}

impl ExtractedTriple {
    /// Canonical `(head, relation, tail)` string
    pub fn canonical(&self) -> String {
        TripleId::canonical(&self.head, &self.relation, &self.tail)
    }

    /// Re-derive the id from the triple's own fields
    pub fn rederive_id(&self) -> TripleId {
        TripleId::derive(&self.head, &self.relation, &self.tail, self.window)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: ids are 8 lowercase hex characters
        #[test]
        fn test_id_shape(head in "\\PC{1,12}", rel in "\\PC{1,6}", tail in "\\PC{1,12}", offset in 0usize..=56) {
            let id = TripleId::derive(&head, &rel, &tail, HashWindow::new(offset).unwrap());
            prop_assert_eq!(id.as_str().len(), 8);
            prop_assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        }

        /// Property: a serialized triple re-derives the same id
        #[test]
        fn test_id_survives_serialization(head in "[a-z一-龥]{1,8}", tail in "[a-z一-龥]{1,8}", offset in 0usize..=56) {
            let window = HashWindow::new(offset).unwrap();
            let triple = ExtractedTriple {
                id: TripleId::derive(&head, "likes", &tail, window),
                window,
                head: head.clone(),
                head_type: TypeName::new("Person"),
                head_attributes: BTreeMap::new(),
                relation: "likes".to_string(),
                relation_type: TypeName::new("likes"),
                tail: tail.clone(),
                tail_type: TypeName::new("Subject"),
                tail_attributes: BTreeMap::new(),
                provenance: String::new(),
            };

            let json = serde_json::to_string(&triple).unwrap();
            let back: ExtractedTriple = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(back.rederive_id(), triple.id);
        }
    }
}
