//! Grammars for the delimiter-based LLM reply formats
//!
//! Every stage asks the oracle for free text in a fixed shape. Each shape is
//! parsed in two steps: a [`tokenizer`] splits the reply into entries on the
//! protocol delimiter (respecting brackets), then a per-entry parser turns
//! each entry into a typed record or a [`ProtocolError`]. Bad entries are
//! collected, never raised, so one garbled line cannot sink a whole reply.
//!
//! | Reply | Entry delimiter | Entry shape |
//! |-------|-----------------|-------------|
//! | entities | `,` | `name: type` |
//! | triples | `&&` | `(head, relation, tail)` |
//! | tracing | `&&` | `(head, relation, tail)=>'source'` |
//! | type match | `&&` | `(head, relation, tail): type` |
//! | attributes | `;` | `name(key: value && key: value)` |
//! | mined triples | newline | `(head, relation, tail): source` |
//! | classification | newline | `type: item, item、item` |
//! | definitions | newline | `type: definition` |

pub mod extraction;
pub mod induction;
pub mod tokenizer;

use thiserror::Error;

pub use extraction::{
    parse_attributes, parse_entities, parse_relation_type_matches, parse_traced_triples,
    parse_triples, RawTriple, TracedTriple, TypeMatch,
};
pub use induction::{parse_classification, parse_definitions, parse_mined_triples, MinedTriple};

/// A reply entry that could not be turned into a record
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    /// The entry violates the grammar
    #[error("Malformed entry '{entry}': {reason}")]
    Malformed {
        /// Offending entry text
        entry: String,
        /// What was wrong
        reason: String,
    },

    /// The entry names something the schema or earlier stages do not know
    #[error("Unmapped name '{name}': {reason}")]
    Unmapped {
        /// Name that could not be mapped
        name: String,
        /// What it could not be mapped to
        reason: String,
    },
}

impl ProtocolError {
    pub(crate) fn malformed(entry: &str, reason: impl Into<String>) -> Self {
        ProtocolError::Malformed {
            entry: entry.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unmapped(name: &str, reason: impl Into<String>) -> Self {
        ProtocolError::Unmapped {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Records parsed from a reply plus the entries that were skipped
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    /// Successfully parsed records
    pub records: T,

    /// Skipped entries
    pub errors: Vec<ProtocolError>,
}

impl<T> Parsed<T> {
    /// Log skipped entries at debug level
    pub fn log_errors(&self, context: &str) {
        for error in &self.errors {
            tracing::debug!("{}: skipped entry: {}", context, error);
        }
    }
}
