//! UniGraph Storage Layer
//!
//! Implements the [`GraphRepository`] and [`DocumentLoader`] traits from
//! `unigraph-domain`.
//!
//! # Architecture
//!
//! - [`SqliteRepository`]: one JSON snapshot row per graph in SQLite
//! - [`MemoryRepository`]: the same contract in a map, for tests and one-off runs
//! - [`PlainTextLoader`]: UTF-8 `.txt`/`.md` files split into paragraph chunks
//!
//! # Examples
//!
//! ```no_run
//! use unigraph_domain::traits::GraphRepository;
//! use unigraph_domain::GraphSnapshot;
//! use unigraph_store::SqliteRepository;
//!
//! let mut repo = SqliteRepository::new("unigraph.db").unwrap();
//! let snapshot = GraphSnapshot::new(None);
//! repo.save(&snapshot).unwrap();
//! assert!(repo.get(snapshot.id).unwrap().is_some());
//! ```

#![warn(missing_docs)]

mod loader;
mod memory;
mod sqlite;

use thiserror::Error;

pub use loader::PlainTextLoader;
pub use memory::MemoryRepository;
pub use sqlite::SqliteRepository;

/// Re-export of the repository and loader traits
pub use unigraph_domain::traits::{DocumentLoader, GraphRepository};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Snapshot could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// File could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File type the loader does not read
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),
}
