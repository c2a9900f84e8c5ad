//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::graph::{GraphId, GraphSnapshot};
use std::path::Path;

/// Trait for storing and retrieving graph snapshots
///
/// Implemented by the infrastructure layer (unigraph-store)
pub trait GraphRepository {
    /// Error type for repository operations
    type Error;

    /// Insert or replace a snapshot
    fn save(&mut self, snapshot: &GraphSnapshot) -> Result<(), Self::Error>;

    /// Get a snapshot by id
    fn get(&self, id: GraphId) -> Result<Option<GraphSnapshot>, Self::Error>;

    /// Delete a snapshot, returning whether it existed
    fn delete(&mut self, id: GraphId) -> Result<bool, Self::Error>;

    /// List stored graph ids, oldest first
    fn list(&self) -> Result<Vec<GraphId>, Self::Error>;
}

/// Trait for turning a file into text
///
/// Implemented by the infrastructure layer (unigraph-store)
pub trait DocumentLoader {
    /// Error type for loading
    type Error;

    /// Read the document at `path` as text
    fn load(&self, path: &Path) -> Result<String, Self::Error>;
}
