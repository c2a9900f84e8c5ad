//! In-memory graph repository

use crate::StoreError;
use std::collections::BTreeMap;
use unigraph_domain::traits::GraphRepository;
use unigraph_domain::{GraphId, GraphSnapshot};

/// GraphRepository kept in a map
///
/// Snapshots are cloned in and out, so callers never share state with the
/// repository.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    graphs: BTreeMap<GraphId, GraphSnapshot>,
}

impl MemoryRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored graphs
    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    /// True when nothing is stored
    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }
}

impl GraphRepository for MemoryRepository {
    type Error = StoreError;

    fn save(&mut self, snapshot: &GraphSnapshot) -> Result<(), Self::Error> {
        self.graphs.insert(snapshot.id, snapshot.clone());
        Ok(())
    }

    fn get(&self, id: GraphId) -> Result<Option<GraphSnapshot>, Self::Error> {
        Ok(self.graphs.get(&id).cloned())
    }

    fn delete(&mut self, id: GraphId) -> Result<bool, Self::Error> {
        Ok(self.graphs.remove(&id).is_some())
    }

    fn list(&self) -> Result<Vec<GraphId>, Self::Error> {
        Ok(self.graphs.keys().copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_and_delete() {
        let mut repo = MemoryRepository::new();
        let snapshot = GraphSnapshot::new(None);
        repo.save(&snapshot).unwrap();

        assert_eq!(repo.get(snapshot.id).unwrap(), Some(snapshot.clone()));
        assert_eq!(repo.list().unwrap(), vec![snapshot.id]);
        assert!(repo.delete(snapshot.id).unwrap());
        assert!(!repo.delete(snapshot.id).unwrap());
        assert!(repo.is_empty());
    }
}
