//! SQLite-backed graph repository

use crate::StoreError;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;
use unigraph_domain::traits::GraphRepository;
use unigraph_domain::{GraphId, GraphSnapshot};

/// SQLite-based implementation of GraphRepository
///
/// Each graph is one row holding its JSON snapshot, so saving replaces the
/// whole graph atomically.
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Each thread should have its own
/// SqliteRepository instance.
pub struct SqliteRepository {
    conn: Connection,
}

impl SqliteRepository {
    /// Open (or create) the database at `path`
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let repo = Self { conn };
        repo.initialize_schema()?;
        Ok(repo)
    }

    fn initialize_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(include_str!("schema.sql"))?;
        Ok(())
    }

    /// Number of stored graphs
    pub fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM graphs", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}

impl GraphRepository for SqliteRepository {
    type Error = StoreError;

    fn save(&mut self, snapshot: &GraphSnapshot) -> Result<(), Self::Error> {
        let json = serde_json::to_string(snapshot)?;
        self.conn.execute(
            "INSERT INTO graphs (id, snapshot, entities, communities, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                snapshot = excluded.snapshot,
                entities = excluded.entities,
                communities = excluded.communities,
                updated_at = excluded.updated_at",
            params![
                snapshot.id.to_string(),
                json,
                snapshot.graph.entities.len() as i64,
                snapshot.communities.len() as i64,
                Self::now(),
            ],
        )?;
        debug!("Saved graph {}", snapshot.id);
        Ok(())
    }

    fn get(&self, id: GraphId) -> Result<Option<GraphSnapshot>, Self::Error> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT snapshot FROM graphs WHERE id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(json) => {
                let snapshot: GraphSnapshot = serde_json::from_str(&json)?;
                if snapshot.id != id {
                    return Err(StoreError::InvalidData(format!(
                        "Row {} holds snapshot {}",
                        id, snapshot.id
                    )));
                }
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }

    fn delete(&mut self, id: GraphId) -> Result<bool, Self::Error> {
        let rows = self
            .conn
            .execute("DELETE FROM graphs WHERE id = ?1", params![id.to_string()])?;
        Ok(rows > 0)
    }

    fn list(&self) -> Result<Vec<GraphId>, Self::Error> {
        let mut stmt = self.conn.prepare("SELECT id FROM graphs ORDER BY id")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        ids.iter()
            .map(|id| GraphId::from_string(id).map_err(StoreError::InvalidData))
            .collect()
    }
}
