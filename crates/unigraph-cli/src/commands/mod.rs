//! Command implementations.

pub mod extract;
pub mod graphs;
pub mod index;
pub mod induce;
pub mod query;

pub use self::extract::execute_extract;
pub use self::graphs::execute_graphs;
pub use self::index::execute_index;
pub use self::induce::execute_induce;
pub use self::query::execute_query;

use crate::error::{CliError, Result};
use std::path::PathBuf;
use tracing::debug;
use unigraph_domain::{GraphId, GraphSnapshot};
use unigraph_store::{GraphRepository, PlainTextLoader, StoreError};

/// Load and chunk every document, in argument order.
pub fn load_documents(files: &[PathBuf]) -> Result<Vec<String>> {
    let loader = PlainTextLoader::default();
    let mut chunks = Vec::new();
    for file in files {
        let loaded = loader.load_chunks(file)?;
        debug!("{}: {} chunk(s)", file.display(), loaded.len());
        chunks.extend(loaded);
    }
    if chunks.is_empty() {
        return Err(CliError::InvalidInput("documents contain no text".to_string()));
    }
    Ok(chunks)
}

/// Fetch a saved graph by its textual id.
pub fn load_graph<R>(repository: &R, id: &str) -> Result<GraphSnapshot>
where
    R: GraphRepository<Error = StoreError>,
{
    let graph_id = GraphId::from_string(id).map_err(CliError::InvalidInput)?;
    repository
        .get(graph_id)?
        .ok_or_else(|| CliError::GraphNotFound(id.to_string()))
}
