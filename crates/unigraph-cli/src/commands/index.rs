//! Index command implementation.

use super::load_graph;
use crate::cli::IndexArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use unigraph_sdk::{IndexMetrics, UniGraph};
use unigraph_store::{GraphRepository, StoreError};

/// Execute the index command.
pub async fn execute_index<R>(
    args: IndexArgs,
    unigraph: &UniGraph,
    repository: &mut R,
    formatter: &Formatter,
) -> Result<IndexMetrics>
where
    R: GraphRepository<Error = StoreError>,
{
    let levels = args
        .levels
        .unwrap_or(unigraph.config().indexer.max_levels);
    if levels == 0 {
        return Err(CliError::InvalidInput("levels must be at least 1".to_string()));
    }

    let mut snapshot = load_graph(repository, &args.graph)?;
    let metrics = unigraph.index_snapshot(&mut snapshot, levels).await?;
    repository.save(&snapshot)?;

    println!("{}", formatter.format_metrics(snapshot.id, &metrics)?);
    Ok(metrics)
}
