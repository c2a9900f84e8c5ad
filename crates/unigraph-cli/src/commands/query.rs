//! Query command implementation.

use super::load_graph;
use crate::cli::QueryArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use unigraph_sdk::{SearchResult, UniGraph};
use unigraph_store::{GraphRepository, StoreError};

/// Execute the query command.
pub async fn execute_query<R>(
    args: QueryArgs,
    unigraph: &UniGraph,
    repository: &R,
    formatter: &Formatter,
) -> Result<SearchResult>
where
    R: GraphRepository<Error = StoreError>,
{
    if args.depth == 0 {
        return Err(CliError::InvalidInput("depth must be at least 1".to_string()));
    }

    let snapshot = load_graph(repository, &args.graph)?;
    if snapshot.communities.is_empty() {
        eprintln!(
            "{}",
            formatter.warning("Graph has no communities; run `unigraph index` first")
        );
    }

    let result = unigraph
        .query_snapshot(&snapshot, &args.question, args.depth, args.infer)
        .await?;

    println!("{}", formatter.format_answer(&result, args.show_context)?);
    Ok(result)
}
