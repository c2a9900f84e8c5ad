//! Extract command implementation.

use super::{load_documents, load_graph};
use crate::cli::ExtractArgs;
use crate::error::Result;
use crate::output::Formatter;
use std::fs;
use unigraph_domain::GraphId;
use unigraph_sdk::{GraphSnapshot, InducedSchema, UniGraph};
use unigraph_store::{GraphRepository, StoreError};

/// Execute the extract command.
///
/// The schema file replaces the schema stored with an existing graph.
pub async fn execute_extract<R>(
    args: ExtractArgs,
    unigraph: &UniGraph,
    repository: &mut R,
    formatter: &Formatter,
) -> Result<GraphId>
where
    R: GraphRepository<Error = StoreError>,
{
    let schema: InducedSchema = serde_json::from_str(&fs::read_to_string(&args.schema)?)?;
    let chunks = load_documents(&args.files)?;

    let mut snapshot = match &args.graph {
        Some(id) => {
            let mut snapshot = load_graph(repository, id)?;
            snapshot.schema = Some(schema);
            snapshot
        }
        None => GraphSnapshot::new(Some(schema)),
    };

    let result = unigraph.extract_into(&mut snapshot, &chunks).await?;
    repository.save(&snapshot)?;

    println!("{}", formatter.format_extraction(snapshot.id, &result)?);
    Ok(snapshot.id)
}
