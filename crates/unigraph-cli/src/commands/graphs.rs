//! Graphs command implementation.

use crate::error::Result;
use crate::output::{Formatter, GraphSummary};
use unigraph_store::{GraphRepository, StoreError};

/// Execute the graphs command.
pub fn execute_graphs<R>(repository: &R, formatter: &Formatter) -> Result<Vec<GraphSummary>>
where
    R: GraphRepository<Error = StoreError>,
{
    let mut summaries = Vec::new();
    for id in repository.list()? {
        if let Some(snapshot) = repository.get(id)? {
            summaries.push(GraphSummary {
                id: id.to_string(),
                entities: snapshot.graph.entities.len(),
                relationships: snapshot.graph.relationships.len(),
                communities: snapshot.communities.len(),
            });
        }
    }

    println!("{}", formatter.format_graphs(&summaries)?);
    Ok(summaries)
}
