//! Induce command implementation.

use super::load_documents;
use crate::cli::InduceArgs;
use crate::error::Result;
use crate::output::Formatter;
use std::fs;
use unigraph_sdk::{InducedSchema, InductionRequest, UniGraph};

/// Execute the induce command.
pub async fn execute_induce(
    args: InduceArgs,
    unigraph: &UniGraph,
    formatter: &Formatter,
) -> Result<InducedSchema> {
    let chunks = load_documents(&args.files)?;
    let mut request = InductionRequest::new(args.aim, chunks);
    request.suggestion = args.suggestion;

    let result = unigraph.induce(&request).await?;

    match args.output {
        Some(path) => {
            fs::write(&path, serde_json::to_string_pretty(&result.schema)?)?;
            println!(
                "{}",
                formatter.success(&format!(
                    "{} schema entries written to {}",
                    result.schema.entries.len(),
                    path.display()
                ))
            );
        }
        None => println!("{}", formatter.format_schema(&result.schema)?),
    }

    Ok(result.schema)
}
