//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use serde::Serialize;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};
use unigraph_domain::GraphId;
use unigraph_sdk::{ExtractionResult, IndexMetrics, InducedSchema, SearchResult};

/// One row of the `graphs` listing.
#[derive(Debug, Clone, Serialize)]
pub struct GraphSummary {
    /// Graph id
    pub id: String,
    /// Entity count
    pub entities: usize,
    /// Relationship count
    pub relationships: usize,
    /// Community count
    pub communities: usize,
}

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format an induced schema.
    pub fn format_schema(&self, schema: &InducedSchema) -> Result<String> {
        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(schema)?);
        }
        if schema.entries.is_empty() {
            return Ok(self.colorize("No schema entries induced.", "yellow"));
        }

        let mut builder = Builder::default();
        builder.push_record(["Head", "Relation", "Tail", "Head attributes", "Tail attributes"]);
        for entry in &schema.entries {
            builder.push_record([
                entry.head.name.to_string(),
                entry.relation.to_string(),
                entry.tail.name.to_string(),
                entry.head.attributes.join(", "),
                entry.tail.attributes.join(", "),
            ]);
        }

        let mut out = self.table(builder);
        if !schema.definitions.is_empty() {
            let mut definitions = Builder::default();
            definitions.push_record(["Type", "Definition"]);
            for (name, definition) in &schema.definitions {
                definitions.push_record([name.as_str(), definition.as_str()]);
            }
            out.push('\n');
            out.push_str(&self.table(definitions));
        }
        Ok(out)
    }

    /// Format the outcome of an extraction into `graph`.
    pub fn format_extraction(&self, graph: GraphId, result: &ExtractionResult) -> Result<String> {
        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(&serde_json::json!({
                "graph": graph.to_string(),
                "triples": result.triples.len(),
                "failures": result.failures,
                "halted": result.halted,
                "metadata": result.metadata,
            }))?);
        }

        let mut lines = vec![self.success(&format!(
            "Extracted {} triple(s) from {} chunk(s) into graph {}",
            result.triples.len(),
            result.metadata.chunks,
            graph
        ))];
        for failure in &result.failures {
            lines.push(self.warning(&format!(
                "Chunk {} failed: {}",
                failure.chunk_index, failure.reason
            )));
        }
        if !result.halted.is_empty() {
            lines.push(self.info(&format!(
                "{} chunk(s) yielded no triples",
                result.halted.len()
            )));
        }
        Ok(lines.join("\n"))
    }

    /// Format indexing metrics for `graph`.
    pub fn format_metrics(&self, graph: GraphId, metrics: &IndexMetrics) -> Result<String> {
        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(&serde_json::json!({
                "graph": graph.to_string(),
                "metrics": metrics,
            }))?);
        }

        let mut lines = vec![self.success(&format!("Indexed graph {}", graph))];
        lines.push(metrics.summary());
        for id in &metrics.embedding_failures {
            lines.push(self.warning(&format!("Entity {} has no embedding", id)));
        }
        Ok(lines.join("\n"))
    }

    /// Format a query answer, optionally followed by its context.
    pub fn format_answer(&self, result: &SearchResult, show_context: bool) -> Result<String> {
        if self.format == OutputFormat::Json {
            let mut value = serde_json::json!({
                "answer": result.answer,
                "mapped": result.mapped,
                "context_tokens": result.context_tokens,
                "processing_time_ms": result.processing_time_ms,
            });
            if show_context {
                value["context_data"] = serde_json::to_value(&result.context_data)?;
            }
            return Ok(serde_json::to_string_pretty(&value)?);
        }

        let mut out = result.answer.clone();
        if show_context {
            out.push_str("\n\n");
            out.push_str(&self.colorize(
                &format!("Context ({} tokens)", result.context_tokens),
                "cyan",
            ));
            out.push('\n');
            out.push_str(&result.context_text);
        }
        Ok(out)
    }

    /// Format the list of saved graphs.
    pub fn format_graphs(&self, graphs: &[GraphSummary]) -> Result<String> {
        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(graphs)?);
        }
        if graphs.is_empty() {
            return Ok(self.colorize("No graphs found.", "yellow"));
        }

        let mut builder = Builder::default();
        builder.push_record(["ID", "Entities", "Relationships", "Communities"]);
        for graph in graphs {
            builder.push_record([
                graph.id.clone(),
                graph.entities.to_string(),
                graph.relationships.to_string(),
                graph.communities.to_string(),
            ]);
        }
        Ok(self.table(builder))
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn table(&self, builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unigraph_domain::{EntityTypeRef, SchemaEntry, TypeName};

    fn schema() -> InducedSchema {
        let mut schema = InducedSchema::default();
        schema.entries.push(SchemaEntry {
            head: EntityTypeRef::new("Person", vec!["年龄".to_string()]),
            relation: TypeName::new("喜欢"),
            tail: EntityTypeRef::new("Subject", Vec::new()),
            provenance: Default::default(),
        });
        schema.definitions.insert("Person".to_string(), "人".to_string());
        schema
    }

    #[test]
    fn test_schema_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_schema(&schema()).unwrap();
        assert!(output.contains("Relation"));
        assert!(output.contains("喜欢"));
        assert!(output.contains("Definition"));
    }

    #[test]
    fn test_schema_json_uses_exchange_field_names() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_schema(&schema()).unwrap();
        assert!(output.contains("DirectionalEntityType"));
        let parsed: InducedSchema = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed, schema());
    }

    #[test]
    fn test_empty_graph_list() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert!(formatter.format_graphs(&[]).unwrap().contains("No graphs found"));
    }

    #[test]
    fn test_graph_list_json() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter
            .format_graphs(&[GraphSummary {
                id: "g".to_string(),
                entities: 2,
                relationships: 1,
                communities: 1,
            }])
            .unwrap();
        assert!(output.contains("\"relationships\": 1"));
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("test"), "✓ test");
    }
}
