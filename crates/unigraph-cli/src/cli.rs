//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// UniGraph CLI - Build and query knowledge graphs from text.
#[derive(Debug, Parser)]
#[command(name = "unigraph")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "UNIGRAPH_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Induce a schema from seed documents
    Induce(InduceArgs),

    /// Extract a graph from documents and save it
    Extract(ExtractArgs),

    /// Build communities and embeddings for a saved graph
    Index(IndexArgs),

    /// Ask a question about a saved graph
    Query(QueryArgs),

    /// List saved graphs
    Graphs,
}

/// Arguments for the induce command.
#[derive(Debug, Parser)]
pub struct InduceArgs {
    /// What the graph is for, e.g. "student interests"
    #[arg(short, long)]
    pub aim: String,

    /// Extra direction for the inducer
    #[arg(short, long)]
    pub suggestion: Option<String>,

    /// Write the schema JSON here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Seed documents (.txt or .md)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// Schema JSON written by `induce`
    #[arg(short, long)]
    pub schema: PathBuf,

    /// Existing graph to extend; a new graph is created when omitted
    #[arg(short, long)]
    pub graph: Option<String>,

    /// Documents to extract from (.txt or .md)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

/// Arguments for the index command.
#[derive(Debug, Parser)]
pub struct IndexArgs {
    /// Graph id
    #[arg(short, long)]
    pub graph: String,

    /// Hierarchy levels to build (defaults to the configured maximum)
    #[arg(short, long)]
    pub levels: Option<usize>,
}

/// Arguments for the query command.
#[derive(Debug, Parser)]
pub struct QueryArgs {
    /// Graph id
    #[arg(short, long)]
    pub graph: String,

    /// Community depth, 1 for top-level reports only
    #[arg(short, long, default_value = "1")]
    pub depth: u32,

    /// Include one-hop neighbours of the mapped entities
    #[arg(long)]
    pub infer: bool,

    /// Print the assembled context after the answer
    #[arg(long)]
    pub show_context: bool,

    /// The question
    pub question: String,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_induce_command() {
        let cli = Cli::parse_from([
            "unigraph",
            "induce",
            "--aim",
            "学生兴趣",
            "a.txt",
            "b.md",
        ]);
        match cli.command {
            Command::Induce(args) => {
                assert_eq!(args.aim, "学生兴趣");
                assert_eq!(args.files.len(), 2);
                assert!(args.suggestion.is_none());
            }
            _ => panic!("Expected Induce command"),
        }
    }

    #[test]
    fn test_query_defaults() {
        let cli = Cli::parse_from(["unigraph", "query", "--graph", "g", "小明喜欢什么"]);
        match cli.command {
            Command::Query(args) => {
                assert_eq!(args.depth, 1);
                assert!(!args.infer);
                assert_eq!(args.question, "小明喜欢什么");
            }
            _ => panic!("Expected Query command"),
        }
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["unigraph", "graphs", "--format", "json", "--no-color"]);
        assert!(matches!(cli.format, Some(CliFormat::Json)));
        assert!(cli.no_color);
    }

    #[test]
    fn test_extract_requires_files() {
        assert!(Cli::try_parse_from(["unigraph", "extract", "--schema", "s.json"]).is_err());
    }
}
