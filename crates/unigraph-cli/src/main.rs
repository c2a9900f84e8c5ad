//! UniGraph CLI - Build and query knowledge graphs from the command line.

use clap::Parser;
use tracing_subscriber::EnvFilter;
use unigraph_cli::commands;
use unigraph_cli::{Cli, Command, Config, Formatter};
use unigraph_sdk::UniGraph;
use unigraph_store::SqliteRepository;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> unigraph_cli::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_env();

    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);
    let formatter = Formatter::new(format, !cli.no_color && config.settings.color);

    let mut repository = SqliteRepository::new(config.database_path()?)?;

    match cli.command {
        Command::Graphs => {
            commands::execute_graphs(&repository, &formatter)?;
        }
        command => {
            let unigraph = UniGraph::from_config(config.pipeline.clone())?;
            match command {
                Command::Induce(args) => {
                    commands::execute_induce(args, &unigraph, &formatter).await?;
                }
                Command::Extract(args) => {
                    commands::execute_extract(args, &unigraph, &mut repository, &formatter)
                        .await?;
                }
                Command::Index(args) => {
                    commands::execute_index(args, &unigraph, &mut repository, &formatter).await?;
                }
                Command::Query(args) => {
                    commands::execute_query(args, &unigraph, &repository, &formatter).await?;
                }
                Command::Graphs => {}
            }
        }
    }

    Ok(())
}
