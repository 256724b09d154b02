//! EmDee CLI - Markdown document reader.
//!
//! Provides commands for:
//! - `render`: Render a document to sanitized HTML (optionally standalone)
//! - `toc`: Print the table of contents
//! - `search`: Find text in the rendered document
//! - `stats`: Print word count and reading time

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{RenderArgs, SearchArgs, StatsArgs, TocArgs};
use error::CliError;
use output::Output;

/// EmDee - Markdown document reader.
#[derive(Parser)]
#[command(name = "emdee", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a markdown document to HTML.
    Render(RenderArgs),
    /// Print the table of contents of a document.
    Toc(TocArgs),
    /// Search the rendered text of a document.
    Search(SearchArgs),
    /// Print reading statistics of a document.
    Stats(StatsArgs),
}

impl Commands {
    fn verbose(&self) -> bool {
        match self {
            Commands::Render(args) => args.document.verbose,
            Commands::Toc(args) => args.document.verbose,
            Commands::Search(args) => args.document.verbose,
            Commands::Stats(args) => args.document.verbose,
        }
    }

    async fn execute(self) -> Result<(), CliError> {
        match self {
            Commands::Render(args) => args.execute().await,
            Commands::Toc(args) => args.execute().await,
            Commands::Search(args) => args.execute().await,
            Commands::Stats(args) => args.execute(),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // Initialize tracing with appropriate log level
    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.command.verbose() {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = tokio::runtime::Runtime::new()
        .map_err(CliError::from)
        .and_then(|rt| rt.block_on(cli.command.execute()));

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
