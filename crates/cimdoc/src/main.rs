//! cimdoc CLI - Documentation generator for UML models.
//!
//! Provides commands for:
//! - `generate`: Fill a template's placeholders with full model content
//! - `analyze`: Check a template's placeholders and substitute values only

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::RunArgs;
use output::Output;

/// cimdoc - Documentation generator for UML models.
#[derive(Parser)]
#[command(name = "cimdoc", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a document from a template and a model.
    Generate(RunArgs),
    /// Resolve placeholders without writing sections, tables or figures.
    Analyze(RunArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let verbose = match &cli.command {
        Commands::Generate(args) | Commands::Analyze(args) => args.verbose,
    };

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let result = match cli.command {
        Commands::Generate(args) => args.execute(true),
        Commands::Analyze(args) => args.execute(false),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
