//! Command-line interface to the vpfmap library.
//!
//! Thin front end: argument parsing and output formatting live here, all
//! pipeline behavior lives in the library crate.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use vpfmap::logging::init_logging;

#[derive(Debug, Parser)]
#[command(name = "vpfmap", version, about = "Inspect and query VPF databases")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Describe a database: name, libraries, coverages, tiling
    Info(commands::info::InfoArgs),
    /// Run a viewport query and summarize the resulting graphics
    Query(commands::query::QueryArgs),
}

fn main() {
    init_logging();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Info(args) => commands::info::run(args),
        Commands::Query(args) => commands::query::run(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
