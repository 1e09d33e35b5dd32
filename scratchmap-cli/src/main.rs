//! Scratchmap CLI - Command-line interface
//!
//! Generates scratch maps once from the command line, or serves a stream of
//! messages read from stdin.

mod commands;
mod endpoint;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::{countries, generate, grid, restore, serve};
use crate::runner::RunnerOptions;

#[derive(Parser)]
#[command(name = "scratchmap")]
#[command(version = scratchmap::VERSION)]
#[command(about = "Generate maps highlighting the countries you have visited", long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.scratchmap/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Mirror log output to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one scratch map
    Generate {
        /// Comma-separated country list, e.g. "France, Spain"
        countries: String,

        /// Where to write the PNG
        #[arg(long, short)]
        output: PathBuf,
    },

    /// Handle messages read from stdin, one per line
    Serve {
        /// Directory receiving delivered images (default: current directory)
        #[arg(long)]
        deliver_dir: Option<PathBuf>,
    },

    /// Show the tile grid covered by the configured bounding box
    Grid,

    /// List supported countries and their aliases
    Countries,

    /// Restore the live style from its backup
    RestoreStyle,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let options = RunnerOptions {
        config: cli.config,
        verbose: cli.verbose,
    };

    let result = match cli.command {
        Commands::Generate { countries, output } => {
            generate::run(options, &countries, output).await
        }
        Commands::Serve { deliver_dir } => {
            serve::run(options, deliver_dir.unwrap_or_else(|| PathBuf::from("."))).await
        }
        Commands::Grid => grid::run(options),
        Commands::Countries => countries::run(options),
        Commands::RestoreStyle => restore::run(options).await,
    };

    if let Err(e) = result {
        e.exit();
    }
}
