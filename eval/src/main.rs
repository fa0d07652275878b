mod cli;
mod outcome;
mod results;
mod run;
mod scratch;
mod summary;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "eval", version, about = "Dataset evaluation driver for the harness")]
struct Cli {
    /// Harness config file (TOML).
    #[arg(short, long, default_value = "harness.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run dataset cases and write the results back.
    Run {
        /// First case index to run (0-based, inclusive).
        #[arg(long)]
        start: Option<usize>,
        /// Case index to stop before (exclusive).
        #[arg(long)]
        end: Option<usize>,
        /// Where to write the updated dataset; defaults to the input path.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print one case record with its stored results.
    Show { case_id: String },
    /// Print aggregate per-kind counts for the dataset.
    Summary,
}

fn main() -> Result<()> {
    harness::logging::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Run { start, end, output } => cli::run_range(&cli.config, start, end, output),
        Command::Show { case_id } => cli::show_case(&cli.config, &case_id),
        Command::Summary => cli::summarize(&cli.config),
    }
}
