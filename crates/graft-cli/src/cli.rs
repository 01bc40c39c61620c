// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Argument parsing, logging setup and command output.
#![allow(clippy::print_stdout)]

use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands;

/// Top-level arguments.
#[derive(Parser, Debug)]
#[command(name = "graft", version)]
#[command(about = "Selective replication of entity graphs between models")]
pub struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Command to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Copy selected entities into a fresh model and write it
    Copy(CopyArgs),
    /// Compare the entity lines of a copy against its source file
    Compare(CompareArgs),
    /// Count entities per type
    Inspect(InspectArgs),
}

/// Arguments of `graft copy`.
#[derive(Args, Debug)]
pub struct CopyArgs {
    /// Source exchange file
    pub source: PathBuf,
    /// Schema declaration (JSON)
    #[arg(long)]
    pub schema: PathBuf,
    /// Destination exchange file
    #[arg(long)]
    pub out: PathBuf,
    /// Copy every instance of this type, subtypes included
    #[arg(long, required_unless_present = "labels")]
    pub root_type: Option<String>,
    /// Copy the entity with this label (repeatable)
    #[arg(long = "label")]
    pub labels: Vec<u64>,
    /// Copy only the first selected root
    #[arg(long)]
    pub first: bool,
    /// Named replication profile
    #[arg(long, default_value = "default")]
    pub profile: String,
    /// Read the replication profile from this JSON file
    #[arg(long, conflicts_with = "profile")]
    pub profile_file: Option<PathBuf>,
    /// Directory of stored profiles (defaults to the platform config dir)
    #[arg(long)]
    pub config_dir: Option<PathBuf>,
    /// Also copy the holders of inverse relationships
    #[arg(long)]
    pub inverses: bool,
    /// Do not follow entity references
    #[arg(long)]
    pub shallow: bool,
    /// Number destination entities afresh instead of reusing source labels
    #[arg(long)]
    pub fresh_labels: bool,
}

/// Arguments of `graft compare`.
#[derive(Args, Debug)]
pub struct CompareArgs {
    /// File produced by a label-preserving copy
    pub inserted: PathBuf,
    /// File the copy was taken from
    pub original: PathBuf,
    /// Also skip entities of this type (repeatable)
    #[arg(long)]
    pub ignore: Vec<String>,
    /// Compare points, directions and representation contexts too
    #[arg(long)]
    pub no_default_ignores: bool,
}

/// Arguments of `graft inspect`.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Exchange file
    pub file: PathBuf,
    /// Schema declaration (JSON)
    #[arg(long)]
    pub schema: PathBuf,
}

/// Parses the command line, sets up logging and runs the command.
pub fn entrypoint() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;
    run(cli.command)
}

fn init_tracing(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!("failed to initialise logging: {err}"))
}

/// Runs one command and prints its outcome.
pub fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Copy(args) => {
            let outcome = commands::copy(&args)?;
            println!(
                "copied {} root(s), {} entities -> {} in {:?}",
                outcome.roots,
                outcome.created,
                outcome.out.display(),
                outcome.elapsed
            );
        }
        Commands::Compare(args) => {
            let comparison = commands::compare(&args)?;
            for mismatch in &comparison.mismatches {
                println!("{} differs", mismatch.label);
                println!("  inserted: {}", mismatch.inserted);
                println!("  original: {}", mismatch.original);
            }
            for label in &comparison.missing {
                println!("{label} is missing from the original");
            }
            if !comparison.is_match() {
                bail!(
                    "{} of {} entity lines differ, {} missing",
                    comparison.mismatches.len(),
                    comparison.checked,
                    comparison.missing.len()
                );
            }
            println!("{} entity lines match", comparison.checked);
        }
        Commands::Inspect(args) => {
            let counts = commands::inspect(&args)?;
            let total: usize = counts.values().sum();
            for (ty, count) in &counts {
                println!("{ty} {count}");
            }
            println!("total {total}");
        }
    }
    Ok(())
}
