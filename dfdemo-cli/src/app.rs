//! CLI subcommand dispatch, mirroring `quake-server/src/app.rs`'s `Args` + `run` split.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use crate::batch::BatchDemoRenamer;
use crate::rename::{suggest_name, FileLogger, FileRenamer, Logger, NullLogger};
use crate::single;

#[derive(Parser, Debug)]
#[command(name = "dfdemo-cli", about = "Defrag demo parser and canonical renaming tool")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Rename a single demo file, suggesting a canonical name when none is given.
    Rename {
        file: PathBuf,
        new_name: Option<String>,
        #[arg(long)]
        delete_identical: bool,
        #[arg(long)]
        log_file: Option<PathBuf>,
    },
    /// Rename every demo in a directory, deduplicating identical files by MD5 first.
    Batch {
        directory: PathBuf,
        #[arg(long)]
        no_conflicts_dir: bool,
    },
    /// Parse one demo file and print its suggested name, or full metadata as JSON.
    ProcessSingle {
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Rename { file, new_name, delete_identical, log_file } => {
            run_rename(&file, new_name, delete_identical, log_file)
        }
        Command::Batch { directory, no_conflicts_dir } => run_batch(&directory, !no_conflicts_dir),
        Command::ProcessSingle { file, json } => single::run(&file, json),
    }
}

fn run_rename(file: &Path, new_name: Option<String>, delete_identical: bool, log_file: Option<PathBuf>) -> Result<()> {
    let logger: Box<dyn Logger> = match log_file {
        Some(path) => Box::new(FileLogger::new(path)?),
        None => Box::new(NullLogger),
    };
    let mut renamer = FileRenamer::new(logger);

    let new_name = match new_name {
        Some(name) => name,
        None => match suggest_name(file) {
            Some(name) => {
                println!("Suggested name: {name}");
                name
            }
            None => bail!("Unable to determine suggested name"),
        },
    };

    let outcome = renamer.rename_file(file, &new_name, delete_identical)?;
    println!("{}", outcome.status.as_str());
    println!("{}", outcome.target.display());
    Ok(())
}

fn run_batch(directory: &Path, create_conflicts_dir: bool) -> Result<()> {
    let mut batch = BatchDemoRenamer::new();
    let stats = batch.process_directory(directory, create_conflicts_dir)?;
    println!("Summary:");
    println!("  Processed: {}", stats.processed);
    println!("  Renamed: {}", stats.renamed);
    println!("  Already named: {}", stats.already_named);
    println!("  Identical deleted: {}", stats.identical_deleted);
    println!("  Name conflicts: {}", stats.conflicts);
    println!("  Errors: {}", stats.errors);
    Ok(())
}
