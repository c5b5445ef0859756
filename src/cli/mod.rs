//! Command-line parsing for the broad-money history builder.
//!
//! Argument parsing and command dispatch stay separate from the
//! reconciliation code; `app` turns parsed args into a `BuildConfig`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::Year;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "m2", version, about = "Long-history M2 dataset builder (World Bank based)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch raw series, reconcile every country to a gap-free annual M2
    /// history, and write the dataset JSON.
    Build(BuildArgs),
    /// Re-derive the coverage report from a dataset file on disk.
    Coverage(CoverageArgs),
}

/// Options for a build run.
#[derive(Debug, Parser, Clone)]
pub struct BuildArgs {
    /// First year of the output window.
    #[arg(long, default_value_t = 1980)]
    pub start_year: Year,

    /// Last year of the output window (defaults to the current year; the
    /// coverage evaluator may truncate it further).
    #[arg(long)]
    pub end_year: Option<Year>,

    /// Number of parallel fetch workers.
    #[arg(short = 'j', long, default_value_t = 4)]
    pub jobs: usize,

    /// Build from built-in sample fixtures instead of the network.
    #[arg(long)]
    pub offline: bool,

    /// Output path for the dataset JSON.
    #[arg(short = 'o', long, default_value = "data/m2_data.json")]
    pub out: PathBuf,

    /// Also write a machine-readable run summary JSON.
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Exit non-zero if any reconciled series still has missing values.
    #[arg(long)]
    pub strict: bool,
}

/// Options for the standalone coverage report.
#[derive(Debug, Parser)]
pub struct CoverageArgs {
    /// Dataset JSON produced by `m2 build`.
    #[arg(long, default_value = "data/m2_data.json")]
    pub data: PathBuf,

    /// Exit non-zero if any country has missing values.
    #[arg(long)]
    pub strict: bool,
}
