use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "dupesleuth", version)]
#[command(about = "Classify files, find byte-identical duplicates, and clean them up")]
pub struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan a directory and print a summary
    Scan(ScanArgs),
    /// Delete every member of a duplicate group except one
    Clean {
        /// Directory to rescan before cleaning
        dir: PathBuf,
        /// Fingerprint of the group (full 64-character hex)
        #[arg(long)]
        group: String,
        /// Index of the member to keep, as listed by `scan`
        #[arg(long, default_value_t = 0)]
        keep: usize,
    },
    /// Write a file's current content to stdout
    Cat {
        file: PathBuf,
    },
}

#[derive(Debug, clap::Args)]
pub struct ScanArgs {
    /// Directory to scan
    pub dir: PathBuf,

    /// Worker threads (0 = one per CPU)
    #[arg(short = 'j', long, default_value_t = 0)]
    pub jobs: usize,

    /// Stop after this many seconds and print a partial report
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Hash every file, not only files that share a size
    #[arg(long)]
    pub no_size_gate: bool,

    /// Classify by extension only, never read file headers
    #[arg(long)]
    pub no_probe: bool,

    /// Write the full report as JSON
    #[arg(long, value_name = "FILE")]
    pub json: Option<PathBuf>,

    /// Write one CSV row per file
    #[arg(long, value_name = "FILE")]
    pub csv: Option<PathBuf>,

    /// Files listed per duplicate group
    #[arg(long, default_value_t = 10)]
    pub show: usize,
}
