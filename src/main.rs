//! DupeSleuth: directory analyser and duplicate cleaner.
//!
//! Thin binary entry point. All logic lives in the `dupesleuth-core` crate.

mod cli;

use anyhow::{bail, Context};
use clap::Parser;
use cli::{Cli, Commands, ScanArgs};
use dupesleuth_core::model::size::{format_count, format_size};
use dupesleuth_core::scanner::progress::ScanProgress;
use dupesleuth_core::{
    export, open_for_download, remediate, scan, AnalysisReport, CancelToken, DeletionStatus,
    Fingerprint, ScanOptions,
};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    // Logs go to stderr so `cat` output and printed summaries stay clean.
    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    match args.command {
        Commands::Scan(scan_args) => run_scan(scan_args),
        Commands::Clean { dir, group, keep } => run_clean(&dir, &group, keep),
        Commands::Cat { file } => run_cat(&file),
    }
}

fn run_scan(args: ScanArgs) -> anyhow::Result<()> {
    let mut options = ScanOptions::default()
        .with_concurrency(args.jobs)
        .with_size_gate(!args.no_size_gate)
        .with_media_probe(!args.no_probe);
    if let Some(secs) = args.timeout {
        options = options.with_timeout(Duration::from_secs(secs));
    }

    let handle = dupesleuth_core::start_scan(args.dir.clone(), options)
        .context("failed to start scan thread")?;

    let token = handle.cancel_token();
    if let Err(err) = ctrlc::set_handler(move || token.cancel()) {
        warn!("Ctrl-C handler unavailable: {err}");
    }

    for msg in handle.progress_rx.iter() {
        match msg {
            ScanProgress::Update {
                files_found,
                total_size,
                ..
            } => info!(
                "{} files, {} so far",
                format_count(files_found),
                format_size(total_size)
            ),
            ScanProgress::Hashing { candidates } => {
                info!("Hashing {} candidate files", format_count(candidates))
            }
            ScanProgress::Hashed { hashed, candidates } => info!(
                "Hashed {} / {}",
                format_count(hashed),
                format_count(candidates)
            ),
            ScanProgress::Complete { .. }
            | ScanProgress::Cancelled
            | ScanProgress::Failed { .. } => break,
            ScanProgress::Issue { .. } => {}
        }
    }

    let report = handle.wait()?;
    print_summary(&report, args.show)?;

    if let Some(path) = &args.json {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        export::write_json(&report, BufWriter::new(file))?;
        info!("Wrote JSON report to {}", path.display());
    }
    if let Some(path) = &args.csv {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        export::write_csv(&report, BufWriter::new(file))?;
        info!("Wrote CSV report to {}", path.display());
    }
    Ok(())
}

fn print_summary(report: &AnalysisReport, show: usize) -> io::Result<()> {
    let mut out = io::stdout().lock();

    if report.is_cancelled() {
        writeln!(out, "Scan stopped early; results are partial.")?;
    }
    writeln!(out, "Root:    {}", report.root.display())?;
    writeln!(
        out,
        "Files:   {} ({})",
        format_count(report.total_files),
        format_size(report.total_size)
    )?;
    writeln!(out, "Elapsed: {:.2}s", report.duration.as_secs_f64())?;

    writeln!(out)?;
    for stats in report.category_breakdown() {
        writeln!(
            out,
            "  {:<10} {:>10} files  {:>10}",
            stats.category.label(),
            format_count(stats.file_count),
            format_size(stats.total_size)
        )?;
    }

    writeln!(out)?;
    writeln!(
        out,
        "{} duplicate groups, {} redundant files, {} reclaimable",
        format_count(report.duplicate_groups.len() as u64),
        format_count(report.redundant_files() as u64),
        format_size(report.total_reclaimable())
    )?;
    for group in &report.duplicate_groups {
        writeln!(
            out,
            "\n{}  {} x {} ({} reclaimable)",
            group.fingerprint,
            group.members.len(),
            format_size(group.size),
            format_size(group.reclaimable_size())
        )?;
        for (i, member) in group.members.iter().take(show).enumerate() {
            writeln!(out, "  [{i}] {}", member.display())?;
        }
        if group.members.len() > show {
            writeln!(out, "  ... {} more", group.members.len() - show)?;
        }
    }

    if !report.errors.is_empty() {
        writeln!(out, "\n{} issues:", report.errors.len())?;
        for issue in &report.errors {
            writeln!(out, "  {issue}")?;
        }
    }
    Ok(())
}

fn run_clean(dir: &Path, group: &str, keep: usize) -> anyhow::Result<()> {
    let fingerprint: Fingerprint = group
        .parse()
        .with_context(|| format!("invalid group fingerprint {group:?}"))?;

    // Selections only make sense against a current view of the tree.
    let report = scan(dir, &ScanOptions::default(), &CancelToken::new())?.into_complete()?;
    let outcomes = remediate(&report, &fingerprint, keep)?;

    let mut failed = 0usize;
    for outcome in &outcomes {
        match &outcome.status {
            DeletionStatus::Deleted => println!("deleted         {}", outcome.path.display()),
            DeletionStatus::AlreadyAbsent => {
                println!("already absent  {}", outcome.path.display())
            }
            DeletionStatus::Failed(reason) => {
                failed += 1;
                println!("FAILED          {}: {reason}", outcome.path.display());
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} deletions failed", outcomes.len());
    }
    Ok(())
}

fn run_cat(file: &Path) -> anyhow::Result<()> {
    let mut download = open_for_download(file)?;
    info!(
        "{} ({}, {})",
        file.display(),
        download.media_type,
        format_size(download.len)
    );
    let mut stdout = io::stdout().lock();
    io::copy(&mut download, &mut stdout)?;
    stdout.flush()?;
    Ok(())
}
