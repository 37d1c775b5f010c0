/// The aggregator: turns a walk into an [`AnalysisReport`].
///
/// Two passes share one worker pool:
///
/// 1. **Inspect.** The walker runs on the calling thread and hands every
///    discovered path to the pool, which stats and classifies it. Each path
///    gets a sequence number at discovery, so results arriving out of order
///    still land in discovery order.
/// 2. **Hash.** Files that share their size with another file (or every
///    file, with size gating off) are fingerprinted on the pool.
///
/// Workers never touch shared state. They send results down a crossbeam
/// channel to the calling thread, which is the only place records, buckets,
/// and counters are mutated.
use crate::analysis::duplicates::{find_duplicates, hash_candidates};
use crate::analysis::file_types::{classify_path, FileCategory};
use crate::config::ScanOptions;
use crate::error::Result;
use crate::hasher::{hash_streaming, HashError};
use crate::model::{AnalysisReport, FileRecord, Fingerprint, IssueKind, ScanIssue, ScanStatus};
use crate::scanner::cancel::StopSignal;
use crate::scanner::progress::{ProgressSink, ScanProgress};
use crate::scanner::walker::WalkItem;
use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How often (in files) the walk pass publishes a progress message.
const UPDATE_EVERY: u64 = 1_000;

/// How often (in files) the hash pass publishes a progress message.
const HASH_UPDATE_EVERY: u64 = 250;

/// What the inspect pass learned about one discovered path.
#[derive(Debug)]
enum Inspection {
    File(FileRecord),
    Issue(ScanIssue),
    /// Not a regular file any more, or skipped because the scan stopped.
    Skipped,
}

/// Stat and classify one path. Runs on a pool worker.
fn inspect(path: PathBuf, probe_media_types: bool) -> Inspection {
    let meta = match fs::metadata(&path) {
        Ok(meta) => meta,
        Err(err) => return Inspection::Issue(ScanIssue::from_io(path, &err)),
    };
    if !meta.is_file() {
        return Inspection::Skipped;
    }

    let (category, media_type) = classify_path(&path, probe_media_types);
    let modified = meta.modified().ok().map(DateTime::<Local>::from);
    Inspection::File(FileRecord::new(
        path,
        meta.len(),
        category,
        media_type,
        modified,
    ))
}

/// Run both passes over `walker` and build the report.
pub fn aggregate(
    root: PathBuf,
    walker: impl Iterator<Item = WalkItem>,
    options: &ScanOptions,
    stop: &StopSignal,
    sink: &ProgressSink,
) -> Result<AnalysisReport> {
    let start = Instant::now();
    let started_at = Local::now();
    let workers = options.effective_concurrency();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("dupesleuth-worker-{i}"))
        .build()?;

    info!("Scanning {} with {} workers", root.display(), workers);

    // ── Pass 1: walk, stat, classify ─────────────────────────────────────
    let (mut records, walk_issues, mut cancelled) =
        inspect_pass(&pool, walker, options.probe_media_types, stop, sink);
    debug!(
        "Inspect pass: {} files, {} issues in {:?}",
        records.len(),
        walk_issues.len(),
        start.elapsed()
    );

    // ── Pass 2: hash size-bucket candidates ──────────────────────────────
    let hash_start = Instant::now();
    let candidates = if cancelled {
        Vec::new()
    } else {
        hash_candidates(&records, options.size_gate)
    };
    sink.send(ScanProgress::Hashing {
        candidates: candidates.len() as u64,
    });
    sink.update(|s| s.hash_candidates = candidates.len() as u64);

    let (hash_issues, hash_cancelled) = hash_pass(
        &pool,
        &mut records,
        &candidates,
        options.effective_chunk_size(),
        stop,
        sink,
    );
    cancelled |= hash_cancelled;
    debug!(
        "Hash pass: {} candidates, {} failures in {:?}",
        candidates.len(),
        hash_issues.len(),
        hash_start.elapsed()
    );

    let mut errors = walk_issues;
    errors.extend(hash_issues);
    let report = assemble(root, started_at, records, errors, cancelled, start.elapsed());

    info!(
        "Scan of {} {}: {} files, {} bytes, {} duplicate groups, {} issues in {:.2}s",
        report.root.display(),
        if cancelled { "cancelled" } else { "complete" },
        report.total_files,
        report.total_size,
        report.duplicate_groups.len(),
        report.errors.len(),
        report.duration.as_secs_f64()
    );

    if cancelled {
        sink.send(ScanProgress::Cancelled);
    } else {
        sink.send(ScanProgress::Complete {
            duration: report.duration,
            error_count: report.errors.len() as u64,
            duplicate_groups: report.duplicate_groups.len() as u64,
        });
    }
    Ok(report)
}

/// Fold finished records into the report. Totals, category stats, and
/// groups only count readable records.
fn assemble(
    root: PathBuf,
    started_at: DateTime<Local>,
    records: Vec<FileRecord>,
    errors: Vec<ScanIssue>,
    cancelled: bool,
    duration: Duration,
) -> AnalysisReport {
    let mut category_counts: BTreeMap<FileCategory, u64> = BTreeMap::new();
    let mut category_sizes: BTreeMap<FileCategory, u64> = BTreeMap::new();
    let mut total_files = 0u64;
    let mut total_size = 0u64;
    for record in records.iter().filter(|r| r.readable) {
        total_files += 1;
        total_size += record.size;
        *category_counts.entry(record.category).or_insert(0) += 1;
        *category_sizes.entry(record.category).or_insert(0) += record.size;
    }

    let duplicate_groups = find_duplicates(&records);
    let status = if cancelled {
        ScanStatus::Cancelled
    } else {
        ScanStatus::Complete
    };

    AnalysisReport {
        root,
        started_at,
        duration,
        status,
        total_files,
        total_size,
        category_counts,
        category_sizes,
        files: records,
        duplicate_groups,
        errors,
    }
}

/// Walk on this thread, inspect on the pool, fold results in discovery order.
///
/// Returns the records, the walk/stat issues (both in discovery order), and
/// whether the walk was cut short.
fn inspect_pass(
    pool: &rayon::ThreadPool,
    walker: impl Iterator<Item = WalkItem>,
    probe_media_types: bool,
    stop: &StopSignal,
    sink: &ProgressSink,
) -> (Vec<FileRecord>, Vec<ScanIssue>, bool) {
    let mut slots: Vec<Option<Inspection>> = Vec::new();
    let mut cancelled = stop.should_stop();
    let mut found = 0u64;

    let mut absorb = |slots: &mut Vec<Option<Inspection>>, seq: usize, inspection: Inspection| {
        match &inspection {
            Inspection::File(record) => {
                found += 1;
                sink.update(|s| {
                    s.files_found += 1;
                    s.total_size += record.size;
                });
                if found % UPDATE_EVERY == 0 {
                    let live = sink.snapshot();
                    sink.send(ScanProgress::Update {
                        files_found: live.files_found,
                        total_size: live.total_size,
                        current_path: record.path.clone(),
                    });
                }
            }
            Inspection::Issue(issue) => report_issue(sink, issue),
            Inspection::Skipped => {}
        }
        slots[seq] = Some(inspection);
    };

    pool.in_place_scope(|scope| {
        let (tx, rx) = crossbeam_channel::unbounded::<(usize, Inspection)>();

        for item in walker {
            if cancelled || stop.should_stop() {
                cancelled = true;
                break;
            }

            let seq = slots.len();
            slots.push(None);
            match item {
                WalkItem::Issue(issue) => absorb(&mut slots, seq, Inspection::Issue(issue)),
                WalkItem::File(path) => {
                    let tx = tx.clone();
                    scope.spawn(move |_| {
                        let inspection = if stop.should_stop() {
                            Inspection::Skipped
                        } else {
                            inspect(path, probe_media_types)
                        };
                        let _ = tx.send((seq, inspection));
                    });
                }
            }

            while let Ok((seq, inspection)) = rx.try_recv() {
                absorb(&mut slots, seq, inspection);
            }
        }

        drop(tx);
        for (seq, inspection) in rx {
            absorb(&mut slots, seq, inspection);
        }
    });

    let mut records = Vec::with_capacity(slots.len());
    let mut issues = Vec::new();
    for slot in slots.into_iter().flatten() {
        match slot {
            Inspection::File(record) => records.push(record),
            Inspection::Issue(issue) => issues.push(issue),
            Inspection::Skipped => {}
        }
    }
    (records, issues, cancelled)
}

/// Fingerprint `candidates` on the pool and store results into `records`.
///
/// A failed hash marks the record unreadable and yields an issue; the rest
/// of its size bucket is unaffected. Returns the issues in discovery order
/// and whether any hash was skipped because the scan stopped.
fn hash_pass(
    pool: &rayon::ThreadPool,
    records: &mut [FileRecord],
    candidates: &[usize],
    chunk_size: usize,
    stop: &StopSignal,
    sink: &ProgressSink,
) -> (Vec<ScanIssue>, bool) {
    let mut failures: Vec<(usize, ScanIssue)> = Vec::new();
    let mut cancelled = false;
    let total = candidates.len() as u64;
    let mut hashed = 0u64;

    pool.in_place_scope(|scope| {
        let (tx, rx) =
            crossbeam_channel::unbounded::<(usize, std::result::Result<Fingerprint, HashError>)>();

        for &idx in candidates {
            let path = records[idx].path.clone();
            let size = records[idx].size;
            let tx = tx.clone();
            scope.spawn(move |_| {
                let result = if stop.should_stop() {
                    Err(HashError::Cancelled)
                } else {
                    hash_streaming(&path, Some(size), chunk_size, stop)
                };
                let _ = tx.send((idx, result));
            });
        }
        drop(tx);

        for (idx, result) in rx {
            let record = &mut records[idx];
            match result {
                Ok(fp) => record.fingerprint = Some(fp),
                Err(HashError::Cancelled) => cancelled = true,
                Err(err) => {
                    let kind = match &err {
                        HashError::Io(io_err) => IssueKind::from_io(io_err),
                        _ => IssueKind::Changed,
                    };
                    let issue = ScanIssue::new(record.path.clone(), kind, err.to_string());
                    report_issue(sink, &issue);
                    record.readable = false;
                    failures.push((idx, issue));
                }
            }

            hashed += 1;
            sink.update(|s| s.hashed = hashed);
            if hashed % HASH_UPDATE_EVERY == 0 {
                sink.send(ScanProgress::Hashed {
                    hashed,
                    candidates: total,
                });
            }
        }
    });

    failures.sort_by_key(|(idx, _)| *idx);
    (failures.into_iter().map(|(_, issue)| issue).collect(), cancelled)
}

fn report_issue(sink: &ProgressSink, issue: &ScanIssue) {
    warn!("{}", issue);
    sink.update(|s| s.issues += 1);
    sink.send(ScanProgress::Issue {
        path: issue.path.clone(),
        message: issue.reason.clone(),
    });
}
