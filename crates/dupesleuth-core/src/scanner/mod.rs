/// Scanner module: entry points for running a scan.
///
/// - [`scan`] runs a scan on the calling thread and returns its report.
/// - [`start_scan`] runs it on a background thread and returns a
///   [`ScanHandle`] for progress, live counters, and cancellation.
///
/// Both validate the root first. A missing root or a root that is not a
/// directory fails immediately with no report.
pub mod cancel;
pub mod progress;
pub mod walker;

use crate::analysis::aggregate;
use crate::config::ScanOptions;
use crate::error::{EngineError, Result};
use crate::model::AnalysisReport;
use cancel::{CancelToken, StopSignal};
use progress::{LiveStats, ProgressSink, ScanProgress, SharedStats};
use walker::Walker;

use crossbeam_channel::Receiver;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Instant;
use tracing::{error, info};

/// Maximum number of progress messages that may queue up in the channel.
///
/// Senders use `try_send`, so once the channel is full further updates are
/// dropped until the consumer catches up; the scan itself never waits.
pub const PROGRESS_CHANNEL_CAPACITY: usize = 4_096;

/// Check that `root` exists and is a directory, returning its canonical form.
pub fn validate_root(root: &Path) -> Result<PathBuf> {
    let canonical = fs::canonicalize(root).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => EngineError::PathNotFound(root.to_path_buf()),
        _ => EngineError::from_io(root, err),
    })?;

    if !canonical.is_dir() {
        return Err(EngineError::NotADirectory(canonical));
    }
    Ok(canonical)
}

/// Scan `root` on the calling thread.
///
/// `cancel` and the options' timeout both stop the scan early; in that case
/// the report's status is [`ScanStatus::Cancelled`](crate::model::ScanStatus)
/// and it holds everything finished before the stop.
pub fn scan(root: &Path, options: &ScanOptions, cancel: &CancelToken) -> Result<AnalysisReport> {
    scan_with_progress(root, options, cancel, &ProgressSink::silent())
}

/// [`scan`], reporting progress into `sink`.
pub fn scan_with_progress(
    root: &Path,
    options: &ScanOptions,
    cancel: &CancelToken,
    sink: &ProgressSink,
) -> Result<AnalysisReport> {
    let stop = StopSignal::new(cancel.clone(), options.deadline_from(Instant::now()));
    let root = validate_root(root)?;
    let walker = Walker::new(&root);
    aggregate(root, walker, options, &stop, sink)
}

/// Handle to a running or completed background scan.
pub struct ScanHandle {
    /// Receiver for progress updates from the scan thread.
    pub progress_rx: Receiver<ScanProgress>,
    /// Running totals, readable while the scan is in flight.
    pub live_stats: SharedStats,
    cancel: CancelToken,
    thread: Option<thread::JoinHandle<Result<AnalysisReport>>>,
}

impl ScanHandle {
    /// Request the scan to stop as soon as possible.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// A clone of the scan's token, for cancelling from another thread
    /// (e.g. a Ctrl-C handler).
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Current running totals.
    pub fn stats(&self) -> LiveStats {
        self.live_stats.read().clone()
    }

    /// `true` once the scan thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(|t| t.is_finished())
    }

    /// Block until the scan ends and return its report.
    pub fn wait(mut self) -> Result<AnalysisReport> {
        let Some(thread) = self.thread.take() else {
            return Err(EngineError::Io {
                path: PathBuf::new(),
                source: io::Error::other("scan result already taken"),
            });
        };
        thread.join().unwrap_or_else(|_| {
            Err(EngineError::Io {
                path: PathBuf::new(),
                source: io::Error::other("scan thread panicked"),
            })
        })
    }
}

/// Start a scan of `root` on a background thread.
pub fn start_scan(root: PathBuf, options: ScanOptions) -> io::Result<ScanHandle> {
    let (progress_tx, progress_rx) =
        crossbeam_channel::bounded::<ScanProgress>(PROGRESS_CHANNEL_CAPACITY);
    let cancel = CancelToken::new();
    let live_stats = SharedStats::default();

    let sink = ProgressSink::new(progress_tx, live_stats.clone());
    let thread_cancel = cancel.clone();

    let thread = thread::Builder::new()
        .name("dupesleuth-scanner".into())
        .spawn(move || {
            info!("Starting background scan of {}", root.display());
            let result = scan_with_progress(&root, &options, &thread_cancel, &sink);
            if let Err(err) = &result {
                error!("Scan of {} failed: {err}", root.display());
                sink.send(ScanProgress::Failed {
                    message: err.to_string(),
                });
            }
            result
        })?;

    Ok(ScanHandle {
        progress_rx,
        live_stats,
        cancel,
        thread: Some(thread),
    })
}
