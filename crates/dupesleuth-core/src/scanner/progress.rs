/// Scan progress reporting: lightweight messages sent from the scan thread
/// over a crossbeam channel, plus a shared counter block the front end can
/// read at any time.
///
/// Progress is best-effort. Messages are sent with `try_send`, so a consumer
/// that stops draining the channel loses updates instead of stalling the
/// scan. The final report is always available from
/// [`ScanHandle::wait`](super::ScanHandle::wait).
use crossbeam_channel::Sender;
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Progress updates sent from the scan thread.
#[derive(Debug, Clone)]
pub enum ScanProgress {
    /// Periodic update during the walk.
    Update {
        files_found: u64,
        total_size: u64,
        current_path: PathBuf,
    },
    /// The walk finished; `candidates` files are about to be hashed.
    Hashing { candidates: u64 },
    /// Periodic update during hashing.
    Hashed { hashed: u64, candidates: u64 },
    /// A non-fatal per-file problem (e.g. permission denied).
    Issue { path: PathBuf, message: String },
    /// The scan finished and its report is ready.
    Complete {
        duration: Duration,
        error_count: u64,
        duplicate_groups: u64,
    },
    /// The scan stopped early; a partial report is ready.
    Cancelled,
    /// The scan could not start (bad root, worker pool failure).
    Failed { message: String },
}

/// Running totals, updated by the scan's single accumulation point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveStats {
    pub files_found: u64,
    pub total_size: u64,
    pub issues: u64,
    pub hash_candidates: u64,
    pub hashed: u64,
}

pub type SharedStats = Arc<RwLock<LiveStats>>;

/// Where a scan reports its progress.
#[derive(Debug, Clone, Default)]
pub struct ProgressSink {
    tx: Option<Sender<ScanProgress>>,
    live: SharedStats,
}

impl ProgressSink {
    /// A sink that only keeps the live counters.
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn new(tx: Sender<ScanProgress>, live: SharedStats) -> Self {
        Self { tx: Some(tx), live }
    }

    pub fn send(&self, msg: ScanProgress) {
        if let Some(tx) = &self.tx {
            let _ = tx.try_send(msg);
        }
    }

    pub fn update(&self, f: impl FnOnce(&mut LiveStats)) {
        f(&mut self.live.write());
    }

    pub fn snapshot(&self) -> LiveStats {
        self.live.read().clone()
    }
}
