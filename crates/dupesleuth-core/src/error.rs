/// Engine error taxonomy.
///
/// Only structural failures live here: a bad scan root, a bad remediation
/// request, a missing download target. Per-file trouble during a scan is
/// recorded as a [`ScanIssue`](crate::model::ScanIssue) inside the report and
/// per-file trouble during cleanup as a
/// [`DeletionStatus::Failed`](crate::remediate::DeletionStatus) outcome.
use crate::model::{AnalysisReport, Fingerprint};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("path not found: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("unreadable file {}: {source}", path.display())]
    UnreadableFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("no duplicate group with fingerprint {0} in the report")]
    UnknownGroup(Fingerprint),

    #[error("keep index {index} out of range for a group of {len} members")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("file chosen to keep is no longer on disk: {}", .0.display())]
    KeptFileMissing(PathBuf),

    #[error("failed to delete {}: {reason}", path.display())]
    DeletionFailed { path: PathBuf, reason: String },

    #[error("scan cancelled after {} files", partial.total_files)]
    Cancelled { partial: Box<AnalysisReport> },

    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("not a regular file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("failed to build hashing worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl EngineError {
    /// Map an `io::Error` raised while touching `path` onto the taxonomy.
    pub(crate) fn from_io(path: impl Into<PathBuf>, err: io::Error) -> Self {
        let path = path.into();
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            _ => Self::Io { path, source: err },
        }
    }
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
