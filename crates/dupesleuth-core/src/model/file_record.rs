/// Per-file records and per-file scan issues.
use super::fingerprint::Fingerprint;
use crate::analysis::FileCategory;
use chrono::{DateTime, Local};
use compact_str::CompactString;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// One regular file discovered by a scan.
#[derive(Debug, Clone, Serialize)]
pub struct FileRecord {
    /// Absolute path, built from the canonicalised scan root. Unique per scan.
    pub path: PathBuf,

    /// Final path component, kept separately for listings.
    pub name: CompactString,

    /// Byte length at stat time.
    pub size: u64,

    pub category: FileCategory,

    /// Media type guessed from the extension or file header, `"Unknown"`
    /// when neither says anything.
    pub media_type: CompactString,

    /// Last-modified time, `None` where the platform cannot report it.
    pub modified: Option<DateTime<Local>>,

    /// SHA-256 of the content. Only computed for files that share their
    /// size with another file (or for every file when size gating is off).
    pub fingerprint: Option<Fingerprint>,

    /// `false` once hashing has failed. Unreadable records are excluded
    /// from totals, category stats, and duplicate groups.
    pub readable: bool,
}

impl FileRecord {
    pub fn new(
        path: PathBuf,
        size: u64,
        category: FileCategory,
        media_type: &str,
        modified: Option<DateTime<Local>>,
    ) -> Self {
        let name = path
            .file_name()
            .map(|n| CompactString::new(n.to_string_lossy()))
            .unwrap_or_default();
        Self {
            path,
            name,
            size,
            category,
            media_type: CompactString::new(media_type),
            modified,
            fingerprint: None,
            readable: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Why a file or directory ended up in the report's `errors` list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IssueKind {
    /// The OS refused access to the entry.
    PermissionDenied,
    /// The entry vanished or could not be read for another reason.
    Unreadable,
    /// The file's content length no longer matches what was stat'd.
    Changed,
}

impl IssueKind {
    pub fn from_io(err: &std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            _ => Self::Unreadable,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::PermissionDenied => "permission denied",
            Self::Unreadable => "unreadable",
            Self::Changed => "changed during scan",
        }
    }
}

/// A path the scan could not process, with a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanIssue {
    pub path: PathBuf,
    pub kind: IssueKind,
    pub reason: String,
}

impl ScanIssue {
    pub fn new(path: impl Into<PathBuf>, kind: IssueKind, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            reason: reason.into(),
        }
    }

    pub fn from_io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        Self::new(path, IssueKind::from_io(err), err.to_string())
    }
}

impl fmt::Display for ScanIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {}",
            self.path.display(),
            self.kind.label(),
            self.reason
        )
    }
}
