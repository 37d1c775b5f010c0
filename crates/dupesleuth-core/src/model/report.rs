/// The immutable result of one scan.
///
/// Built once by the aggregator and never mutated afterwards. Remediation
/// changes the filesystem, not the report; a fresh scan is needed to see the
/// effect of a cleanup.
use super::file_record::{FileRecord, ScanIssue};
use super::fingerprint::Fingerprint;
use crate::analysis::{CategoryStats, FileCategory};
use crate::error::EngineError;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Whether the scan ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScanStatus {
    Complete,
    /// Stopped by the cancel token or the deadline. The report holds
    /// everything finished before the stop.
    Cancelled,
}

/// A set of two or more files with identical content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub fingerprint: Fingerprint,
    /// Size of each member (all members share it).
    pub size: u64,
    /// Member paths in discovery order. Always at least two.
    pub members: Vec<PathBuf>,
}

impl DuplicateGroup {
    /// Bytes freed by keeping one member and deleting the rest.
    pub fn reclaimable_size(&self) -> u64 {
        self.size * (self.members.len() as u64).saturating_sub(1)
    }

    /// `(original, duplicate)` pairs with the first discovered member as the
    /// original.
    pub fn pairs(&self) -> impl Iterator<Item = (&Path, &Path)> + '_ {
        self.members
            .split_first()
            .into_iter()
            .flat_map(|(original, rest)| {
                rest.iter()
                    .map(move |dup| (original.as_path(), dup.as_path()))
            })
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.members.iter().any(|m| m == path)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// Canonicalised scan root.
    pub root: PathBuf,
    pub started_at: DateTime<Local>,
    pub duration: Duration,
    pub status: ScanStatus,

    /// Count and byte total over readable files.
    pub total_files: u64,
    pub total_size: u64,

    /// Only categories with at least one readable file appear.
    pub category_counts: BTreeMap<FileCategory, u64>,
    pub category_sizes: BTreeMap<FileCategory, u64>,

    /// Every stat'd file in discovery order, including ones that later
    /// failed hashing (`readable == false`).
    pub files: Vec<FileRecord>,

    /// Sorted by reclaimable size descending, then fingerprint ascending.
    pub duplicate_groups: Vec<DuplicateGroup>,

    pub errors: Vec<ScanIssue>,
}

impl AnalysisReport {
    pub fn is_cancelled(&self) -> bool {
        self.status == ScanStatus::Cancelled
    }

    /// Turn a cancelled report into [`EngineError::Cancelled`] carrying it.
    pub fn into_complete(self) -> Result<Self, EngineError> {
        match self.status {
            ScanStatus::Complete => Ok(self),
            ScanStatus::Cancelled => Err(EngineError::Cancelled {
                partial: Box::new(self),
            }),
        }
    }

    pub fn group(&self, fingerprint: &Fingerprint) -> Option<&DuplicateGroup> {
        self.duplicate_groups
            .iter()
            .find(|g| &g.fingerprint == fingerprint)
    }

    /// Sum of [`DuplicateGroup::reclaimable_size`] over all groups.
    pub fn total_reclaimable(&self) -> u64 {
        self.duplicate_groups
            .iter()
            .map(DuplicateGroup::reclaimable_size)
            .sum()
    }

    /// Number of files that could be deleted without losing any content.
    pub fn redundant_files(&self) -> usize {
        self.duplicate_groups
            .iter()
            .map(|g| g.members.len().saturating_sub(1))
            .sum()
    }

    /// Per-category stats, largest total size first.
    pub fn category_breakdown(&self) -> Vec<CategoryStats> {
        let mut stats: Vec<CategoryStats> = self
            .category_counts
            .iter()
            .map(|(&category, &file_count)| CategoryStats {
                category,
                file_count,
                total_size: self.category_sizes.get(&category).copied().unwrap_or(0),
            })
            .collect();
        stats.sort_by(|a, b| {
            b.total_size
                .cmp(&a.total_size)
                .then(a.category.cmp(&b.category))
        });
        stats
    }

    /// Readable files in `category`, most recently modified first.
    pub fn files_in_category(&self, category: FileCategory) -> Vec<&FileRecord> {
        let mut files: Vec<&FileRecord> = self
            .files
            .iter()
            .filter(|f| f.readable && f.category == category)
            .collect();
        sort_newest_first(&mut files);
        files
    }

    /// All readable files, most recently modified first.
    pub fn files_newest_first(&self) -> Vec<&FileRecord> {
        let mut files: Vec<&FileRecord> = self.files.iter().filter(|f| f.readable).collect();
        sort_newest_first(&mut files);
        files
    }

    /// Index of the duplicate group that contains `path`, if any.
    pub fn group_index_of(&self, path: &Path) -> Option<usize> {
        self.duplicate_groups.iter().position(|g| g.contains(path))
    }
}

/// Stable sort: files without a timestamp go last, ties keep discovery order.
fn sort_newest_first(files: &mut [&FileRecord]) {
    files.sort_by(|a, b| b.modified.cmp(&a.modified));
}
