/// Duplicate cleanup: keep one member of a group, delete the others.
///
/// The request is validated against the caller's most recent report before
/// anything on disk is touched. After that, deletion is best-effort per
/// file: a member that is already gone counts as success, and a member that
/// cannot be removed is reported without stopping the others.
use crate::error::{EngineError, Result};
use crate::model::{AnalysisReport, DuplicateGroup, Fingerprint};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// What happened to one non-kept member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionStatus {
    Deleted,
    /// Gone before we got to it, e.g. removed by another process.
    AlreadyAbsent,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionOutcome {
    pub path: PathBuf,
    pub status: DeletionStatus,
}

impl DeletionOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self.status, DeletionStatus::Failed(_))
    }
}

/// Delete every member of the group identified by `fingerprint` except the
/// one at `keep_index`.
///
/// Fails without touching the filesystem when the fingerprint names no group
/// in `report`, when `keep_index` is out of range, or when the member to keep
/// is no longer a file on disk. Outcomes follow member order.
pub fn remediate(
    report: &AnalysisReport,
    fingerprint: &Fingerprint,
    keep_index: usize,
) -> Result<Vec<DeletionOutcome>> {
    let group = report
        .group(fingerprint)
        .ok_or(EngineError::UnknownGroup(*fingerprint))?;
    remediate_group(group, keep_index)
}

/// Run several remediations; results come back in `selections` order.
///
/// Distinct groups never share a path, so they are processed concurrently.
/// Selections naming the same group run one after another in the order
/// given, so a later one sees what an earlier one deleted.
pub fn remediate_many(
    report: &AnalysisReport,
    selections: &[(Fingerprint, usize)],
) -> Vec<Result<Vec<DeletionOutcome>>> {
    let mut batches: Vec<Vec<usize>> = Vec::new();
    let mut batch_of: HashMap<Fingerprint, usize> = HashMap::new();
    for (i, (fingerprint, _)) in selections.iter().enumerate() {
        let batch = *batch_of.entry(*fingerprint).or_insert_with(|| {
            batches.push(Vec::new());
            batches.len() - 1
        });
        batches[batch].push(i);
    }

    let finished: Vec<(usize, Result<Vec<DeletionOutcome>>)> = batches
        .par_iter()
        .flat_map_iter(|batch| {
            batch
                .iter()
                .map(|&i| {
                    let (fingerprint, keep_index) = &selections[i];
                    (i, remediate(report, fingerprint, *keep_index))
                })
                .collect::<Vec<_>>()
        })
        .collect();

    let mut results: Vec<Option<Result<Vec<DeletionOutcome>>>> =
        selections.iter().map(|_| None).collect();
    for (i, result) in finished {
        results[i] = Some(result);
    }
    results.into_iter().flatten().collect()
}

fn remediate_group(group: &DuplicateGroup, keep_index: usize) -> Result<Vec<DeletionOutcome>> {
    let len = group.members.len();
    let keep = group
        .members
        .get(keep_index)
        .ok_or(EngineError::IndexOutOfRange {
            index: keep_index,
            len,
        })?;

    match fs::metadata(keep) {
        Ok(meta) if meta.is_file() => {}
        _ => return Err(EngineError::KeptFileMissing(keep.clone())),
    }
    // The file the kept member actually reads from, through any symlinks.
    let kept_target =
        fs::canonicalize(keep).map_err(|_| EngineError::KeptFileMissing(keep.clone()))?;

    info!(
        "Removing {} duplicate(s) of {}, keeping {}",
        len - 1,
        group.fingerprint.short(),
        keep.display()
    );

    let outcomes: Vec<DeletionOutcome> = group
        .members
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != keep_index)
        .map(|(_, path)| {
            let status = match delete_member(path, &kept_target) {
                Ok(status) => status,
                Err(err) => {
                    warn!("{err}");
                    DeletionStatus::Failed(err.to_string())
                }
            };
            DeletionOutcome {
                path: path.clone(),
                status,
            }
        })
        .collect();

    let failed = outcomes.iter().filter(|o| !o.is_success()).count();
    info!(
        "Group {}: {} removed, {} failed",
        group.fingerprint.short(),
        outcomes.len() - failed,
        failed
    );
    Ok(outcomes)
}

/// Remove one file, treating "not found" as already done.
///
/// A member that resolves to `kept_target` (the kept file itself, or a link
/// in the chain the kept member reads through) is left alone.
fn delete_member(path: &Path, kept_target: &Path) -> Result<DeletionStatus> {
    let failed = |reason: String| EngineError::DeletionFailed {
        path: path.to_path_buf(),
        reason,
    };

    if fs::canonicalize(path).is_ok_and(|target| target == kept_target) {
        return Err(failed("same file as kept member".into()));
    }

    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => return Err(failed("not a file".into())),
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Ok(DeletionStatus::AlreadyAbsent)
        }
        Err(err) => return Err(failed(err.to_string())),
    }

    match fs::remove_file(path) {
        Ok(()) => Ok(DeletionStatus::Deleted),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(DeletionStatus::AlreadyAbsent),
        Err(err) => Err(failed(err.to_string())),
    }
}
