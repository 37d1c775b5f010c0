/// DupeSleuth Core: directory analysis, duplicate detection, and cleanup.
///
/// This crate contains all engine logic with no front-end dependencies.
/// The CLI in the workspace root is one consumer; anything that can hold a
/// [`ScanHandle`] or an [`AnalysisReport`] can be another.
///
/// # Modules
///
/// - [`scanner`]: Root validation, the deterministic walker, cancellation,
///   and background scans with progress reporting.
/// - [`analysis`]: Classification, size-gated duplicate grouping, and the
///   aggregator that builds the report on a worker pool.
/// - [`hasher`]: Streaming SHA-256 content fingerprints.
/// - [`model`]: File records, duplicate groups, and the report itself.
/// - [`remediate`]: Keep-one-delete-the-rest cleanup of a duplicate group.
/// - [`download`]: Streaming read access to a file's current content.
/// - [`export`]: JSON and CSV report export.
/// - [`config`]: Scan options.
/// - [`error`]: The engine error type.
pub mod analysis;
pub mod config;
pub mod download;
pub mod error;
pub mod export;
pub mod hasher;
pub mod model;
pub mod remediate;
pub mod scanner;

pub use analysis::FileCategory;
pub use config::ScanOptions;
pub use download::{open_for_download, Download};
pub use error::{EngineError, Result};
pub use model::{AnalysisReport, DuplicateGroup, FileRecord, Fingerprint, ScanIssue, ScanStatus};
pub use remediate::{remediate, remediate_many, DeletionOutcome, DeletionStatus};
pub use scanner::cancel::CancelToken;
pub use scanner::{scan, start_scan, ScanHandle};
