/// Data model for a scan: file records, duplicate groups, the report, and
/// the content fingerprint.
pub mod file_record;
pub mod fingerprint;
pub mod report;
pub mod size;

pub use file_record::{FileRecord, IssueKind, ScanIssue};
pub use fingerprint::{Fingerprint, ParseFingerprintError};
pub use report::{AnalysisReport, DuplicateGroup, ScanStatus};
