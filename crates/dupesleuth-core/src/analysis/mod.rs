/// Analysis: classification, duplicate grouping, and the aggregator that
/// ties a walk to a finished report.
pub mod aggregate;
pub mod duplicates;
pub mod file_types;

pub use aggregate::aggregate;
pub use duplicates::{find_duplicates, hash_candidates};
pub use file_types::{
    categorise, classify_path, probe_media_type, CategoryStats, FileCategory, OCTET_STREAM,
    UNKNOWN_MEDIA_TYPE,
};
