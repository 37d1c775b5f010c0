/// Report export: the whole report as JSON, or one CSV row per file.
use crate::error::{EngineError, Result};
use crate::model::AnalysisReport;
use serde::Serialize;
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::Path;

/// Write the full report as pretty-printed JSON.
pub fn write_json<W: Write>(report: &AnalysisReport, writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, report).map_err(|err| EngineError::Io {
        path: report.root.clone(),
        source: io::Error::from(err),
    })
}

#[derive(Serialize)]
struct CsvRow<'a> {
    path: &'a str,
    name: &'a str,
    category: &'static str,
    media_type: &'a str,
    size: u64,
    modified: String,
    fingerprint: String,
    /// 1-based position in the report's group list, empty when unique.
    duplicate_group: Option<usize>,
    readable: bool,
}

/// Write one row per discovered file, in discovery order.
pub fn write_csv<W: Write>(report: &AnalysisReport, writer: W) -> Result<()> {
    let csv_err = |err: csv::Error| EngineError::Io {
        path: report.root.clone(),
        source: io::Error::other(err),
    };

    let group_of: HashMap<&Path, usize> = report
        .duplicate_groups
        .iter()
        .enumerate()
        .flat_map(|(i, g)| g.members.iter().map(move |m| (m.as_path(), i + 1)))
        .collect();

    let mut out = csv::Writer::from_writer(writer);
    for record in &report.files {
        let path = record.path.to_string_lossy();
        out.serialize(CsvRow {
            path: &path,
            name: &record.name,
            category: record.category.label(),
            media_type: &record.media_type,
            size: record.size,
            modified: record
                .modified
                .map(|t| t.to_rfc3339())
                .unwrap_or_default(),
            fingerprint: record
                .fingerprint
                .map(|fp| fp.to_hex())
                .unwrap_or_default(),
            duplicate_group: group_of.get(record.path.as_path()).copied(),
            readable: record.readable,
        })
        .map_err(csv_err)?;
    }
    out.flush().map_err(|err| EngineError::Io {
        path: report.root.clone(),
        source: err,
    })
}
