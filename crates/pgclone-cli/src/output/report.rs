use std::fs::{OpenOptions, create_dir_all};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use pgclone_duplicate::DuplicationReport;

use super::{OutputError, OutputResult};

/// JSON summary written after a `duplicate` run.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Redacted connection of the source database.
    pub source: String,
    /// Redacted connection of the target database.
    pub target: String,
    pub report: DuplicationReport,
}

pub fn write_summary(path: &Path, summary: &RunSummary) -> OutputResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(path)?;
    serde_json::to_writer_pretty(file, summary).map_err(OutputError::from)
}
