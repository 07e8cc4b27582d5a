//! Append-only CSV log of finished monitoring sessions.

use std::fs::{self, OpenOptions};
use std::path::Path;

use anyhow::{Context, Result};

use crate::session::SessionSummary;

/// Appends one row, writing the header only when the file is new or empty.
pub fn append(path: impl AsRef<Path>, summary: &SessionSummary) -> Result<()> {
    let path = path.as_ref();
    let needs_header = fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening journal {}", path.display()))?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_header)
        .from_writer(file);
    writer.serialize(summary)?;
    writer.flush()?;
    Ok(())
}

pub fn read_all(path: impl AsRef<Path>) -> Result<Vec<SessionSummary>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("reading journal {}", path.display()))?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}
