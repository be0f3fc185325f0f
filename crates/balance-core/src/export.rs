//! Export the canonical dataset for consumers that do not read the JSON layout

use crate::dataset::{persist_with, write_atomic, CanonicalDataset};
use crate::error::Result;
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

/// Output format for [`export_to_path`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// The canonical JSON file layout
    Json,
    /// One row per (unit, mode, field)
    Csv,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Json => f.write_str("json"),
            ExportFormat::Csv => f.write_str("csv"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(format!("unknown export format '{}'", other)),
        }
    }
}

/// Write one row per modifier: `id,name,title,mode,field,value`
///
/// Rows follow unit id, then mode, then field order. Units without any
/// modifiers produce no rows.
pub fn export_csv<W: Write>(dataset: &CanonicalDataset, writer: W) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["id", "name", "title", "mode", "field", "value"])?;

    let mut rows = 0;
    for unit in dataset.units() {
        let id = unit.id.to_string();
        for (mode, block) in &unit.stats {
            for (field, value) in block.iter() {
                let value = value.to_string();
                csv_writer.write_record([
                    id.as_str(),
                    unit.name.as_str(),
                    unit.title.as_str(),
                    mode.code(),
                    field.key(),
                    value.as_str(),
                ])?;
                rows += 1;
            }
        }
    }

    csv_writer.flush()?;
    Ok(rows)
}

/// Export to a file in the given format, returning the number of units written
///
/// The file is replaced atomically; a failed export leaves any previous file intact.
pub fn export_to_path(dataset: &CanonicalDataset, format: ExportFormat, path: &Path) -> Result<usize> {
    match format {
        ExportFormat::Json => write_atomic(path, &dataset.to_json()?)?,
        ExportFormat::Csv => persist_with(path, |file| export_csv(dataset, file).map(|_| ()))?,
    }
    Ok(dataset.len())
}
