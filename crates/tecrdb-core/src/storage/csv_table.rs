//! CSV persistence for the master table, source tables and curation sheet.

use std::fs;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use tracing::{debug, info};

use crate::error::{CoreError, Result};
use crate::models::{
    CurationRow, DuRecord, MasterRecord, MasterTable, NoorRecord, SourceKind, SourceRecord,
};

const MASTER_REQUIRED: [&str; 3] = ["Enzyme:", "Reaction:", "Reference ID:"];
const CURATION_REQUIRED: [&str; 3] = ["Error resolution", "Master file index", "New index"];

fn require_columns(headers: &StringRecord, required: &[&str], path: &Path) -> Result<()> {
    for column in required {
        if !headers.iter().any(|h| h.trim() == *column) {
            return Err(CoreError::MissingColumn {
                column: column.to_string(),
                file: path.display().to_string(),
            });
        }
    }
    Ok(())
}

/// Load the persisted master table.
///
/// A raw TECRDB scrape has no `NIST_index` column; its rows are numbered by
/// position. Missing provenance and reaction-code columns load as blank.
pub fn load_master(path: &Path) -> Result<MasterTable> {
    let mut reader = ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.headers()?.clone();
    require_columns(&headers, &MASTER_REQUIRED, path)?;
    let numbered = headers.iter().any(|h| h == "NIST_index");

    let mut records = Vec::new();
    for (position, row) in reader.deserialize::<MasterRecord>().enumerate() {
        let mut record = row?;
        if !numbered {
            record.nist_index = Some(position);
        }
        records.push(record);
    }

    info!("Loaded {} master rows from {}", records.len(), path.display());
    Ok(MasterTable::new(records))
}

/// Persist the master table, blank cells written as a single space.
pub fn save_master(path: &Path, table: &MasterTable) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = WriterBuilder::new().from_path(path)?;
    for record in table.records() {
        writer.serialize(record)?;
    }
    writer.flush()?;

    info!("Wrote {} master rows to {}", table.len(), path.display());
    Ok(())
}

/// Load a new source table in its native column layout.
pub fn load_source(path: &Path, kind: SourceKind) -> Result<Vec<SourceRecord>> {
    let mut reader = ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.headers()?.clone();
    require_columns(
        &headers,
        &[kind.enzyme_column(), kind.reference_column()],
        path,
    )?;

    let rows: Vec<SourceRecord> = match kind {
        SourceKind::Noor => reader
            .deserialize::<NoorRecord>()
            .map(|row| row.map(SourceRecord::Noor))
            .collect::<std::result::Result<_, _>>()?,
        SourceKind::Du => reader
            .deserialize::<DuRecord>()
            .map(|row| row.map(SourceRecord::Du))
            .collect::<std::result::Result<_, _>>()?,
    };

    info!("Loaded {} {kind} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Load the manual curation sheet; headers and cells are trimmed.
pub fn load_curation(path: &Path) -> Result<Vec<CurationRow>> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_path(path)?;
    let headers = reader.headers()?.clone();
    require_columns(&headers, &CURATION_REQUIRED, path)?;

    let mut rows = Vec::new();
    for row in reader.deserialize::<CurationRow>() {
        rows.push(row?);
    }
    debug!("Loaded {} curation rows from {}", rows.len(), path.display());
    Ok(rows)
}
