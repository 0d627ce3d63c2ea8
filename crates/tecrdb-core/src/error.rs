use thiserror::Error;

use crate::models::SourceKind;

/// All errors that can occur in tecrdb-core.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Missing column '{column}' in {file}")]
    MissingColumn { column: String, file: String },

    #[error("Master row not found: {0}")]
    RowNotFound(usize),

    #[error("Unknown source kind: {0}")]
    UnknownSource(String),

    #[error(
        "Master index {master_index} already carries {source_kind} index {existing}, refusing to assign {attempted}"
    )]
    ProvenanceConflict {
        master_index: usize,
        source_kind: SourceKind,
        existing: usize,
        attempted: usize,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
