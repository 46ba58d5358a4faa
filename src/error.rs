use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("failed to read workbook: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("workbook {0} contains no sheets")]
    EmptyWorkbook(PathBuf),

    #[error("failed to read sheet '{sheet}': {source}")]
    SheetRead {
        sheet: String,
        source: calamine::Error,
    },

    #[error("sheet '{sheet}' has no header row (no cell matching '{label}' in the first column)")]
    MissingHeader { sheet: String, label: String },

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
