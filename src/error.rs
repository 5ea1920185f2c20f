use crate::column_mapping::UnmappedField;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LeaderboardError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("Polars error: {0}")]
    Polars(String),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("Unsupported file format '{extension}' for {source_label}: expected csv, json, parquet, xlsx or xls")]
    UnsupportedFormat {
        source_label: String,
        extension: String,
    },

    #[error("Failed to load {source_label}: {message}")]
    Ingestion {
        source_label: String,
        message: String,
    },

    #[error("Missing column mapping for: {}", describe_unmapped(.0))]
    MissingMapping(Vec<UnmappedField>),

    #[error("Column '{column}' mapped for {field} is not present in {source_label}")]
    ColumnNotFound {
        source_label: String,
        field: String,
        column: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Pipeline stage '{stage}' failed: {message}")]
    Pipeline {
        stage: &'static str,
        message: String,
    },
}

impl From<polars::error::PolarsError> for LeaderboardError {
    fn from(err: polars::error::PolarsError) -> Self {
        LeaderboardError::Polars(err.to_string())
    }
}

impl From<csv::Error> for LeaderboardError {
    fn from(err: csv::Error) -> Self {
        LeaderboardError::Csv(err.to_string())
    }
}

impl From<calamine::Error> for LeaderboardError {
    fn from(err: calamine::Error) -> Self {
        LeaderboardError::Spreadsheet(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for LeaderboardError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        LeaderboardError::Spreadsheet(err.to_string())
    }
}

fn describe_unmapped(fields: &[UnmappedField]) -> String {
    fields
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, LeaderboardError>;
