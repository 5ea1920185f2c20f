//! Ingestion Module
//!
//! Turns uploaded files into [`Dataset`]s. The format is chosen from the file
//! extension. CSV, JSON, parquet and Excel workbooks are accepted; anything
//! else is rejected with a distinguishable error instead of producing a dataset.

pub mod connector;
pub mod csv_connector;
pub mod json_connector;
pub mod parquet_connector;
pub mod xlsx_connector;

pub use connector::DatasetConnector;
pub use csv_connector::CsvConnector;
pub use json_connector::JsonConnector;
pub use parquet_connector::ParquetConnector;
pub use xlsx_connector::XlsxConnector;

use crate::config::IngestionConfig;
use crate::dataset::Dataset;
use crate::error::{LeaderboardError, Result};
use std::path::Path;
use tracing::{debug, info};

/// Supported upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Csv,
    Json,
    Parquet,
    /// `.xlsx` or legacy `.xls`; the workbook type is sniffed from the bytes
    Excel,
}

impl DatasetFormat {
    /// Detect the format from a file extension (case-insensitive)
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(DatasetFormat::Csv),
            "json" => Ok(DatasetFormat::Json),
            "parquet" => Ok(DatasetFormat::Parquet),
            "xlsx" | "xls" => Ok(DatasetFormat::Excel),
            _ => Err(LeaderboardError::UnsupportedFormat {
                source_label: path.display().to_string(),
                extension: if extension.is_empty() { "<none>".to_string() } else { extension },
            }),
        }
    }
}

/// Build the connector for a byte payload of a known format
pub fn connector_for(
    source_id: &str,
    bytes: Vec<u8>,
    format: DatasetFormat,
    config: &IngestionConfig,
) -> Box<dyn DatasetConnector> {
    match format {
        DatasetFormat::Csv => Box::new(CsvConnector::with_delimiter(
            source_id,
            bytes,
            config.csv_delimiter as u8,
        )),
        DatasetFormat::Json => Box::new(JsonConnector::new(source_id, bytes)),
        DatasetFormat::Parquet => Box::new(ParquetConnector::new(source_id, bytes)),
        DatasetFormat::Excel => Box::new(XlsxConnector::new(source_id, bytes)),
    }
}

/// Parse an in-memory upload
pub fn load_bytes(
    source_id: &str,
    bytes: Vec<u8>,
    format: DatasetFormat,
    config: &IngestionConfig,
) -> Result<Dataset> {
    let connector = connector_for(source_id, bytes, format, config);
    debug!("Loading {} as {}", connector.source_id(), connector.source_type());
    connector.load()
}

/// Read and parse a file from disk
pub fn load_dataset(path: impl AsRef<Path>, config: &IngestionConfig) -> Result<Dataset> {
    let path = path.as_ref();
    let format = DatasetFormat::from_path(path)?;
    let bytes = std::fs::read(path)?;
    let label = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let dataset = load_bytes(&label, bytes, format, config)?;
    info!("📥 Loaded {} ({} rows, {} columns)", label, dataset.height(), dataset.column_names().len());
    Ok(dataset)
}
