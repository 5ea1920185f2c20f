//! Dataset Connector Trait - Abstract interface for uploaded files

use crate::dataset::Dataset;
use crate::error::Result;

/// Dataset Connector Trait
///
/// Implementations:
/// - CsvConnector: delimited text parsed with the `csv` crate
/// - JsonConnector: array-of-records JSON read through polars
/// - ParquetConnector: parquet files read through polars
/// - XlsxConnector: first worksheet of an Excel workbook via `calamine`
pub trait DatasetConnector {
    /// Parse the wrapped bytes into a dataset
    fn load(&self) -> Result<Dataset>;

    /// Get source ID (usually the file name)
    fn source_id(&self) -> &str;

    /// Get source type (e.g., "csv", "json", "parquet", "xlsx")
    fn source_type(&self) -> &str;
}
