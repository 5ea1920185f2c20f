//! CSV Connector - Accepts raw CSV bytes and builds a typed dataset

use crate::dataset::Dataset;
use crate::error::{LeaderboardError, Result};
use crate::ingestion::connector::DatasetConnector;
use csv::{ReaderBuilder, Trim};
use polars::prelude::*;

/// CSV Connector - Wraps uploaded CSV bytes and infers one type per column.
pub struct CsvConnector {
    source_id: String,
    bytes: Vec<u8>,
    delimiter: u8,
}

/// Cell type inferred for a whole column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Int,
    Float,
    Bool,
    Text,
}

impl CsvConnector {
    pub fn new(source_id: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::with_delimiter(source_id, bytes, b',')
    }

    pub fn with_delimiter(source_id: impl Into<String>, bytes: Vec<u8>, delimiter: u8) -> Self {
        Self {
            source_id: source_id.into(),
            bytes,
            delimiter,
        }
    }

    fn cell_kind(cell: &str) -> ColumnKind {
        if cell.parse::<i64>().is_ok() {
            ColumnKind::Int
        } else if cell.parse::<f64>().is_ok() {
            ColumnKind::Float
        } else if cell.eq_ignore_ascii_case("true") || cell.eq_ignore_ascii_case("false") {
            ColumnKind::Bool
        } else {
            ColumnKind::Text
        }
    }

    /// Narrowest kind that holds every non-empty cell of a column
    fn infer_kind(cells: &[Option<String>]) -> ColumnKind {
        let mut kind: Option<ColumnKind> = None;
        for cell in cells.iter().flatten() {
            let next = Self::cell_kind(cell);
            kind = Some(match (kind, next) {
                (None, k) => k,
                (Some(a), b) if a == b => a,
                (Some(ColumnKind::Int), ColumnKind::Float) | (Some(ColumnKind::Float), ColumnKind::Int) => {
                    ColumnKind::Float
                }
                _ => return ColumnKind::Text,
            });
        }
        kind.unwrap_or(ColumnKind::Text)
    }

    pub(crate) fn build_series(name: &str, cells: Vec<Option<String>>) -> Series {
        match Self::infer_kind(&cells) {
            ColumnKind::Int => {
                let values: Vec<Option<i64>> = cells
                    .iter()
                    .map(|c| c.as_deref().and_then(|s| s.parse().ok()))
                    .collect();
                Series::new(name, values)
            }
            ColumnKind::Float => {
                let values: Vec<Option<f64>> = cells
                    .iter()
                    .map(|c| c.as_deref().and_then(|s| s.parse().ok()))
                    .collect();
                Series::new(name, values)
            }
            ColumnKind::Bool => {
                let values: Vec<Option<bool>> = cells
                    .iter()
                    .map(|c| c.as_deref().map(|s| s.eq_ignore_ascii_case("true")))
                    .collect();
                Series::new(name, values)
            }
            ColumnKind::Text => Series::new(name, cells),
        }
    }

    fn parse_columns(&self) -> Result<DataFrame> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .delimiter(self.delimiter)
            .from_reader(self.bytes.as_slice());

        let headers = rdr
            .headers()?
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
            .collect::<Vec<_>>();

        let mut columns: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
        for result in rdr.records() {
            let record = result?;
            for (idx, column) in columns.iter_mut().enumerate() {
                let cell = record.get(idx).unwrap_or("");
                column.push(if cell.is_empty() { None } else { Some(cell.to_string()) });
            }
        }

        let series = headers
            .iter()
            .zip(columns)
            .map(|(name, cells)| Self::build_series(name, cells))
            .collect::<Vec<_>>();

        Ok(DataFrame::new(series)?)
    }
}

impl DatasetConnector for CsvConnector {
    fn load(&self) -> Result<Dataset> {
        let frame = self.parse_columns().map_err(|e| LeaderboardError::Ingestion {
            source_label: self.source_id.clone(),
            message: e.to_string(),
        })?;
        Ok(Dataset::new(self.source_id.clone(), frame))
    }

    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn source_type(&self) -> &str {
        "csv"
    }
}
