//! Excel Connector - Reads the first worksheet of an xlsx/xls workbook

use crate::dataset::Dataset;
use crate::error::{LeaderboardError, Result};
use crate::ingestion::connector::DatasetConnector;
use crate::ingestion::csv_connector::CsvConnector;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use polars::prelude::*;
use std::io::Cursor;

/// Excel Connector - First row is the header, later rows are records.
///
/// Cells are rendered to text and typed per column the same way CSV
/// uploads are, so a workbook and its CSV export give the same dataset.
pub struct XlsxConnector {
    source_id: String,
    bytes: Vec<u8>,
}

impl XlsxConnector {
    pub fn new(source_id: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            source_id: source_id.into(),
            bytes,
        }
    }

    fn cell_text(cell: &Data) -> Option<String> {
        match cell {
            Data::Empty | Data::Error(_) => None,
            Data::String(s) => {
                let s = s.trim();
                if s.is_empty() {
                    None
                } else {
                    Some(s.to_string())
                }
            }
            Data::DateTime(dt) => dt
                .as_datetime()
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
            other => Some(format!("{}", other)),
        }
    }

    fn parse_columns(&self) -> Result<DataFrame> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(self.bytes.clone()))?;

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| LeaderboardError::Spreadsheet("workbook has no worksheets".to_string()))?;
        let range = workbook.worksheet_range(&sheet_name)?;

        let mut rows = range.rows();
        let headers: Vec<String> = match rows.next() {
            Some(row) => row
                .iter()
                .enumerate()
                .map(|(idx, cell)| Self::cell_text(cell).unwrap_or_else(|| format!("column_{}", idx + 1)))
                .collect(),
            None => return Ok(DataFrame::empty()),
        };

        let mut columns: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
        for row in rows {
            let cells: Vec<Option<String>> = row.iter().map(Self::cell_text).collect();
            // blank spacer rows inside the used range
            if cells.iter().all(Option::is_none) {
                continue;
            }
            for (idx, column) in columns.iter_mut().enumerate() {
                column.push(cells.get(idx).cloned().flatten());
            }
        }

        let series = headers
            .iter()
            .zip(columns)
            .map(|(name, cells)| CsvConnector::build_series(name, cells))
            .collect::<Vec<_>>();

        Ok(DataFrame::new(series)?)
    }
}

impl DatasetConnector for XlsxConnector {
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
        "xlsx"
    }
}
