//! Tabular Dataset
//!
//! One loaded input file: an ordered set of named, typed columns backed by a
//! polars `DataFrame`, plus the label of the source it came from.

use polars::prelude::*;

/// Number of rows shown by [`Dataset::preview`] when callers have no preference
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

#[derive(Debug, Clone)]
pub struct Dataset {
    label: String,
    frame: DataFrame,
}

impl Dataset {
    pub fn new(label: impl Into<String>, frame: DataFrame) -> Self {
        Self {
            label: label.into(),
            frame,
        }
    }

    /// A dataset with no columns and no rows
    pub fn empty(label: impl Into<String>) -> Self {
        Self::new(label, DataFrame::empty())
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Column names in file order
    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.frame.column(name).is_ok()
    }

    /// First `rows` rows, for showing a user what a file looks like
    pub fn preview(&self, rows: usize) -> DataFrame {
        self.frame.head(Some(rows))
    }

    /// Required column names that the dataset does not carry, in request order
    pub fn missing_columns<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .copied()
            .filter(|name| !self.has_column(name))
            .collect()
    }
}
