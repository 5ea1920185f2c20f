//! JSON Connector - Accepts an array of JSON records

use crate::dataset::Dataset;
use crate::error::{LeaderboardError, Result};
use crate::ingestion::connector::DatasetConnector;
use polars::prelude::*;
use std::io::Cursor;

/// JSON Connector - Wraps uploaded JSON bytes
pub struct JsonConnector {
    source_id: String,
    bytes: Vec<u8>,
}

impl JsonConnector {
    pub fn new(source_id: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            source_id: source_id.into(),
            bytes,
        }
    }
}

impl DatasetConnector for JsonConnector {
    fn load(&self) -> Result<Dataset> {
        let frame = JsonReader::new(Cursor::new(self.bytes.clone()))
            .finish()
            .map_err(|e| LeaderboardError::Ingestion {
                source_label: self.source_id.clone(),
                message: e.to_string(),
            })?;
        Ok(Dataset::new(self.source_id.clone(), frame))
    }

    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn source_type(&self) -> &str {
        "json"
    }
}
