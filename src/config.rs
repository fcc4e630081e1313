//! Parser configuration

use crate::error::{EvidenceError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default cap on table rows in rendered evidence
pub const DEFAULT_MAX_ROWS_PER_TABLE: usize = 50;

/// Default number of records kept in a sheet's `cellsSample`
pub const DEFAULT_CELLS_SAMPLE_ROWS: usize = 5;

/// Tunables for parsing and rendering. Unknown keys are rejected; missing
/// keys take their defaults.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct EvidenceConfig {
    /// Max rows printed per table when rendering evidence text
    pub max_rows_per_table: usize,

    /// Records copied into each sheet's sample view
    pub cells_sample_rows: usize,
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            max_rows_per_table: DEFAULT_MAX_ROWS_PER_TABLE,
            cells_sample_rows: DEFAULT_CELLS_SAMPLE_ROWS,
        }
    }
}

impl EvidenceConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| EvidenceError::Config(e.to_string()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| EvidenceError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    #[must_use]
    pub const fn with_max_rows_per_table(mut self, rows: usize) -> Self {
        self.max_rows_per_table = rows;
        self
    }
}
