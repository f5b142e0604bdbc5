//! Classification code → human-readable description lookup.

use caseflow_core::EngineError;
use std::collections::HashMap;
use std::path::Path;

/// Resolves external classification codes to descriptions.
pub trait CodeLookup: Send + Sync {
    /// Description for a code, or None when the code is unknown
    fn describe(&self, code: &str) -> Option<String>;
}

/// In-memory code table, loadable from a two-column CSV (code, description).
#[derive(Debug, Default)]
pub struct TableCodeLookup {
    descriptions: HashMap<String, String>,
}

impl TableCodeLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code: impl Into<String>, description: impl Into<String>) {
        self.descriptions.insert(code.into(), description.into());
    }

    pub fn len(&self) -> usize {
        self.descriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptions.is_empty()
    }

    /// Load a code table from CSV. The first column is the code, the
    /// second its description; the header row is skipped.
    pub fn from_csv_file(path: &Path) -> Result<Self, EngineError> {
        let mut rdr = csv::Reader::from_path(path)
            .map_err(|e| EngineError::Io(format!("failed to open code table: {}", e)))?;

        let mut table = Self::new();
        for (idx, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| EngineError::InvalidRow {
                row: idx,
                reason: e.to_string(),
            })?;
            let code = record.get(0).unwrap_or("").trim();
            let description = record.get(1).unwrap_or("").trim();
            if code.is_empty() {
                return Err(EngineError::InvalidRow {
                    row: idx,
                    reason: "empty classification code".to_string(),
                });
            }
            table.insert(code, description);
        }
        Ok(table)
    }
}

impl CodeLookup for TableCodeLookup {
    fn describe(&self, code: &str) -> Option<String> {
        self.descriptions.get(code).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_lookup() {
        let mut table = TableCodeLookup::new();
        table.insert("A41.9", "Sepsis, unspecified organism");
        assert_eq!(
            table.describe("A41.9").as_deref(),
            Some("Sepsis, unspecified organism")
        );
        assert_eq!(table.describe("Z99.9"), None);
    }
}
