// Table assembly and missing-value filtering
use crate::error::EtlError;
use crate::xml_flatten::{FlattenedSheet, Row};

/// Columns named by the header row, records in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct PnrTable {
    columns: Vec<String>,
    records: Vec<Row>,
}

/// A field counts as missing when it is empty or whitespace only.
pub fn is_missing(value: &str) -> bool {
    value.trim().is_empty()
}

impl PnrTable {
    /// Build a table from a header and data rows.
    ///
    /// Every row must have exactly as many values as the header.
    pub fn new(columns: Vec<String>, records: Vec<Row>) -> Result<Self, EtlError> {
        for (index, record) in records.iter().enumerate() {
            if record.len() != columns.len() {
                return Err(EtlError::ShapeMismatch {
                    row: index + 1,
                    expected: columns.len(),
                    found: record.len(),
                });
            }
        }

        Ok(Self { columns, records })
    }

    pub fn from_sheet(sheet: FlattenedSheet) -> Result<Self, EtlError> {
        Self::new(sheet.header, sheet.rows)
    }

    /// Remove every record with a missing field. Returns how many were removed.
    pub fn drop_incomplete(&mut self) -> usize {
        let before = self.records.len();
        self.records
            .retain(|record| !record.iter().any(|value| is_missing(value)));
        before - self.records.len()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Row] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
