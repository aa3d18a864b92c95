// 🚨 Load Errors - malformed input is rejected at load time
// Filtering and aggregation never fail; everything that can go wrong happens here.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while turning a delimited file into `SalesRecord`s.
///
/// `row` is the 1-based data row (the header row is not counted), which is
/// the number a user sees next to the record in a spreadsheet minus one.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("row {row}: malformed CSV: {source}")]
    Csv {
        row: usize,
        #[source]
        source: csv::Error,
    },

    #[error("missing required column(s): {}", columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    #[error("row {row}: 'Order Date' value '{value}' is not a recognised calendar date")]
    InvalidDate { row: usize, value: String },

    #[error("row {row}: '{field}' value '{value}' is not a valid number")]
    InvalidNumber {
        row: usize,
        field: &'static str,
        value: String,
    },

    #[error("row {row}: required field '{field}' is empty")]
    EmptyField { row: usize, field: &'static str },

    #[error("row {row}: 'Quantity' must be positive, got {value}")]
    NonPositiveQuantity { row: usize, value: String },
}

impl LoadError {
    /// Data row the error refers to, if it is row-specific.
    pub fn row(&self) -> Option<usize> {
        match self {
            LoadError::Csv { row, .. }
            | LoadError::InvalidDate { row, .. }
            | LoadError::InvalidNumber { row, .. }
            | LoadError::EmptyField { row, .. }
            | LoadError::NonPositiveQuantity { row, .. } => Some(*row),
            LoadError::Io { .. } | LoadError::MissingColumns { .. } => None,
        }
    }
}
