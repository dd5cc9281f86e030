//! Error types for loading and querying the datasets.

/// Result type for library operations.
pub type Result<T> = std::result::Result<T, InsightsError>;

/// Errors raised while loading, cleaning, or querying the datasets.
#[derive(Debug, thiserror::Error)]
pub enum InsightsError {
    /// A cell could not be parsed into the type its column requires.
    #[error("invalid value {value:?} in column {column:?} (row {row}): {reason}")]
    DataFormat {
        column: String,
        /// 1-based data row, header excluded.
        row: usize,
        value: String,
        reason: String,
    },

    /// A column the preprocessor depends on is absent.
    #[error("{table} table is missing required column {column:?}")]
    MissingColumn { table: String, column: String },

    /// Ranking criterion name not recognized.
    #[error("invalid ranking criterion: {0:?}")]
    InvalidCriterion(String),

    /// Chart kind name not recognized.
    #[error("unknown chart type: {0:?}")]
    UnknownChart(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl InsightsError {
    pub(crate) fn data_format(
        column: &str,
        row: usize,
        value: &str,
        reason: impl Into<String>,
    ) -> Self {
        InsightsError::DataFormat {
            column: column.to_string(),
            row,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}
