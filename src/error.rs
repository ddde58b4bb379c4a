//! Error types for chart generation
//!
//! Every failure in the library is a [`ChartError`]. Callers that only need to
//! know which stage failed can ask for its [`ErrorKind`].

use std::path::PathBuf;
use thiserror::Error;

/// Broad classification of a [`ChartError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Conflicting or missing options, detected before any loading happens
    Configuration,
    /// The input could not be read or parsed
    Load,
    /// Columns could not be resolved against the loaded rows
    Resolution,
    /// The chart could not be drawn or saved
    Render,
}

/// Errors that can occur while loading, resolving or rendering
#[derive(Error, Debug)]
pub enum ChartError {
    #[error("{0}")]
    Config(String),

    #[error("Failed to read '{}': {source}", path.display())]
    Input {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// The payload decoded but does not have a usable shape
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Cannot convert value {value} in column '{column}' to a number")]
    NotNumeric { value: String, column: String },

    #[error("No data rows found")]
    EmptyDataset,

    #[error("Column '{column}' not found. Available columns: {}", available.join(", "))]
    ColumnNotFound {
        column: String,
        available: Vec<String>,
    },

    #[error("{chart} needs at least two columns. Available columns: {}", available.join(", "))]
    TooFewColumns {
        chart: &'static str,
        available: Vec<String>,
    },

    #[error("Unknown style '{name}'. Available styles: {}", available.join(", "))]
    UnknownStyle {
        name: String,
        available: Vec<&'static str>,
    },

    #[error("Failed to render chart: {0}")]
    Render(String),
}

/// Result type alias for chart operations
pub type Result<T> = std::result::Result<T, ChartError>;

impl ChartError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ChartError::Config(_) | ChartError::UnknownStyle { .. } => ErrorKind::Configuration,
            ChartError::Input { .. }
            | ChartError::Io(_)
            | ChartError::Csv(_)
            | ChartError::Json(_)
            | ChartError::Sql(_)
            | ChartError::InvalidData(_)
            | ChartError::NotNumeric { .. } => ErrorKind::Load,
            ChartError::EmptyDataset
            | ChartError::ColumnNotFound { .. }
            | ChartError::TooFewColumns { .. } => ErrorKind::Resolution,
            ChartError::Render(_) => ErrorKind::Render,
        }
    }

    pub(crate) fn config(msg: impl Into<String>) -> Self {
        ChartError::Config(msg.into())
    }
}
