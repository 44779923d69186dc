//! Error handling for the migration panel pipeline.
//!
//! Data problems (unknown codes, missing join partners, degenerate ratios)
//! are handled where they occur and never surface as errors. The variants
//! below cover I/O, malformed lookup tables, invalid configuration and the
//! one fatal runtime condition: a stage started before its inputs exist.

pub mod util;

use std::io;
use std::path::PathBuf;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use thiserror::Error;

/// Specialized error type for the pipeline
#[derive(Debug, Error)]
pub enum PanelError {
    /// Error opening, reading or writing a file
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// IO error without a known path
    #[error("IO error: {0}")]
    RawIo(#[from] io::Error),

    /// Error parsing or writing a delimited file
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Error processing Parquet data
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    /// Error building or slicing Arrow data
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// A file does not have the columns its layout names
    #[error("Schema error: {0}")]
    Schema(String),

    /// Error converting rows to and from Arrow or JSON
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid pipeline configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A lookup or concordance table that cannot be used as given
    #[error("Crosswalk error in {table}: {message}")]
    Crosswalk { table: String, message: String },

    /// A stage was started before its producer wrote the staged input
    #[error("Stage `{stage}` requires staged input {path} which does not exist")]
    MissingStagedInput { stage: String, path: PathBuf },

    /// An estimation specification could not be solved
    #[error("Estimation error in `{spec}`: {message}")]
    Estimation { spec: String, message: String },

    /// A stage failed for another reason
    #[error("Stage `{stage}` failed: {message}")]
    Stage { stage: String, message: String },
}

impl PanelError {
    /// Attach a path to an IO error
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a crosswalk table error
    pub fn crosswalk(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Crosswalk {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create an estimation error
    pub fn estimation(spec: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Estimation {
            spec: spec.into(),
            message: message.into(),
        }
    }
}

impl From<serde_arrow::Error> for PanelError {
    fn from(error: serde_arrow::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<serde_json::Error> for PanelError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PanelError>;
