//! Error types for cwtlab-io.

use std::path::PathBuf;

use cwtlab_cwt::CwtError;

/// Error type for all fallible operations in the cwtlab-io crate.
///
/// This enum covers file-system failures, CSV and JSON format errors,
/// malformed values, validation problems, and transform errors raised while
/// turning file contents into signals or coefficient grids.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when a required file does not exist on disk.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path that could not be found.
        path: PathBuf,
    },

    /// Wraps an operating-system I/O failure.
    #[error("io error: {reason}")]
    Io {
        /// Description of the underlying I/O failure.
        reason: String,
    },

    /// Wraps an error originating from the csv crate.
    #[error("csv error: {reason}")]
    Csv {
        /// Description of the underlying CSV failure.
        reason: String,
    },

    /// Wraps an error originating from serde_json.
    #[error("json error: {reason}")]
    Json {
        /// Description of the underlying JSON failure.
        reason: String,
    },

    /// Wraps an error originating from the cwtlab-cwt crate.
    #[error("transform error: {reason}")]
    Transform {
        /// Description of the underlying transform failure.
        reason: String,
    },

    /// Returned when one or more validation checks fail.
    #[error("{count} validation error(s): {details}")]
    Validation {
        /// Number of accumulated validation failures.
        count: usize,
        /// Human-readable summary of the failures.
        details: String,
    },

    /// Returned when the selected column is absent from the header or a record.
    #[error("column '{column}' not found on line {line}")]
    MissingColumn {
        /// Column name or zero-based index.
        column: String,
        /// One-based line number of the offending record.
        line: u64,
    },

    /// Returned when a field cannot be parsed as a number.
    #[error("cannot parse '{value}' as a number on line {line}")]
    ParseValue {
        /// Raw field contents.
        value: String,
        /// One-based line number of the offending record.
        line: u64,
    },

    /// Returned when a grid file was written by an incompatible format version.
    #[error("unsupported grid format version {found}, expected {expected}")]
    UnsupportedVersion {
        /// Version recorded in the file.
        found: u32,
        /// Version this crate reads and writes.
        expected: u32,
    },
}

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Io {
            reason: e.to_string(),
        }
    }
}

impl From<csv::Error> for IoError {
    fn from(e: csv::Error) -> Self {
        IoError::Csv {
            reason: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for IoError {
    fn from(e: serde_json::Error) -> Self {
        IoError::Json {
            reason: e.to_string(),
        }
    }
}

impl From<CwtError> for IoError {
    fn from(e: CwtError) -> Self {
        IoError::Transform {
            reason: e.to_string(),
        }
    }
}
