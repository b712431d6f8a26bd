//! CSV signal reader configuration and orchestration.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use cwtlab_cwt::Signal;
use tracing::{debug, info};

use crate::error::IoError;
use crate::validate::ValidationCollector;

// ---------------------------------------------------------------------------
// ColumnSelector
// ---------------------------------------------------------------------------

/// Column holding the signal samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSelector {
    /// Zero-based column index.
    Index(usize),
    /// Header name; requires a header row.
    Name(String),
}

impl Default for ColumnSelector {
    fn default() -> Self {
        Self::Index(0)
    }
}

impl fmt::Display for ColumnSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

impl FromStr for ColumnSelector {
    type Err = std::convert::Infallible;

    /// Digits select by index, anything else by header name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(match s.parse::<usize>() {
            Ok(i) => Self::Index(i),
            Err(_) => Self::Name(s.to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// ReaderConfig
// ---------------------------------------------------------------------------

/// Configuration for reading a signal from one column of a CSV file.
///
/// The [`Default`] implementation reads the first column of a comma-separated
/// file without a header, at unit sampling interval. Lines starting with `#`
/// are skipped.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Column holding the samples.
    column: ColumnSelector,
    /// Whether the first record is a header row.
    has_header: bool,
    /// Field delimiter.
    delimiter: u8,
    /// Sampling interval attached to the signal.
    dt: f64,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            column: ColumnSelector::default(),
            has_header: false,
            delimiter: b',',
            dt: 1.0,
        }
    }
}

impl ReaderConfig {
    /// Set the column to read.
    pub fn with_column(mut self, column: ColumnSelector) -> Self {
        self.column = column;
        self
    }

    /// Declare whether the file starts with a header row.
    pub fn with_has_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Set the field delimiter.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set the sampling interval of the signal.
    pub fn with_dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }

    /// Column to read.
    pub fn column(&self) -> &ColumnSelector {
        &self.column
    }

    /// Sampling interval attached to the signal.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Validate that the configuration is internally consistent.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Validation`] listing every problem: a non-positive
    /// or non-finite `dt`, a column name without a header row, or a delimiter
    /// that is alphanumeric, a quote, or a line break.
    pub fn validate(&self) -> Result<(), IoError> {
        let mut c = ValidationCollector::new();

        if !(self.dt.is_finite() && self.dt > 0.0) {
            c.push(format!("dt must be positive and finite, got {}", self.dt));
        }
        if let ColumnSelector::Name(name) = &self.column
            && !self.has_header
        {
            c.push(format!("column '{name}' selected by name but has_header is false"));
        }
        if self.delimiter.is_ascii_alphanumeric() || matches!(self.delimiter, b'"' | b'\n' | b'\r')
        {
            c.push(format!(
                "delimiter {:?} is not a usable separator",
                char::from(self.delimiter)
            ));
        }

        c.finish()
    }
}

// ---------------------------------------------------------------------------
// read_signal
// ---------------------------------------------------------------------------

/// Read a signal from one column of a CSV file.
///
/// # Errors
///
/// | Variant | Trigger |
/// |---------|---------|
/// | [`IoError::Validation`] | invalid configuration |
/// | [`IoError::FileNotFound`] | `path` does not exist |
/// | any | from [`read_signal_from`] |
#[tracing::instrument(skip_all, fields(path = %path.display(), column = %config.column))]
pub fn read_signal(path: &Path, config: &ReaderConfig) -> Result<Signal, IoError> {
    config.validate()?;
    if !path.exists() {
        return Err(IoError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let file = File::open(path)?;
    let signal = read_signal_from(file, config)?;
    info!(samples = signal.len(), dt = signal.dt(), "signal loaded");
    Ok(signal)
}

/// Read a signal from CSV data provided by any reader.
///
/// Blank lines and lines starting with `#` are skipped; fields are trimmed.
///
/// # Errors
///
/// | Variant | Trigger |
/// |---------|---------|
/// | [`IoError::Validation`] | invalid configuration |
/// | [`IoError::MissingColumn`] | column name absent from the header, or a record too short |
/// | [`IoError::ParseValue`] | a field is not a number |
/// | [`IoError::Csv`] | malformed CSV |
/// | [`IoError::Transform`] | no samples, or a sample is NaN or infinite |
pub fn read_signal_from<R: Read>(reader: R, config: &ReaderConfig) -> Result<Signal, IoError> {
    config.validate()?;

    let mut csv = csv::ReaderBuilder::new()
        .has_headers(config.has_header)
        .delimiter(config.delimiter)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let index = match &config.column {
        ColumnSelector::Index(i) => *i,
        ColumnSelector::Name(name) => csv
            .headers()?
            .iter()
            .position(|h| h == name.as_str())
            .ok_or_else(|| IoError::MissingColumn {
                column: name.clone(),
                line: 1,
            })?,
    };

    let mut samples = Vec::new();
    for record in csv.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());
        let field = record.get(index).ok_or_else(|| IoError::MissingColumn {
            column: config.column.to_string(),
            line,
        })?;
        let value = field.parse::<f64>().map_err(|_| IoError::ParseValue {
            value: field.to_string(),
            line,
        })?;
        samples.push(value);
    }
    debug!(samples = samples.len(), column = index, "csv column parsed");

    Ok(Signal::with_dt(samples, config.dt)?)
}
