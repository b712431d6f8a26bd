//! CSV output of coefficient views, spectra and reconstructed signals.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use cwtlab_cwt::{CoefficientGrid, ComponentView, Signal, WaveletKernel};
use tracing::info;

use crate::error::IoError;

/// Configuration for CSV output.
///
/// Coefficient files hold one record per scale: `scale, stride, v0, v1, …`.
/// Subsampled rows are shorter than full-resolution rows, so records may have
/// different lengths.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Real-valued projection of the coefficients.
    view: ComponentView,
    /// Field delimiter.
    delimiter: u8,
    /// Whether to emit a header row.
    header: bool,
    /// Digits after the decimal point, or shortest round-trip form.
    precision: Option<usize>,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            view: ComponentView::default(),
            delimiter: b',',
            header: true,
            precision: None,
        }
    }
}

impl WriterConfig {
    /// Sets the coefficient projection.
    pub fn with_view(mut self, view: ComponentView) -> Self {
        self.view = view;
        self
    }

    /// Sets the field delimiter.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Enables or disables the header row.
    pub fn with_header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    /// Sets a fixed number of decimals.
    pub fn with_precision(mut self, precision: Option<usize>) -> Self {
        self.precision = precision;
        self
    }

    pub fn view(&self) -> ComponentView {
        self.view
    }

    fn format(&self, value: f64) -> String {
        match self.precision {
            Some(p) => format!("{value:.p$}"),
            None => value.to_string(),
        }
    }

    fn csv_writer<W: Write>(&self, writer: W) -> csv::Writer<W> {
        csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .from_writer(writer)
    }
}

/// Write the projected coefficient grid to a CSV file.
///
/// # Errors
///
/// Returns [`IoError::Io`] if the file cannot be created, or
/// [`IoError::Csv`] if writing fails.
pub fn write_coefficients(
    path: &Path,
    grid: &CoefficientGrid,
    config: &WriterConfig,
) -> Result<(), IoError> {
    let file = File::create(path)?;
    write_coefficients_to(file, grid, config)?;
    info!(path = %path.display(), view = %config.view, rows = grid.n_scales(), "coefficients written");
    Ok(())
}

/// Write the projected coefficient grid as CSV to any writer.
///
/// # Errors
///
/// Returns [`IoError::Csv`] if a record cannot be written.
pub fn write_coefficients_to<W: Write>(
    writer: W,
    grid: &CoefficientGrid,
    config: &WriterConfig,
) -> Result<(), IoError> {
    let mut wtr = config.csv_writer(writer);

    if config.header {
        let mut header = vec!["scale".to_string(), "stride".to_string()];
        header.extend((0..grid.n_times()).map(|t| format!("t{t}")));
        wtr.write_record(&header)?;
    }

    for ((row, scale), stride) in grid
        .component(config.view)
        .iter()
        .zip(grid.scales().iter())
        .zip(grid.strides())
    {
        let mut record = Vec::with_capacity(row.len() + 2);
        record.push(scale.to_string());
        record.push(stride.to_string());
        record.extend(row.iter().map(|&v| config.format(v)));
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write per-scale summary columns: `scale, period, global_power`.
///
/// Periods are in time units of the analysed signal.
///
/// # Errors
///
/// Returns [`IoError::Csv`] if a record cannot be written.
pub fn write_spectrum_to<W: Write>(
    writer: W,
    grid: &CoefficientGrid,
    kernel: &WaveletKernel,
    config: &WriterConfig,
) -> Result<(), IoError> {
    let mut wtr = config.csv_writer(writer);
    if config.header {
        wtr.write_record(["scale", "period", "global_power"])?;
    }
    let periods = grid.periods(kernel);
    let power = grid.global_spectrum();
    for ((scale, period), p) in grid.scales().iter().zip(periods).zip(power) {
        wtr.write_record([scale.to_string(), config.format(period), config.format(p)])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write a signal, one sample per record.
///
/// # Errors
///
/// Returns [`IoError::Io`] if the file cannot be created, or
/// [`IoError::Csv`] if writing fails.
pub fn write_signal(path: &Path, signal: &Signal, config: &WriterConfig) -> Result<(), IoError> {
    let file = File::create(path)?;
    write_signal_to(file, signal, config)?;
    info!(path = %path.display(), samples = signal.len(), "signal written");
    Ok(())
}

/// Write a signal as single-column CSV to any writer.
///
/// # Errors
///
/// Returns [`IoError::Csv`] if a record cannot be written.
pub fn write_signal_to<W: Write>(
    writer: W,
    signal: &Signal,
    config: &WriterConfig,
) -> Result<(), IoError> {
    let mut wtr = config.csv_writer(writer);
    if config.header {
        wtr.write_record(["value"])?;
    }
    for &v in signal.as_slice() {
        wtr.write_record([config.format(v)])?;
    }
    wtr.flush()?;
    Ok(())
}
