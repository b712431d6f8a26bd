//! # cwtlab-io
//!
//! Read signals from CSV files, write coefficient views and spectra to CSV,
//! and persist coefficient grids as JSON. Bridges external file formats into
//! the [`Signal`](cwtlab_cwt::Signal) and
//! [`CoefficientGrid`](cwtlab_cwt::CoefficientGrid) types of `cwtlab-cwt`.

mod error;
mod grid_json;
mod reader;
mod validate;
mod writer;

pub use error::IoError;
pub use grid_json::{FORMAT_VERSION, grid_from_str, grid_to_string, load_grid, save_grid};
pub use reader::{ColumnSelector, ReaderConfig, read_signal, read_signal_from};
pub use writer::{
    WriterConfig, write_coefficients, write_coefficients_to, write_signal, write_signal_to,
    write_spectrum_to,
};
