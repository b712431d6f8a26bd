use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Continuous wavelet transform analysis and synthesis.
#[derive(Parser)]
#[command(
    name = "cwtlab",
    version,
    about = "Continuous wavelet transform analysis and synthesis"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Generate a test signal from unit impulses and sines.
    Generate(GenerateArgs),
    /// Transform one column of a CSV file.
    Transform(TransformArgs),
}

/// Arguments for the `generate` subcommand.
#[derive(clap::Args)]
pub struct GenerateArgs {
    /// Number of samples.
    pub samples: usize,

    /// Add a unit impulse at this sample index (repeatable).
    #[arg(long = "delta")]
    pub deltas: Vec<usize>,

    /// Add a unit-amplitude sine with this period in samples (repeatable).
    #[arg(long = "sin")]
    pub periods: Vec<f64>,

    /// Output CSV path, `-` for stdout.
    #[arg(short, long, default_value = "-")]
    pub output: PathBuf,
}

/// Arguments for the `transform` subcommand.
///
/// Flags override the matching values of the TOML configuration.
#[derive(clap::Args)]
pub struct TransformArgs {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Input CSV path, `-` for stdin.
    #[arg(short, long, default_value = "-")]
    pub input: PathBuf,

    /// Coefficient CSV path, `-` for stdout.
    #[arg(short, long, default_value = "-")]
    pub output: PathBuf,

    /// Scale range as MIN:MAX[:COUNT].
    #[arg(short, long)]
    pub scales: Option<String>,

    /// Scale spacing: log or linear.
    #[arg(long)]
    pub spacing: Option<String>,

    /// Wavelet family, e.g. morlet:2, cauchy:16, dog:4.
    #[arg(short, long)]
    pub wavelet: Option<String>,

    /// Input column, by zero-based index or header name.
    #[arg(long)]
    pub column: Option<String>,

    /// Treat the first input record as a header row.
    #[arg(long)]
    pub header: bool,

    /// Sampling interval of the input signal.
    #[arg(long)]
    pub dt: Option<f64>,

    /// Boundary policy: zero, periodic or reflect.
    #[arg(long)]
    pub boundary: Option<String>,

    /// Convolution strategy: auto, direct or fft.
    #[arg(long)]
    pub strategy: Option<String>,

    /// Store coarse scales subsampled.
    #[arg(long)]
    pub subsample: bool,

    /// Coefficient projection written to the output: abs, angle, real or imag.
    #[arg(long, default_value = "abs")]
    pub view: String,

    /// Fixed number of decimals in CSV output.
    #[arg(long)]
    pub precision: Option<usize>,

    /// Also save the coefficient grid as JSON.
    #[arg(long)]
    pub grid_json: Option<PathBuf>,

    /// Also write the per-scale global spectrum as CSV.
    #[arg(long)]
    pub spectrum: Option<PathBuf>,

    /// Also reconstruct the signal and write it as CSV.
    #[arg(long)]
    pub reconstruct: Option<PathBuf>,
}
