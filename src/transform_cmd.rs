use std::fs::File;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use cwtlab_cwt::Signal;
use cwtlab_io::{
    ReaderConfig, WriterConfig, read_signal, read_signal_from, save_grid, write_coefficients,
    write_coefficients_to, write_signal, write_spectrum_to,
};

use crate::cli::TransformArgs;
use crate::config::CwtlabConfig;
use crate::convert;
use crate::generate::is_stdout;

/// Read a signal, transform it, and write the requested outputs.
pub fn run(args: TransformArgs) -> Result<()> {
    let mut config = CwtlabConfig::load(args.config.as_deref())?;
    apply_overrides(&mut config, &args)?;

    let reader_cfg = convert::build_reader_config(&config.io)?;
    let mut pipeline = convert::build_pipeline(&config)?;
    let writer_cfg = convert::build_writer_config(&args.view, args.precision)?;

    let signal = read_input(&args.input, &reader_cfg)?;
    info!(
        samples = signal.len(),
        wavelet = %config.kernel.family,
        n_scales = pipeline.analysis().scales().len(),
        "transforming signal"
    );

    pipeline.analyze(&signal).context("analysis failed")?;
    let grid = pipeline.grid().context("analysis produced no grid")?;

    if is_stdout(&args.output) {
        write_coefficients_to(io::stdout().lock(), grid, &writer_cfg)
            .context("failed to write coefficients to stdout")?;
    } else {
        write_coefficients(&args.output, grid, &writer_cfg).with_context(|| {
            format!("failed to write coefficients: {}", args.output.display())
        })?;
    }

    if let Some(ref path) = args.grid_json {
        save_grid(path, grid)
            .with_context(|| format!("failed to save grid: {}", path.display()))?;
    }

    if let Some(ref path) = args.spectrum {
        let file = File::create(path)
            .with_context(|| format!("failed to create spectrum file: {}", path.display()))?;
        write_spectrum_to(file, grid, pipeline.analysis().kernel(), &writer_cfg)
            .with_context(|| format!("failed to write spectrum: {}", path.display()))?;
        info!(path = %path.display(), "spectrum written");
    }

    if let Some(ref path) = args.reconstruct {
        let reconstruction = pipeline.synthesize().context("synthesis failed")?;
        let signal_cfg = WriterConfig::default()
            .with_header(false)
            .with_precision(args.precision);
        write_signal(path, reconstruction, &signal_cfg)
            .with_context(|| format!("failed to write reconstruction: {}", path.display()))?;
    }

    Ok(())
}

/// Applies command-line flags on top of the loaded configuration.
fn apply_overrides(config: &mut CwtlabConfig, args: &TransformArgs) -> Result<()> {
    if let Some(ref def) = args.scales {
        let def = convert::parse_scale_def(def)?;
        config.scales.min = def.min;
        config.scales.max = def.max;
        if let Some(count) = def.count {
            config.scales.count = count;
        }
        config.scales.values = None;
    }
    if let Some(ref spacing) = args.spacing {
        config.scales.spacing = spacing.clone();
    }
    if let Some(ref wavelet) = args.wavelet {
        config.kernel.family = wavelet.clone();
    }
    if let Some(ref column) = args.column {
        config.io.column = column.clone();
    }
    if args.header {
        config.io.has_header = true;
    }
    if let Some(dt) = args.dt {
        config.io.dt = dt;
    }
    if let Some(ref boundary) = args.boundary {
        config.analysis.boundary = boundary.clone();
    }
    if let Some(ref strategy) = args.strategy {
        config.analysis.strategy = strategy.clone();
    }
    if args.subsample {
        config.analysis.subsample = true;
    }
    Ok(())
}

fn read_input(path: &Path, config: &ReaderConfig) -> Result<Signal> {
    if is_stdout(path) {
        read_signal_from(io::stdin().lock(), config).context("failed to read signal from stdin")
    } else {
        read_signal(path, config)
            .with_context(|| format!("failed to read signal: {}", path.display()))
    }
}
