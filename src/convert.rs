//! Pure conversion functions: TOML config structs -> crate API config types.

use anyhow::{Context, Result, bail};

use cwtlab_cwt::{
    BoundaryPolicy, ComponentView, ConvolutionStrategy, Interpolation, ScaleSet,
    TransformPipeline, WaveletKernel,
};
use cwtlab_io::{ColumnSelector, ReaderConfig, WriterConfig};

use crate::config::*;

/// Scale bounds from a `MIN:MAX[:COUNT]` definition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleDef {
    pub min: f64,
    pub max: f64,
    pub count: Option<usize>,
}

/// Parses a `MIN:MAX[:COUNT]` scale definition.
pub fn parse_scale_def(s: &str) -> Result<ScaleDef> {
    let parts: Vec<&str> = s.split(':').map(str::trim).collect();
    if !(2..=3).contains(&parts.len()) {
        bail!("illegal scale definition {s:?}: requires MIN:MAX[:COUNT]");
    }
    let min: f64 = parts[0]
        .parse()
        .with_context(|| format!("invalid minimum scale {:?}", parts[0]))?;
    let max: f64 = parts[1]
        .parse()
        .with_context(|| format!("invalid maximum scale {:?}", parts[1]))?;
    let count = match parts.get(2) {
        Some(c) => Some(
            c.parse::<usize>()
                .with_context(|| format!("invalid scale count {c:?}"))?,
        ),
        None => None,
    };
    Ok(ScaleDef { min, max, count })
}

/// Parses a kernel family string such as `"morlet:1.5"` into a kernel.
pub fn parse_kernel(s: &str) -> Result<WaveletKernel> {
    s.parse()
        .with_context(|| format!("invalid wavelet {s:?}"))
}

pub fn parse_boundary(s: &str) -> Result<BoundaryPolicy> {
    s.parse()
        .with_context(|| format!("invalid boundary policy {s:?}"))
}

pub fn parse_strategy(s: &str) -> Result<ConvolutionStrategy> {
    s.parse()
        .with_context(|| format!("invalid convolution strategy {s:?}"))
}

pub fn parse_interpolation(s: &str) -> Result<Interpolation> {
    s.parse()
        .with_context(|| format!("invalid interpolation {s:?}"))
}

pub fn parse_view(s: &str) -> Result<ComponentView> {
    s.parse()
        .with_context(|| format!("invalid component view {s:?}"))
}

/// Parses a single-character field delimiter.
pub fn parse_delimiter(s: &str) -> Result<u8> {
    match s.as_bytes() {
        [b] => Ok(*b),
        _ => bail!("delimiter must be a single ASCII character, got {s:?}"),
    }
}

/// Builds a [`ScaleSet`] from the TOML scales configuration.
///
/// Explicit `values` take precedence over `min`, `max` and `count`.
pub fn build_scales(scales: &ScalesToml) -> Result<ScaleSet> {
    if let Some(ref values) = scales.values {
        return ScaleSet::from_explicit(values.iter().copied())
            .context("invalid [scales].values");
    }
    let set = match scales.spacing.to_lowercase().as_str() {
        "log" | "logarithmic" => {
            if scales.count == 1 {
                ScaleSet::from_explicit([scales.min])
            } else {
                if !(scales.min > 0.0 && scales.max >= scales.min) {
                    bail!(
                        "log spacing requires 0 < min <= max, got min {} and max {}",
                        scales.min,
                        scales.max
                    );
                }
                let factor = (scales.max / scales.min).powf(1.0 / (scales.count - 1) as f64);
                ScaleSet::from_range(scales.count, scales.min, factor)
            }
        }
        "linear" => ScaleSet::from_bounds(scales.min, scales.max, scales.count),
        other => bail!("unknown scale spacing: {other:?}"),
    };
    set.context("invalid [scales] definition")
}

/// Builds a [`ReaderConfig`] from the TOML I/O configuration.
pub fn build_reader_config(io: &IoToml) -> Result<ReaderConfig> {
    let Ok(column) = io.column.parse::<ColumnSelector>();
    let cfg = ReaderConfig::default()
        .with_column(column)
        .with_has_header(io.has_header)
        .with_delimiter(parse_delimiter(&io.delimiter)?)
        .with_dt(io.dt);
    cfg.validate().context("invalid [io] configuration")?;
    Ok(cfg)
}

/// Builds a [`TransformPipeline`] from the kernel, scales and analysis
/// sections.
pub fn build_pipeline(config: &CwtlabConfig) -> Result<TransformPipeline> {
    let kernel = parse_kernel(&config.kernel.family)?;
    let scales = build_scales(&config.scales)?;
    let analysis = &config.analysis;
    Ok(TransformPipeline::new(kernel, scales)
        .with_boundary(parse_boundary(&analysis.boundary)?)
        .with_strategy(parse_strategy(&analysis.strategy)?)
        .with_interpolation(parse_interpolation(&analysis.interpolation)?)
        .with_parallel(analysis.parallel)
        .with_subsampling(analysis.subsample))
}

/// Builds a [`WriterConfig`] for coefficient output.
pub fn build_writer_config(view: &str, precision: Option<usize>) -> Result<WriterConfig> {
    Ok(WriterConfig::default()
        .with_view(parse_view(view)?)
        .with_precision(precision))
}
