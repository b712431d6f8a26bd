use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Top-level cwtlab configuration.
///
/// Every section and key is optional; missing values fall back to the same
/// defaults the library types use.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CwtlabConfig {
    /// Mother wavelet selection.
    #[serde(default)]
    pub kernel: KernelToml,

    /// Scale set definition.
    #[serde(default)]
    pub scales: ScalesToml,

    /// Analysis and synthesis settings.
    #[serde(default)]
    pub analysis: AnalysisToml,

    /// Input settings.
    #[serde(default)]
    pub io: IoToml,
}

impl CwtlabConfig {
    /// Loads a configuration file, or the defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("failed to parse config: {}", path.display()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KernelToml {
    #[serde(default = "default_family")]
    pub family: String,
}

impl Default for KernelToml {
    fn default() -> Self {
        Self {
            family: default_family(),
        }
    }
}

fn default_family() -> String {
    "morlet:2".to_string()
}

/// Either explicit `values`, or `count` scales from `min` to `max`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScalesToml {
    #[serde(default = "default_min_scale")]
    pub min: f64,
    #[serde(default = "default_max_scale")]
    pub max: f64,
    #[serde(default = "default_scale_count")]
    pub count: usize,
    #[serde(default = "default_spacing")]
    pub spacing: String,
    #[serde(default)]
    pub values: Option<Vec<f64>>,
}

impl Default for ScalesToml {
    fn default() -> Self {
        Self {
            min: default_min_scale(),
            max: default_max_scale(),
            count: default_scale_count(),
            spacing: default_spacing(),
            values: None,
        }
    }
}

fn default_min_scale() -> f64 {
    2.0
}
fn default_max_scale() -> f64 {
    64.0
}
fn default_scale_count() -> usize {
    16
}
fn default_spacing() -> String {
    "log".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisToml {
    #[serde(default = "default_boundary")]
    pub boundary: String,
    #[serde(default = "default_strategy")]
    pub strategy: String,
    #[serde(default = "default_true")]
    pub parallel: bool,
    #[serde(default)]
    pub subsample: bool,
    #[serde(default = "default_interpolation")]
    pub interpolation: String,
}

impl Default for AnalysisToml {
    fn default() -> Self {
        Self {
            boundary: default_boundary(),
            strategy: default_strategy(),
            parallel: true,
            subsample: false,
            interpolation: default_interpolation(),
        }
    }
}

fn default_boundary() -> String {
    "zero".to_string()
}
fn default_strategy() -> String {
    "auto".to_string()
}
fn default_true() -> bool {
    true
}
fn default_interpolation() -> String {
    "lagrange".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IoToml {
    /// Column index or header name.
    #[serde(default = "default_column")]
    pub column: String,
    #[serde(default)]
    pub has_header: bool,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    #[serde(default = "default_dt")]
    pub dt: f64,
}

impl Default for IoToml {
    fn default() -> Self {
        Self {
            column: default_column(),
            has_header: false,
            delimiter: default_delimiter(),
            dt: default_dt(),
        }
    }
}

fn default_column() -> String {
    "0".to_string()
}
fn default_delimiter() -> String {
    ",".to_string()
}
fn default_dt() -> f64 {
    1.0
}
