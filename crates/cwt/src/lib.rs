//! # cwtlab-cwt
//!
//! Continuous wavelet transform of sampled real signals and its approximate
//! inverse.
//!
//! ## Transform Pipeline
//!
//! ```mermaid
//! graph LR
//!     A["Signal::new(data)?"] -->|"validate"| B["Signal"]
//!     K["WaveletKernel::new(family)?"] --> E["AnalysisEngine"]
//!     S["ScaleSet::from_range(..)?"] --> E
//!     B -->|"engine.analyze(&signal)?"| C["CoefficientGrid"]
//!     C -->|"SynthesisEngine::synthesize(&grid)?"| B
//!     C --> D[".power()"]
//!     C --> F[".global_spectrum()"]
//!     C --> G[".cone_of_influence(&kernel)"]
//! ```
//!
//! ## Supported Kernels
//!
//! | Family | Analytic | Admissibility |
//! |--------|----------|---------------|
//! | [`WaveletFamily::Morlet`] | yes | quadrature |
//! | [`WaveletFamily::Cauchy`] | yes | closed form, `1/2` |
//! | [`WaveletFamily::DerivativeOfGaussian`] | no | closed form |
//! | [`WaveletFamily::Sampled`] | derived | quadrature |
//!
//! ## Quick Start
//!
//! ```ignore
//! use cwtlab_cwt::{BoundaryPolicy, ScaleSet, Signal, TransformPipeline, WaveletKernel};
//!
//! let signal = Signal::new(data)?;
//! let kernel = WaveletKernel::morlet(1.0)?;
//! let scales = ScaleSet::from_octaves(2.0, 8.0, 57)?;
//!
//! let mut pipeline = TransformPipeline::new(kernel, scales)
//!     .with_boundary(BoundaryPolicy::Periodic);
//! let grid = pipeline.analyze(&signal)?;
//! println!("{} scales x {} samples", grid.n_scales(), grid.n_times());
//! let reconstruction = pipeline.synthesize()?;
//! ```

mod analysis;
mod boundary;
mod cancel;
mod convolution;
mod error;
mod grid;
mod kernel;
mod pipeline;
mod scales;
mod signal;
mod synthesis;

pub use analysis::{AnalysisEngine, analyze};
pub use boundary::BoundaryPolicy;
pub use cancel::CancelToken;
pub use convolution::ConvolutionStrategy;
pub use error::CwtError;
pub use grid::{CoefficientGrid, ComponentView};
pub use kernel::{
    DEFAULT_CAUCHY_ALPHA, DEFAULT_DOG_ORDER, DEFAULT_MORLET_DFF, SUPPORT_EPS, WaveletFamily,
    WaveletKernel,
};
pub use pipeline::{PipelineStage, TransformPipeline, transform};
pub use scales::ScaleSet;
pub use signal::Signal;
pub use synthesis::{Interpolation, SynthesisEngine, synthesize};
