//! Analysis followed by optional synthesis, with the intermediate state kept.

use tracing::info;

use crate::analysis::AnalysisEngine;
use crate::boundary::BoundaryPolicy;
use crate::cancel::CancelToken;
use crate::convolution::ConvolutionStrategy;
use crate::error::CwtError;
use crate::grid::CoefficientGrid;
use crate::kernel::WaveletKernel;
use crate::scales::ScaleSet;
use crate::signal::Signal;
use crate::synthesis::{Interpolation, SynthesisEngine};

/// Progress of a [`TransformPipeline`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    /// No analysis has run yet.
    Configured,
    /// A coefficient grid is available.
    Analyzed,
    /// A reconstruction of the last analysed signal is available.
    Synthesized,
}

/// Stateful wrapper around [`AnalysisEngine`] and [`SynthesisEngine`].
///
/// Re-analysis is allowed from any stage and discards the previous
/// reconstruction.
///
/// ```ignore
/// let mut pipeline = TransformPipeline::new(kernel, scales)
///     .with_boundary(BoundaryPolicy::Periodic)
///     .with_subsampling(true);
/// let grid = pipeline.analyze(&signal)?;
/// let rec = pipeline.synthesize()?;
/// ```
#[derive(Clone, Debug)]
pub struct TransformPipeline {
    analysis: AnalysisEngine,
    interpolation: Interpolation,
    grid: Option<CoefficientGrid>,
    reconstruction: Option<Signal>,
}

impl TransformPipeline {
    /// Creates a pipeline with zero padding, automatic strategy, no
    /// subsampling, Lagrange interpolation and parallel execution.
    pub fn new(kernel: WaveletKernel, scales: ScaleSet) -> Self {
        Self {
            analysis: AnalysisEngine::new(kernel, scales),
            interpolation: Interpolation::default(),
            grid: None,
            reconstruction: None,
        }
    }

    /// Sets the boundary policy used by the analysis.
    pub fn with_boundary(mut self, boundary: BoundaryPolicy) -> Self {
        self.analysis = self.analysis.with_boundary(boundary);
        self
    }

    /// Enables per-scale subsampling of the stored rows.
    pub fn with_subsampling(mut self, subsample: bool) -> Self {
        self.analysis = self.analysis.with_subsampling(subsample);
        self
    }

    /// Sets how [`synthesize`](Self::synthesize) expands subsampled rows.
    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Forces a convolution strategy instead of the per-scale choice.
    pub fn with_strategy(mut self, strategy: ConvolutionStrategy) -> Self {
        self.analysis = self.analysis.with_strategy(strategy);
        self
    }

    /// Enables or disables parallel execution for both directions.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.analysis = self.analysis.with_parallel(parallel);
        self
    }

    /// Attaches a cancellation token shared by analysis and synthesis.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.analysis = self.analysis.with_cancel_token(token);
        self
    }

    /// Analysis engine backing the pipeline.
    pub fn analysis(&self) -> &AnalysisEngine {
        &self.analysis
    }

    /// Runs the forward transform and stores its grid.
    ///
    /// # Errors
    ///
    /// Same as [`AnalysisEngine::analyze`]. On error the pipeline keeps its
    /// previous grid and reconstruction.
    pub fn analyze(&mut self, signal: &Signal) -> Result<&CoefficientGrid, CwtError> {
        let grid = self.analysis.analyze(signal)?;
        info!(
            n_scales = grid.n_scales(),
            stored = grid.stored_len(),
            "analysis complete"
        );
        self.reconstruction = None;
        Ok(self.grid.insert(grid))
    }

    /// Reconstructs the last analysed signal.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`CwtError::NotAnalyzed`] | no grid is stored |
    /// | any | from [`SynthesisEngine::synthesize`] |
    pub fn synthesize(&mut self) -> Result<&Signal, CwtError> {
        let grid = self.grid.as_ref().ok_or(CwtError::NotAnalyzed)?;
        let signal = SynthesisEngine::from_analysis(&self.analysis)
            .with_interpolation(self.interpolation)
            .synthesize(grid)?;
        info!(n = signal.len(), "synthesis complete");
        Ok(self.reconstruction.insert(signal))
    }

    /// Current stage.
    pub fn stage(&self) -> PipelineStage {
        match (&self.grid, &self.reconstruction) {
            (None, _) => PipelineStage::Configured,
            (Some(_), None) => PipelineStage::Analyzed,
            (Some(_), Some(_)) => PipelineStage::Synthesized,
        }
    }

    /// Grid of the last successful analysis.
    pub fn grid(&self) -> Option<&CoefficientGrid> {
        self.grid.as_ref()
    }

    /// Reconstruction of the last successful synthesis.
    pub fn reconstruction(&self) -> Option<&Signal> {
        self.reconstruction.as_ref()
    }

    /// Consumes the pipeline and returns its grid.
    pub fn into_grid(self) -> Option<CoefficientGrid> {
        self.grid
    }
}

/// Analyses `signal` with optional subsampling and default settings
/// otherwise.
///
/// # Errors
///
/// Same as [`AnalysisEngine::analyze`].
pub fn transform(
    signal: &Signal,
    kernel: &WaveletKernel,
    scales: &ScaleSet,
    subsample: bool,
) -> Result<CoefficientGrid, CwtError> {
    AnalysisEngine::new(kernel.clone(), scales.clone())
        .with_subsampling(subsample)
        .analyze(signal)
}
