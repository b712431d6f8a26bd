//! Integration tests for time-axis subsampling of large scales.

use std::f64::consts::PI;

use cwtlab_cwt::{
    AnalysisEngine, BoundaryPolicy, Interpolation, ScaleSet, Signal, SynthesisEngine,
    WaveletKernel,
};

const N: usize = 1024;

fn sine() -> Vec<f64> {
    (0..N).map(|i| (2.0 * PI * i as f64 / 40.0).sin()).collect()
}

/// Two tones that both fit a whole number of times into `N` samples.
fn two_tones() -> Vec<f64> {
    (0..N)
        .map(|i| {
            let t = i as f64;
            (2.0 * PI * t / 16.0).sin() + 0.5 * (2.0 * PI * t / 32.0).cos()
        })
        .collect()
}

/// 32 log-spaced scales from 8 to 128, a ratio of 16.
fn scales() -> ScaleSet {
    ScaleSet::from_range(32, 8.0, 2f64.powf(4.0 / 31.0)).unwrap()
}

/// 64 log-spaced scales from `s_min` to `16 · s_min`.
fn wide_scales(s_min: f64) -> ScaleSet {
    ScaleSet::from_range(64, s_min, 16f64.powf(1.0 / 63.0)).unwrap()
}

fn l2(a: &[f64]) -> f64 {
    a.iter().map(|v| v * v).sum::<f64>().sqrt()
}

fn error(a: &[f64], b: &[f64]) -> f64 {
    let diff: Vec<f64> = a.iter().zip(b).map(|(x, y)| x - y).collect();
    l2(&diff) / l2(b)
}

fn reconstruct_with(
    kernel: &WaveletKernel,
    scales: ScaleSet,
    boundary: BoundaryPolicy,
    data: &[f64],
    subsample: bool,
    interpolation: Interpolation,
) -> Vec<f64> {
    let engine = AnalysisEngine::new(kernel.clone(), scales)
        .with_boundary(boundary)
        .with_subsampling(subsample);
    let grid = engine.analyze(&Signal::new(data.to_vec()).unwrap()).unwrap();
    assert_eq!(grid.is_subsampled(), subsample);
    SynthesisEngine::from_analysis(&engine)
        .with_interpolation(interpolation)
        .synthesize(&grid)
        .unwrap()
        .into_samples()
}

fn reconstruct(subsample: bool, interpolation: Interpolation) -> Vec<f64> {
    reconstruct_with(
        &WaveletKernel::morlet(1.0).unwrap(),
        scales(),
        BoundaryPolicy::Zero,
        &sine(),
        subsample,
        interpolation,
    )
}

/// Full and subsampled relative errors for a periodic two-tone signal.
fn periodic_errors(kernel: &WaveletKernel, s_min: f64) -> (f64, f64) {
    let data = two_tones();
    let run = |subsample| {
        reconstruct_with(
            kernel,
            wide_scales(s_min),
            BoundaryPolicy::Periodic,
            &data,
            subsample,
            Interpolation::default(),
        )
    };
    (error(&run(false), &data), error(&run(true), &data))
}

#[test]
fn strides_follow_scale_ratio() {
    let strides = scales().strides();
    assert_eq!(strides.first(), Some(&1));
    assert_eq!(strides.last(), Some(&16));
    assert!(strides.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(wide_scales(3.0).strides().last(), Some(&16));
}

#[test]
fn subsampled_grid_stores_fewer_coefficients() {
    let engine = AnalysisEngine::new(WaveletKernel::morlet(1.0).unwrap(), scales())
        .with_subsampling(true);
    let grid = engine.analyze(&Signal::new(sine()).unwrap()).unwrap();
    assert!(grid.stored_len() < 32 * N / 2);
    assert_eq!(grid.row(31).len(), N / 16);
    assert_eq!(grid.n_times(), N);
}

#[test]
fn subsampled_error_within_twice_full_error() {
    let data = sine();
    let full = error(&reconstruct(false, Interpolation::default()), &data);
    let sub = error(&reconstruct(true, Interpolation::default()), &data);
    assert!(sub <= 2.0 * full, "subsampled {sub} vs full {full}");
}

#[test]
fn periodic_morlet_ratio_16_within_twice_full_error() {
    let (full, sub) = periodic_errors(&WaveletKernel::morlet(1.0).unwrap(), 4.0);
    assert!(sub <= 2.0 * full, "subsampled {sub} vs full {full}");
}

#[test]
fn periodic_cauchy_ratio_16_within_twice_full_error() {
    let (full, sub) = periodic_errors(&WaveletKernel::cauchy(16.0).unwrap(), 4.0);
    assert!(sub <= 2.0 * full, "subsampled {sub} vs full {full}");
}

#[test]
fn periodic_mexican_hat_ratio_16_within_twice_full_error() {
    let (full, sub) = periodic_errors(&WaveletKernel::derivative_of_gaussian(2).unwrap(), 3.0);
    assert!(sub <= 2.0 * full, "subsampled {sub} vs full {full}");
}

#[test]
fn periodic_dog4_ratio_16_within_twice_full_error() {
    let (full, sub) = periodic_errors(&WaveletKernel::derivative_of_gaussian(4).unwrap(), 2.0);
    assert!(sub <= 2.0 * full, "subsampled {sub} vs full {full}");
}

#[test]
fn zero_padded_mexican_hat_within_twice_full_error() {
    let kernel = WaveletKernel::derivative_of_gaussian(2).unwrap();
    let data = two_tones();
    let run = |subsample| {
        reconstruct_with(
            &kernel,
            wide_scales(3.0),
            BoundaryPolicy::Zero,
            &data,
            subsample,
            Interpolation::default(),
        )
    };
    let full = error(&run(false), &data);
    let sub = error(&run(true), &data);
    assert!(sub <= 2.0 * full, "subsampled {sub} vs full {full}");
}

#[test]
fn interior_reconstruction_is_accurate() {
    let data = sine();
    let rec = reconstruct(true, Interpolation::default());
    let interior = 256..768;
    let err = error(&rec[interior.clone()], &data[interior]);
    assert!(err < 2e-2, "interior error {err}");
}

#[test]
fn coarser_interpolation_loses_accuracy() {
    let data = sine();
    let interior = 256..768;
    let interior_error = |interpolation| {
        let rec = reconstruct(true, interpolation);
        error(&rec[interior.clone()], &data[interior.clone()])
    };
    let e_lagrange = interior_error(Interpolation::Lagrange);
    let e_linear = interior_error(Interpolation::Linear);
    let e_nearest = interior_error(Interpolation::Nearest);
    assert!(e_lagrange <= e_linear, "lagrange {e_lagrange} vs linear {e_linear}");
    assert!(e_linear <= e_nearest, "linear {e_linear} vs nearest {e_nearest}");
    assert!(e_nearest < 0.1, "nearest {e_nearest}");
}
