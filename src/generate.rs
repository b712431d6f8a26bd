use std::f64::consts::TAU;
use std::io;
use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use cwtlab_cwt::Signal;
use cwtlab_io::{WriterConfig, write_signal, write_signal_to};

use crate::cli::GenerateArgs;

/// Write a synthetic test signal.
pub fn run(args: GenerateArgs) -> Result<()> {
    let samples = synthesize_samples(args.samples, &args.deltas, &args.periods)?;
    let signal = Signal::new(samples).context("generated signal is invalid")?;
    info!(
        samples = signal.len(),
        deltas = args.deltas.len(),
        sines = args.periods.len(),
        "signal generated"
    );

    let config = WriterConfig::default().with_header(false);
    if is_stdout(&args.output) {
        write_signal_to(io::stdout().lock(), &signal, &config)
            .context("failed to write signal to stdout")?;
    } else {
        write_signal(&args.output, &signal, &config)
            .with_context(|| format!("failed to write signal: {}", args.output.display()))?;
    }
    Ok(())
}

/// Whether `path` names standard input or output.
pub fn is_stdout(path: &Path) -> bool {
    path.as_os_str() == "-"
}

/// Sum of unit impulses at `deltas` and unit sines `sin(2πi / period)`.
///
/// Impulse indices past the end are skipped with a warning.
fn synthesize_samples(n: usize, deltas: &[usize], periods: &[f64]) -> Result<Vec<f64>> {
    if n == 0 {
        bail!("number of samples must be at least 1");
    }
    if let Some(p) = periods.iter().find(|p| !(p.is_finite() && **p > 0.0)) {
        bail!("sine period must be positive and finite, got {p}");
    }

    let mut x = vec![0.0; n];
    for &d in deltas {
        match x.get_mut(d) {
            Some(v) => *v += 1.0,
            None => warn!(index = d, samples = n, "impulse outside the signal skipped"),
        }
    }
    for &period in periods {
        for (i, v) in x.iter_mut().enumerate() {
            *v += (TAU * i as f64 / period).sin();
        }
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn impulses_accumulate() {
        let x = synthesize_samples(5, &[1, 3, 3, 9], &[]).unwrap();
        assert_eq!(x, vec![0.0, 1.0, 0.0, 2.0, 0.0]);
    }

    #[test]
    fn sines_are_added_to_impulses() {
        let x = synthesize_samples(8, &[0], &[4.0]).unwrap();
        let expected = [1.0, 1.0, 0.0, -1.0, 0.0, 1.0, 0.0, -1.0];
        for (a, b) in x.iter().zip(expected) {
            assert_abs_diff_eq!(*a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn rejects_empty_and_bad_periods() {
        assert!(synthesize_samples(0, &[], &[]).is_err());
        assert!(synthesize_samples(4, &[], &[0.0]).is_err());
        assert!(synthesize_samples(4, &[], &[f64::NAN]).is_err());
    }

    #[test]
    fn dash_means_stdout() {
        assert!(is_stdout(Path::new("-")));
        assert!(!is_stdout(Path::new("out.csv")));
    }
}
