//! Spectral diagnostics for checking filter attenuation
//!
//! Not part of the processing path; used by tests, demos and benchmarks to
//! confirm what a stage removed.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// Single-sided amplitude at `freq_hz`, taken from the nearest FFT bin
///
/// A sine of amplitude `A` whose frequency falls exactly on a bin reports
/// `A`. Returns 0 for an empty signal.
pub fn magnitude_at(signal: &[f64], freq_hz: f64, sample_rate: f64) -> f64 {
    let n = signal.len();
    if n == 0 {
        return 0.0;
    }

    let mut buffer: Vec<Complex<f64>> = signal.iter().map(|&x| Complex::new(x, 0.0)).collect();
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut buffer);

    let bin = ((freq_hz * n as f64 / sample_rate).round() as usize).min(n / 2);
    let scale = if bin == 0 || (n % 2 == 0 && bin == n / 2) { 1.0 } else { 2.0 };
    buffer[bin].norm() * scale / n as f64
}

/// Attenuation in dB at `freq_hz` from `input` to `output`, positive when reduced
pub fn attenuation_db(input: &[f64], output: &[f64], freq_hz: f64, sample_rate: f64) -> f64 {
    let before = magnitude_at(input, freq_hz, sample_rate);
    let after = magnitude_at(output, freq_hz, sample_rate);
    20.0 * (before / after.max(f64::MIN_POSITIVE)).log10()
}
