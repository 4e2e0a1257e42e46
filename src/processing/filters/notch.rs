// src/processing/filters/notch.rs

// ================================================================================
// Powerline Notch Bank
// ================================================================================

use ndarray::{Array2, ArrayView2};
use tracing::{debug, warn};

use super::design::FilterSpec;
use super::iir::IirFilter;
use super::Filter;
use crate::error::DspResult;

/// Cascade of notches at a mains fundamental and its harmonics
///
/// Harmonics at or above Nyquist are skipped. If even the fundamental is out
/// of range the bank is empty and passes samples through untouched.
pub struct NotchFilterBank {
    frequencies: Vec<f64>,
    cascade: IirFilter,
}

impl NotchFilterBank {
    /// Notches at `fundamental_hz * k` for `k` in `1..=harmonics`
    pub fn new(
        fundamental_hz: f64,
        sample_rate: f64,
        harmonics: usize,
        q: f64,
        num_channels: usize,
    ) -> DspResult<Self> {
        let nyquist = sample_rate / 2.0;
        let mut frequencies = Vec::with_capacity(harmonics);
        let mut sections = Vec::with_capacity(harmonics);

        for harmonic in 1..=harmonics {
            let freq_hz = fundamental_hz * harmonic as f64;
            if freq_hz >= nyquist {
                debug!(freq_hz, nyquist, "skipping notch at or above Nyquist");
                continue;
            }
            sections.extend(FilterSpec::Notch { freq_hz, q }.design(sample_rate)?);
            frequencies.push(freq_hz);
            debug!(freq_hz, q, "added notch");
        }

        if frequencies.is_empty() {
            warn!(
                fundamental_hz,
                sample_rate, "no notch frequency below Nyquist, notch bank passes signal through"
            );
        }

        Ok(Self {
            frequencies,
            cascade: IirFilter::from_sections("Notch", sections, num_channels),
        })
    }

    /// Center frequencies actually notched, fundamental first
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }
}

impl Filter for NotchFilterBank {
    #[inline]
    fn process(&mut self, sample: &mut [f64]) {
        self.cascade.process(sample);
    }

    fn reset(&mut self) {
        self.cascade.reset();
    }

    fn name(&self) -> &str {
        "Notch"
    }

    fn num_channels(&self) -> usize {
        self.cascade.num_channels()
    }

    fn process_batch(&mut self, samples: ArrayView2<f64>) -> DspResult<Array2<f64>> {
        self.cascade.process_batch(samples)
    }
}
