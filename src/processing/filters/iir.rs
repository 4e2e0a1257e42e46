// src/processing/filters/iir.rs
//! Multichannel IIR filter built from cascaded biquads

use ndarray::{Array2, ArrayView2, Axis};
use tracing::debug;

use super::design::{BiquadCoefficients, FilterSpec};
use super::{assert_width, Filter};
use crate::error::{check_channels, DspResult};

/// IIR filter applying one cascade of second-order sections to every channel
///
/// Coefficients are shared by all channels; each channel owns a two-element
/// delay line per section. State is laid out as `channel * sections + section`
/// and sized once at construction.
pub struct IirFilter {
    name: &'static str,
    sections: Vec<BiquadCoefficients>,
    state: Vec<[f64; 2]>,
    num_channels: usize,
}

impl IirFilter {
    /// Design `spec` for `sample_rate` and allocate state for `num_channels`
    pub fn design(spec: FilterSpec, sample_rate: f64, num_channels: usize) -> DspResult<Self> {
        let sections = spec.design(sample_rate)?;
        debug!(
            filter = spec.name(),
            sections = sections.len(),
            num_channels,
            "designed IIR filter"
        );
        Ok(Self::from_sections(spec.name(), sections, num_channels))
    }

    /// Butterworth bandpass between `low_hz` and `high_hz`
    pub fn bandpass(low_hz: f64, high_hz: f64, sample_rate: f64, order: usize, num_channels: usize) -> DspResult<Self> {
        Self::design(FilterSpec::Bandpass { order, low_hz, high_hz }, sample_rate, num_channels)
    }

    /// Butterworth highpass
    pub fn highpass(cutoff_hz: f64, sample_rate: f64, order: usize, num_channels: usize) -> DspResult<Self> {
        Self::design(FilterSpec::Highpass { order, cutoff_hz }, sample_rate, num_channels)
    }

    /// Butterworth lowpass
    pub fn lowpass(cutoff_hz: f64, sample_rate: f64, order: usize, num_channels: usize) -> DspResult<Self> {
        Self::design(FilterSpec::Lowpass { order, cutoff_hz }, sample_rate, num_channels)
    }

    /// Single notch at `freq_hz`
    pub fn notch(freq_hz: f64, sample_rate: f64, q: f64, num_channels: usize) -> DspResult<Self> {
        Self::design(FilterSpec::Notch { freq_hz, q }, sample_rate, num_channels)
    }

    /// Filter from precomputed sections
    pub fn from_sections(name: &'static str, sections: Vec<BiquadCoefficients>, num_channels: usize) -> Self {
        let state = vec![[0.0; 2]; num_channels * sections.len()];
        Self {
            name,
            sections,
            state,
            num_channels,
        }
    }

    pub fn sections(&self) -> &[BiquadCoefficients] {
        &self.sections
    }

    pub fn num_sections(&self) -> usize {
        self.sections.len()
    }

    /// Run one channel value through its cascade (transposed direct form II)
    #[inline]
    fn filter_channel(&mut self, channel: usize, input: f64) -> f64 {
        let n = self.sections.len();
        let state = &mut self.state[channel * n..(channel + 1) * n];

        let mut x = input;
        for (c, z) in self.sections.iter().zip(state.iter_mut()) {
            let y = c.b0 * x + z[0];
            z[0] = c.b1 * x - c.a1 * y + z[1];
            z[1] = c.b2 * x - c.a2 * y;
            x = y;
        }
        x
    }
}

impl Filter for IirFilter {
    fn process(&mut self, sample: &mut [f64]) {
        assert_width(self.num_channels, sample);
        for (channel, value) in sample.iter_mut().enumerate() {
            *value = self.filter_channel(channel, *value);
        }
    }

    fn reset(&mut self) {
        self.state.fill([0.0; 2]);
    }

    fn name(&self) -> &str {
        self.name
    }

    fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Runs channel by channel; channels share no state, so this matches
    /// row-by-row processing exactly
    fn process_batch(&mut self, samples: ArrayView2<f64>) -> DspResult<Array2<f64>> {
        check_channels(self.num_channels, samples.ncols())?;

        let mut output = samples.to_owned();
        for (channel, mut column) in output.axis_iter_mut(Axis(1)).enumerate() {
            for value in column.iter_mut() {
                *value = self.filter_channel(channel, *value);
            }
        }
        Ok(output)
    }
}
