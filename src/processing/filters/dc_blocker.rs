// src/processing/filters/dc_blocker.rs
//! First-order DC blocking filter

use std::f64::consts::PI;

use super::{assert_width, Filter};
use crate::error::{DspErrorBuilder, DspResult};

/// Removes electrode drift with `y[n] = x[n] - x[n-1] + alpha * y[n-1]`
///
/// The -3 dB corner sits near `fs * (1 - alpha) / (2 * pi)`, so the default
/// alpha of 0.995 at 250 Hz gives roughly 0.2 Hz.
pub struct DcBlocker {
    alpha: f64,
    prev_input: Vec<f64>,
    prev_output: Vec<f64>,
}

impl DcBlocker {
    pub fn new(alpha: f64, num_channels: usize) -> DspResult<Self> {
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(DspErrorBuilder::new("dc_block")
                .configuration(format!("alpha must be in (0, 1), got {}", alpha)));
        }

        Ok(Self {
            alpha,
            prev_input: vec![0.0; num_channels],
            prev_output: vec![0.0; num_channels],
        })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Approximate -3 dB cutoff in Hz
    pub fn cutoff_hz(&self, sample_rate: f64) -> f64 {
        sample_rate * (1.0 - self.alpha) / (2.0 * PI)
    }
}

impl Filter for DcBlocker {
    #[inline]
    fn process(&mut self, sample: &mut [f64]) {
        assert_width(self.prev_input.len(), sample);
        for ((x, x_prev), y_prev) in sample
            .iter_mut()
            .zip(self.prev_input.iter_mut())
            .zip(self.prev_output.iter_mut())
        {
            let y = *x - *x_prev + self.alpha * *y_prev;
            *x_prev = *x;
            *y_prev = y;
            *x = y;
        }
    }

    fn reset(&mut self) {
        self.prev_input.fill(0.0);
        self.prev_output.fill(0.0);
    }

    fn name(&self) -> &str {
        "DC Block"
    }

    fn num_channels(&self) -> usize {
        self.prev_input.len()
    }
}
