// src/processing/filters/smoother.rs
//! Exponential moving average smoothing

use super::{assert_width, Filter};
use crate::error::{DspErrorBuilder, DspResult};

/// Trailing exponential moving average, `ema = alpha * x + (1 - alpha) * ema`
///
/// The first sample seeds the accumulator and is returned unchanged.
pub struct ExponentialSmoother {
    alpha: f64,
    ema: Vec<f64>,
    initialized: bool,
}

impl ExponentialSmoother {
    pub fn new(alpha: f64, num_channels: usize) -> DspResult<Self> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(DspErrorBuilder::new("smoothing")
                .configuration(format!("alpha must be in (0, 1], got {}", alpha)));
        }

        Ok(Self {
            alpha,
            ema: vec![0.0; num_channels],
            initialized: false,
        })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

impl Filter for ExponentialSmoother {
    #[inline]
    fn process(&mut self, sample: &mut [f64]) {
        assert_width(self.ema.len(), sample);
        if !self.initialized {
            self.ema.copy_from_slice(sample);
            self.initialized = true;
            return;
        }

        for (x, ema) in sample.iter_mut().zip(self.ema.iter_mut()) {
            *ema = self.alpha * *x + (1.0 - self.alpha) * *ema;
            *x = *ema;
        }
    }

    fn reset(&mut self) {
        self.ema.fill(0.0);
        self.initialized = false;
    }

    fn name(&self) -> &str {
        "Smooth"
    }

    fn num_channels(&self) -> usize {
        self.ema.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_call_is_identity() {
        let mut smoother = ExponentialSmoother::new(0.3, 3).unwrap();
        let mut sample = [1.0, -2.0, 30.0];
        smoother.process(&mut sample);
        assert_eq!(sample, [1.0, -2.0, 30.0]);
    }

    #[test]
    fn test_ema_update() {
        let mut smoother = ExponentialSmoother::new(0.5, 1).unwrap();
        let mut sample = [0.0];
        smoother.process(&mut sample);
        let mut sample = [10.0];
        smoother.process(&mut sample);
        assert_eq!(sample[0], 5.0);
    }

    #[test]
    fn test_step_converges() {
        let alpha = 0.3;
        let mut smoother = ExponentialSmoother::new(alpha, 1).unwrap();
        let mut sample = [0.0];
        smoother.process(&mut sample);

        // (1 - alpha)^n < 0.01 well within 5 / alpha samples
        let steps = (5.0 / alpha) as usize;
        for _ in 0..steps {
            sample[0] = 1.0;
            smoother.process(&mut sample);
        }
        assert!((sample[0] - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_alpha_one_is_identity() {
        let mut smoother = ExponentialSmoother::new(1.0, 1).unwrap();
        for x in [3.0, -4.0, 8.5] {
            let mut sample = [x];
            smoother.process(&mut sample);
            assert_eq!(sample[0], x);
        }
    }

    #[test]
    #[should_panic(expected = "filter was built for 2")]
    fn test_wrong_width_panics() {
        let mut smoother = ExponentialSmoother::new(0.5, 2).unwrap();
        smoother.process(&mut [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_batch_matches_rows() {
        let mut batch = ExponentialSmoother::new(0.25, 2).unwrap();
        let mut single = ExponentialSmoother::new(0.25, 2).unwrap();
        let data = ndarray::Array2::from_shape_fn((20, 2), |(r, c)| (r as f64 * 0.7 + c as f64).cos() * 10.0);

        let out = batch.process_batch(data.view()).unwrap();
        for (i, row) in data.rows().into_iter().enumerate() {
            let mut sample = row.to_vec();
            single.process(&mut sample);
            assert_eq!(out.row(i).to_vec(), sample);
        }
    }

    #[test]
    fn test_rejects_alpha_out_of_range() {
        assert!(ExponentialSmoother::new(0.0, 1).is_err());
        assert!(ExponentialSmoother::new(1.5, 1).is_err());
    }

    #[test]
    fn test_reset_reseeds() {
        let mut smoother = ExponentialSmoother::new(0.1, 1).unwrap();
        let mut sample = [100.0];
        smoother.process(&mut sample);
        smoother.reset();
        let mut sample = [-7.0];
        smoother.process(&mut sample);
        assert_eq!(sample[0], -7.0);
    }
}
