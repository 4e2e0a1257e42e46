// src/processing/filters/mod.rs
//! Streaming filters for multichannel EEG samples
//!
//! Every filter works in place on one N-channel sample per call and keeps
//! whatever per-channel memory it needs between calls.

pub mod car;
pub mod dc_blocker;
pub mod smoother;

#[cfg(feature = "iir")]
pub mod design;
#[cfg(feature = "iir")]
pub mod iir;
#[cfg(feature = "iir")]
pub mod notch;

pub use car::CommonAverageReference;
pub use dc_blocker::DcBlocker;
pub use smoother::ExponentialSmoother;

#[cfg(feature = "iir")]
pub use design::{BiquadCoefficients, FilterSpec};
#[cfg(feature = "iir")]
pub use iir::IirFilter;
#[cfg(feature = "iir")]
pub use notch::NotchFilterBank;

use ndarray::{Array2, ArrayView2};

use crate::error::{check_channels, DspResult};

/// Shared capability of every filter stage
pub trait Filter {
    /// Filter one sample in place
    ///
    /// # Panics
    ///
    /// If `sample.len()` differs from [`num_channels`](Filter::num_channels).
    /// [`HygienePipeline`](crate::processing::HygienePipeline) checks widths
    /// and returns an error instead.
    fn process(&mut self, sample: &mut [f64]);

    /// Return to the freshly constructed state, keeping coefficients
    fn reset(&mut self);

    /// Display name used in pipeline statistics
    fn name(&self) -> &str;

    /// Channel count fixed at construction
    fn num_channels(&self) -> usize;

    /// Filter a block, rows are samples and columns channels
    ///
    /// Same result as calling [`process`](Filter::process) row by row, with
    /// state carried over between calls.
    fn process_batch(&mut self, samples: ArrayView2<f64>) -> DspResult<Array2<f64>> {
        check_channels(self.num_channels(), samples.ncols())?;

        let mut output = samples.to_owned();
        let mut row_buf = vec![0.0; samples.ncols()];
        for mut row in output.rows_mut() {
            for (dst, src) in row_buf.iter_mut().zip(row.iter()) {
                *dst = *src;
            }
            self.process(&mut row_buf);
            for (dst, src) in row.iter_mut().zip(&row_buf) {
                *dst = *src;
            }
        }
        Ok(output)
    }
}

/// Panic unless a per-sample call has the constructed width
#[inline]
pub(crate) fn assert_width(expected: usize, sample: &[f64]) {
    assert_eq!(
        sample.len(),
        expected,
        "sample has {} channels, filter was built for {}",
        sample.len(),
        expected
    );
}

/// Closed set of stages the pipeline can chain
pub enum FilterStage {
    DcBlock(DcBlocker),
    #[cfg(feature = "iir")]
    Notch(NotchFilterBank),
    #[cfg(feature = "iir")]
    Band(IirFilter),
    Car(CommonAverageReference),
    Smooth(ExponentialSmoother),
}

impl Filter for FilterStage {
    #[inline]
    fn process(&mut self, sample: &mut [f64]) {
        match self {
            FilterStage::DcBlock(f) => f.process(sample),
            #[cfg(feature = "iir")]
            FilterStage::Notch(f) => f.process(sample),
            #[cfg(feature = "iir")]
            FilterStage::Band(f) => f.process(sample),
            FilterStage::Car(f) => f.process(sample),
            FilterStage::Smooth(f) => f.process(sample),
        }
    }

    fn reset(&mut self) {
        match self {
            FilterStage::DcBlock(f) => f.reset(),
            #[cfg(feature = "iir")]
            FilterStage::Notch(f) => f.reset(),
            #[cfg(feature = "iir")]
            FilterStage::Band(f) => f.reset(),
            FilterStage::Car(f) => f.reset(),
            FilterStage::Smooth(f) => f.reset(),
        }
    }

    fn name(&self) -> &str {
        match self {
            FilterStage::DcBlock(f) => f.name(),
            #[cfg(feature = "iir")]
            FilterStage::Notch(f) => f.name(),
            #[cfg(feature = "iir")]
            FilterStage::Band(f) => f.name(),
            FilterStage::Car(f) => f.name(),
            FilterStage::Smooth(f) => f.name(),
        }
    }

    fn num_channels(&self) -> usize {
        match self {
            FilterStage::DcBlock(f) => f.num_channels(),
            #[cfg(feature = "iir")]
            FilterStage::Notch(f) => f.num_channels(),
            #[cfg(feature = "iir")]
            FilterStage::Band(f) => f.num_channels(),
            FilterStage::Car(f) => f.num_channels(),
            FilterStage::Smooth(f) => f.num_channels(),
        }
    }

    fn process_batch(&mut self, samples: ArrayView2<f64>) -> DspResult<Array2<f64>> {
        match self {
            FilterStage::DcBlock(f) => f.process_batch(samples),
            #[cfg(feature = "iir")]
            FilterStage::Notch(f) => f.process_batch(samples),
            #[cfg(feature = "iir")]
            FilterStage::Band(f) => f.process_batch(samples),
            FilterStage::Car(f) => f.process_batch(samples),
            FilterStage::Smooth(f) => f.process_batch(samples),
        }
    }
}
