// src/processing/filters/car.rs
//! Common average reference

use tracing::debug;

use super::{assert_width, Filter};

/// Spatial filter subtracting the mean of the included channels from every channel
///
/// Excluded channels do not contribute to the mean but are still
/// re-referenced. With every channel excluded the input is left unchanged.
pub struct CommonAverageReference {
    included: Vec<bool>,
    num_included: usize,
}

impl CommonAverageReference {
    /// Build the exclusion mask; indices outside `0..num_channels` are ignored
    pub fn new(num_channels: usize, exclude_channels: &[usize]) -> Self {
        let mut included = vec![true; num_channels];
        for &channel in exclude_channels {
            match included.get_mut(channel) {
                Some(slot) => *slot = false,
                None => debug!(channel, num_channels, "ignoring out-of-range CAR exclusion"),
            }
        }
        let num_included = included.iter().filter(|&&inc| inc).count();

        Self {
            included,
            num_included,
        }
    }

    /// Channels contributing to the reference
    pub fn num_included(&self) -> usize {
        self.num_included
    }

    pub fn is_excluded(&self, channel: usize) -> bool {
        !self.included.get(channel).copied().unwrap_or(true)
    }
}

impl Filter for CommonAverageReference {
    #[inline]
    fn process(&mut self, sample: &mut [f64]) {
        assert_width(self.included.len(), sample);
        if self.num_included == 0 {
            return;
        }

        let sum: f64 = sample
            .iter()
            .zip(&self.included)
            .filter(|(_, inc)| **inc)
            .map(|(v, _)| *v)
            .sum();
        let mean = sum / self.num_included as f64;

        for value in sample.iter_mut() {
            *value -= mean;
        }
    }

    fn reset(&mut self) {}

    fn name(&self) -> &str {
        "CAR"
    }

    fn num_channels(&self) -> usize {
        self.included.len()
    }
}
