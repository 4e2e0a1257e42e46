// src/processing/artifact.rs
//! Amplitude-threshold artifact rejection

/// Per-channel threshold detector with a blanking hold
///
/// A channel whose absolute value exceeds the threshold is replaced by its
/// last accepted value and stays held for `blanking_samples` further samples,
/// flagged throughout. Each channel runs its own state machine; the artifact
/// counter counts newly detected events, not held samples.
///
/// NaN never exceeds the threshold, so it is accepted and passed on.
pub struct ArtifactRejector {
    threshold: f64,
    blanking_samples: usize,
    blanking_remaining: Vec<usize>,
    last_good: Vec<f64>,
    artifact_count: u64,
    total_samples: u64,
}

impl ArtifactRejector {
    pub fn new(threshold: f64, blanking_samples: usize, num_channels: usize) -> Self {
        Self {
            threshold,
            blanking_samples,
            blanking_remaining: vec![0; num_channels],
            last_good: vec![0.0; num_channels],
            artifact_count: 0,
            total_samples: 0,
        }
    }

    /// Clean `sample` in place and write one flag per channel into `flags`
    ///
    /// # Panics
    ///
    /// If either slice is not `num_channels` wide.
    pub fn process(&mut self, sample: &mut [f64], flags: &mut [bool]) {
        assert_eq!(sample.len(), self.last_good.len(), "sample width differs from rejector channel count");
        assert_eq!(flags.len(), self.last_good.len(), "flag width differs from rejector channel count");
        self.total_samples += 1;

        for (((value, flag), remaining), last_good) in sample
            .iter_mut()
            .zip(flags.iter_mut())
            .zip(self.blanking_remaining.iter_mut())
            .zip(self.last_good.iter_mut())
        {
            if *remaining > 0 {
                *value = *last_good;
                *remaining -= 1;
                *flag = true;
            } else if value.abs() > self.threshold {
                *value = *last_good;
                *remaining = self.blanking_samples;
                *flag = true;
                self.artifact_count += 1;
            } else {
                *last_good = *value;
                *flag = false;
            }
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn blanking_samples(&self) -> usize {
        self.blanking_samples
    }

    pub fn artifact_count(&self) -> u64 {
        self.artifact_count
    }

    pub fn total_samples(&self) -> u64 {
        self.total_samples
    }

    /// Detected artifact events per processed sample, in percent
    ///
    /// Events are counted per channel while samples are counted once per
    /// call, so with several channels the rate is not bounded by 100: eight
    /// channels over threshold on every sample with no blanking report 800.
    /// Divide by the channel count for a per-channel-sample fraction.
    pub fn artifact_rate_percent(&self) -> f64 {
        if self.total_samples == 0 {
            return 0.0;
        }
        self.artifact_count as f64 / self.total_samples as f64 * 100.0
    }

    pub fn reset(&mut self) {
        self.blanking_remaining.fill(0);
        self.last_good.fill(0.0);
        self.artifact_count = 0;
        self.total_samples = 0;
    }
}
