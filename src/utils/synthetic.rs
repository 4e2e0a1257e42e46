//! Synthetic multichannel EEG source

use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Composition of the generated signal, all amplitudes in microvolts
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub sample_rate: f64,
    pub num_channels: usize,
    /// Alpha-band rhythm amplitude
    pub rhythm_amplitude: f64,
    pub rhythm_freq_hz: f64,
    pub powerline_amplitude: f64,
    pub powerline_freq_hz: f64,
    /// Electrode offset and drift
    pub drift_amplitude: f64,
    pub noise_std: f64,
    /// Chance per sample and channel of a large spike
    pub spike_probability: f64,
    pub spike_amplitude: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            sample_rate: 250.0,
            num_channels: 8,
            rhythm_amplitude: 20.0,
            rhythm_freq_hz: 10.0,
            powerline_amplitude: 15.0,
            powerline_freq_hz: 60.0,
            drift_amplitude: 40.0,
            noise_std: 3.0,
            spike_probability: 0.001,
            spike_amplitude: 200.0,
        }
    }
}

/// Deterministic EEG-like signal generator
///
/// Identical seeds give identical streams, which keeps tests and
/// benchmarks reproducible.
pub struct SyntheticEeg {
    config: SyntheticConfig,
    rng: StdRng,
    sample_index: u64,
    channel_phases: Vec<f64>,
}

impl SyntheticEeg {
    pub fn new(config: SyntheticConfig, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let channel_phases = (0..config.num_channels)
            .map(|_| rng.gen::<f64>() * 2.0 * PI)
            .collect();

        Self {
            config,
            rng,
            sample_index: 0,
            channel_phases,
        }
    }

    pub fn config(&self) -> &SyntheticConfig {
        &self.config
    }

    /// Generate the next sample into `out`
    pub fn fill_sample(&mut self, out: &mut [f64]) {
        let t = self.sample_index as f64 / self.config.sample_rate;
        let powerline = self.config.powerline_amplitude * (2.0 * PI * self.config.powerline_freq_hz * t).sin();
        // Slow sway on top of a per-channel offset
        let drift = self.config.drift_amplitude * (1.0 + 0.5 * (2.0 * PI * 0.05 * t).sin());

        for (ch, value) in out.iter_mut().enumerate().take(self.config.num_channels) {
            let phase = self.channel_phases[ch];
            let rhythm = self.config.rhythm_amplitude * (2.0 * PI * self.config.rhythm_freq_hz * t + phase).sin();
            let offset = drift * (1.0 + ch as f64 * 0.1);
            let noise = self.config.noise_std * self.gaussian();

            let mut sample = rhythm + powerline + offset + noise;
            if self.rng.gen::<f64>() < self.config.spike_probability {
                let sign = if self.rng.gen::<bool>() { 1.0 } else { -1.0 };
                sample += sign * self.config.spike_amplitude;
            }
            *value = sample;
        }

        self.sample_index += 1;
    }

    pub fn next_sample(&mut self) -> Vec<f64> {
        let mut sample = vec![0.0; self.config.num_channels];
        self.fill_sample(&mut sample);
        sample
    }

    /// `num_samples` rows of samples, row-major
    pub fn block(&mut self, num_samples: usize) -> ndarray::Array2<f64> {
        let mut block = ndarray::Array2::zeros((num_samples, self.config.num_channels));
        let mut row = vec![0.0; self.config.num_channels];
        for mut dst in block.rows_mut() {
            self.fill_sample(&mut row);
            for (d, s) in dst.iter_mut().zip(&row) {
                *d = *s;
            }
        }
        block
    }

    fn gaussian(&mut self) -> f64 {
        // Box-Muller transform; 1 - u keeps the log argument away from zero
        let u1 = 1.0 - self.rng.gen::<f64>();
        let u2 = self.rng.gen::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }
}
