// src/config/mod.rs
//! Pipeline configuration

pub mod constants;
pub mod loader;

pub use constants::*;
pub use loader::{ConfigError, ConfigLoader};

use serde::{Deserialize, Serialize};

use crate::error::{DspErrorBuilder, DspResult};

/// Immutable configuration snapshot for a [`HygienePipeline`](crate::processing::HygienePipeline)
///
/// The topology (which stages exist and how they are tuned) is fixed when
/// the pipeline is built from this snapshot. Changing any value means
/// building a new pipeline.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PipelineConfig {
    #[serde(default = "defaults::sample_rate")]
    pub sample_rate: f64,

    #[serde(default = "defaults::num_channels")]
    pub num_channels: usize,

    #[serde(default = "defaults::enabled")]
    pub dc_block_enabled: bool,

    #[serde(default = "defaults::dc_block_alpha")]
    pub dc_block_alpha: f64,

    #[serde(default = "defaults::enabled")]
    pub notch_enabled: bool,

    #[serde(default = "defaults::notch_freq")]
    pub notch_freq: f64,

    #[serde(default = "defaults::notch_harmonics")]
    pub notch_harmonics: usize,

    #[serde(default = "defaults::notch_q")]
    pub notch_q: f64,

    #[serde(default = "defaults::enabled")]
    pub bandpass_enabled: bool,

    /// Lower band edge in Hz; 0 turns the band filter into a lowpass
    #[serde(default = "defaults::highpass_freq")]
    pub highpass_freq: f64,

    /// Upper band edge in Hz; 0 turns the band filter into a highpass
    #[serde(default = "defaults::lowpass_freq")]
    pub lowpass_freq: f64,

    #[serde(default = "defaults::filter_order")]
    pub filter_order: usize,

    #[serde(default = "defaults::enabled")]
    pub artifact_enabled: bool,

    /// Microvolts; a value <= 0 leaves the rejector out of the pipeline
    #[serde(default = "defaults::artifact_threshold")]
    pub artifact_threshold: f64,

    #[serde(default = "defaults::artifact_blanking")]
    pub artifact_blanking: usize,

    #[serde(default)]
    pub car_enabled: bool,

    #[serde(default)]
    pub car_exclude_channels: Vec<usize>,

    #[serde(default)]
    pub smoothing_enabled: bool,

    #[serde(default = "defaults::smoothing_alpha")]
    pub smoothing_alpha: f64,
}

/// Which Butterworth response the band stage uses
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BandKind {
    Bandpass { low_hz: f64, high_hz: f64 },
    Highpass { cutoff_hz: f64 },
    Lowpass { cutoff_hz: f64 },
}

/// Default value providers using constants
mod defaults {
    use crate::config::constants::*;

    pub fn sample_rate() -> f64 { signal::DEFAULT_SAMPLE_RATE_HZ }
    pub fn num_channels() -> usize { signal::DEFAULT_CHANNEL_COUNT }
    pub fn enabled() -> bool { true }

    pub fn dc_block_alpha() -> f64 { dc_block::DEFAULT_ALPHA }

    pub fn notch_freq() -> f64 { notch::DEFAULT_FREQ_HZ }
    pub fn notch_harmonics() -> usize { notch::DEFAULT_HARMONICS }
    pub fn notch_q() -> f64 { notch::DEFAULT_Q }

    pub fn highpass_freq() -> f64 { band::DEFAULT_HIGHPASS_HZ }
    pub fn lowpass_freq() -> f64 { band::DEFAULT_LOWPASS_HZ }
    pub fn filter_order() -> usize { band::DEFAULT_ORDER }

    pub fn artifact_threshold() -> f64 { artifact::DEFAULT_THRESHOLD_UV }
    pub fn artifact_blanking() -> usize { artifact::DEFAULT_BLANKING_SAMPLES }

    pub fn smoothing_alpha() -> f64 { smoothing::DEFAULT_ALPHA }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_rate: defaults::sample_rate(),
            num_channels: defaults::num_channels(),
            dc_block_enabled: true,
            dc_block_alpha: defaults::dc_block_alpha(),
            notch_enabled: true,
            notch_freq: defaults::notch_freq(),
            notch_harmonics: defaults::notch_harmonics(),
            notch_q: defaults::notch_q(),
            bandpass_enabled: true,
            highpass_freq: defaults::highpass_freq(),
            lowpass_freq: defaults::lowpass_freq(),
            filter_order: defaults::filter_order(),
            artifact_enabled: true,
            artifact_threshold: defaults::artifact_threshold(),
            artifact_blanking: defaults::artifact_blanking(),
            car_enabled: false,
            car_exclude_channels: Vec::new(),
            smoothing_enabled: false,
            smoothing_alpha: defaults::smoothing_alpha(),
        }
    }
}

impl PipelineConfig {
    /// Defaults for a device at `sample_rate` with mains at `powerline_hz`
    pub fn for_powerline(sample_rate: f64, num_channels: usize, powerline_hz: f64) -> Self {
        Self {
            sample_rate,
            num_channels,
            notch_freq: powerline_hz,
            ..Self::default()
        }
    }

    /// Nyquist frequency in Hz
    pub fn nyquist(&self) -> f64 {
        self.sample_rate / 2.0
    }

    /// True when the rejector takes part in the pipeline
    pub fn artifact_active(&self) -> bool {
        self.artifact_enabled && self.artifact_threshold > 0.0
    }

    /// Band response implied by the two cutoffs
    pub fn band_kind(&self) -> DspResult<BandKind> {
        let hp = self.highpass_freq;
        let lp = self.lowpass_freq;
        match (hp > 0.0, lp > 0.0) {
            (true, true) => Ok(BandKind::Bandpass { low_hz: hp, high_hz: lp }),
            (true, false) => Ok(BandKind::Highpass { cutoff_hz: hp }),
            (false, true) => Ok(BandKind::Lowpass { cutoff_hz: lp }),
            (false, false) => Err(DspErrorBuilder::new("bandpass")
                .configuration("at least one of highpass_freq and lowpass_freq must be positive")),
        }
    }

    /// Reject anything that would make a stage ill-defined
    ///
    /// Only enabled stages are checked, so a disabled stage may carry
    /// placeholder values.
    pub fn validate(&self) -> DspResult<()> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(DspErrorBuilder::new("pipeline")
                .configuration(format!("sample_rate must be positive, got {}", self.sample_rate)));
        }
        if self.num_channels == 0 {
            return Err(DspErrorBuilder::new("pipeline")
                .configuration("num_channels must be at least 1"));
        }

        if self.dc_block_enabled && !(self.dc_block_alpha > 0.0 && self.dc_block_alpha < 1.0) {
            return Err(DspErrorBuilder::new("dc_block")
                .configuration(format!("alpha must be in (0, 1), got {}", self.dc_block_alpha)));
        }

        if self.notch_enabled {
            if !(self.notch_freq > 0.0) {
                return Err(DspErrorBuilder::new("notch")
                    .configuration(format!("notch_freq must be positive, got {}", self.notch_freq)));
            }
            if self.notch_harmonics == 0 {
                return Err(DspErrorBuilder::new("notch")
                    .configuration("notch_harmonics must be at least 1"));
            }
            if !(self.notch_q > 0.0) {
                return Err(DspErrorBuilder::new("notch")
                    .configuration(format!("notch_q must be positive, got {}", self.notch_q)));
            }
        }

        if self.bandpass_enabled {
            let nyquist = self.nyquist();
            if self.filter_order < band::MIN_ORDER || self.filter_order > band::MAX_ORDER {
                return Err(DspErrorBuilder::new("bandpass").configuration(format!(
                    "filter_order must be {}-{}, got {}",
                    band::MIN_ORDER, band::MAX_ORDER, self.filter_order
                )));
            }
            if self.highpass_freq < 0.0 || self.lowpass_freq < 0.0 {
                return Err(DspErrorBuilder::new("bandpass")
                    .configuration("cutoff frequencies cannot be negative"));
            }
            if self.highpass_freq >= nyquist {
                return Err(DspErrorBuilder::new("bandpass").configuration(format!(
                    "highpass_freq ({} Hz) must be below Nyquist ({} Hz)",
                    self.highpass_freq, nyquist
                )));
            }
            if self.lowpass_freq >= nyquist {
                return Err(DspErrorBuilder::new("bandpass").configuration(format!(
                    "lowpass_freq ({} Hz) must be below Nyquist ({} Hz)",
                    self.lowpass_freq, nyquist
                )));
            }
            if let BandKind::Bandpass { low_hz, high_hz } = self.band_kind()? {
                if low_hz >= high_hz {
                    return Err(DspErrorBuilder::new("bandpass").configuration(format!(
                        "highpass_freq ({} Hz) must be below lowpass_freq ({} Hz)",
                        low_hz, high_hz
                    )));
                }
            }
        }

        if self.smoothing_enabled && !(self.smoothing_alpha > 0.0 && self.smoothing_alpha <= 1.0) {
            return Err(DspErrorBuilder::new("smoothing")
                .configuration(format!("alpha must be in (0, 1], got {}", self.smoothing_alpha)));
        }

        Ok(())
    }
}
