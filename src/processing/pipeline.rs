// src/processing/pipeline.rs
//! Real-time hygiene pipeline orchestrating the filter stages

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
#[cfg(not(feature = "iir"))]
use tracing::warn;

use crate::config::{ConfigLoader, PipelineConfig};
use crate::error::{check_channels, DspResult};
use crate::processing::artifact::ArtifactRejector;
use crate::processing::filters::{
    CommonAverageReference, DcBlocker, ExponentialSmoother, Filter, FilterStage,
};
#[cfg(feature = "iir")]
use crate::processing::filters::{IirFilter, NotchFilterBank};
#[cfg(feature = "iir")]
use crate::config::BandKind;

/// Cleaned sample with one artifact flag per channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedSample {
    pub channels: Vec<f64>,
    pub artifact_flags: Vec<bool>,
}

/// Snapshot of the pipeline topology and artifact counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineStats {
    pub num_filters: usize,
    pub filter_chain: Vec<String>,
    /// `None` when artifact rejection is not part of the pipeline
    pub artifact_rate_percent: Option<f64>,
    pub total_samples: u64,
}

/// Real-time signal hygiene pipeline
///
/// Built once from a validated [`PipelineConfig`]. Samples flow through the
/// enabled filter stages in the order DC block, notch bank, band filter,
/// CAR, smoothing; artifact rejection then runs on the fully filtered
/// signal. Samples must arrive in temporal order from a single caller.
///
/// NaN and infinite inputs are not sanitized and propagate through the
/// filter state.
pub struct HygienePipeline {
    config: PipelineConfig,
    stages: Vec<FilterStage>,
    artifact_rejector: Option<ArtifactRejector>,
    total_samples: u64,
}

impl HygienePipeline {
    pub fn new(config: PipelineConfig) -> DspResult<Self> {
        config.validate()?;

        let stages = build_stages(&config)?;

        let artifact_rejector = if config.artifact_active() {
            debug!(
                threshold_uv = config.artifact_threshold,
                blanking = config.artifact_blanking,
                "artifact rejection enabled"
            );
            Some(ArtifactRejector::new(
                config.artifact_threshold,
                config.artifact_blanking,
                config.num_channels,
            ))
        } else {
            None
        };

        let chain: Vec<&str> = stages.iter().map(|s| s.name()).collect();
        info!(
            sample_rate = config.sample_rate,
            num_channels = config.num_channels,
            chain = %chain.join(" -> "),
            artifact_flagging = artifact_rejector.is_some(),
            "hygiene pipeline built"
        );

        Ok(Self {
            config,
            stages,
            artifact_rejector,
            total_samples: 0,
        })
    }

    /// Build from whatever configuration `loader` resolves
    pub fn from_loader(loader: &ConfigLoader) -> DspResult<Self> {
        let config = loader.load()?;
        Self::new(config)
    }

    /// Clean one sample
    pub fn process(&mut self, sample: &[f64]) -> DspResult<ProcessedSample> {
        let mut channels = sample.to_vec();
        let mut artifact_flags = vec![false; sample.len()];
        self.process_into(&mut channels, &mut artifact_flags)?;
        Ok(ProcessedSample {
            channels,
            artifact_flags,
        })
    }

    /// Clean `sample` in place and fill `flags`, without allocating
    pub fn process_into(&mut self, sample: &mut [f64], flags: &mut [bool]) -> DspResult<()> {
        check_channels(self.config.num_channels, sample.len())?;
        check_channels(self.config.num_channels, flags.len())?;

        for stage in &mut self.stages {
            stage.process(sample);
        }

        match &mut self.artifact_rejector {
            Some(rejector) => rejector.process(sample, flags),
            None => flags.fill(false),
        }

        self.total_samples += 1;
        Ok(())
    }

    /// Clean a block of samples, rows are samples and columns channels
    ///
    /// Identical to calling [`process`](Self::process) row by row.
    pub fn process_batch(&mut self, samples: ArrayView2<f64>) -> DspResult<(Array2<f64>, Array2<bool>)> {
        check_channels(self.config.num_channels, samples.ncols())?;

        let mut output = samples.to_owned();
        let mut flags = Array2::from_elem(samples.dim(), false);
        let mut row_buf = vec![0.0; self.config.num_channels];
        let mut flag_buf = vec![false; self.config.num_channels];

        for (mut out_row, mut flag_row) in output.rows_mut().into_iter().zip(flags.rows_mut()) {
            for (dst, src) in row_buf.iter_mut().zip(out_row.iter()) {
                *dst = *src;
            }
            self.process_into(&mut row_buf, &mut flag_buf)?;
            for (dst, src) in out_row.iter_mut().zip(&row_buf) {
                *dst = *src;
            }
            for (dst, src) in flag_row.iter_mut().zip(&flag_buf) {
                *dst = *src;
            }
        }

        Ok((output, flags))
    }

    pub fn get_stats(&self) -> PipelineStats {
        PipelineStats {
            num_filters: self.stages.len(),
            filter_chain: self.stages.iter().map(|s| s.name().to_string()).collect(),
            artifact_rate_percent: self
                .artifact_rejector
                .as_ref()
                .map(ArtifactRejector::artifact_rate_percent),
            total_samples: self.total_samples,
        }
    }

    /// Clear every stage's state and the counters, keeping coefficients
    pub fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.reset();
        }
        if let Some(rejector) = &mut self.artifact_rejector {
            rejector.reset();
        }
        self.total_samples = 0;
        debug!("hygiene pipeline reset");
    }

    pub fn num_channels(&self) -> usize {
        self.config.num_channels
    }

    pub fn sample_rate(&self) -> f64 {
        self.config.sample_rate
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn artifact_rejector(&self) -> Option<&ArtifactRejector> {
        self.artifact_rejector.as_ref()
    }
}

fn build_stages(config: &PipelineConfig) -> DspResult<Vec<FilterStage>> {
    let n = config.num_channels;
    let mut stages = Vec::new();

    if config.dc_block_enabled {
        let blocker = DcBlocker::new(config.dc_block_alpha, n)?;
        debug!(
            alpha = config.dc_block_alpha,
            cutoff_hz = blocker.cutoff_hz(config.sample_rate),
            "DC blocker stage"
        );
        stages.push(FilterStage::DcBlock(blocker));
    }

    push_iir_stages(config, &mut stages)?;

    if config.car_enabled {
        let car = CommonAverageReference::new(n, &config.car_exclude_channels);
        debug!(included = car.num_included(), "CAR stage");
        stages.push(FilterStage::Car(car));
    }

    if config.smoothing_enabled {
        debug!(alpha = config.smoothing_alpha, "smoothing stage");
        stages.push(FilterStage::Smooth(ExponentialSmoother::new(config.smoothing_alpha, n)?));
    }

    Ok(stages)
}

#[cfg(feature = "iir")]
fn push_iir_stages(config: &PipelineConfig, stages: &mut Vec<FilterStage>) -> DspResult<()> {
    let n = config.num_channels;
    let fs = config.sample_rate;

    if config.notch_enabled {
        let bank = NotchFilterBank::new(config.notch_freq, fs, config.notch_harmonics, config.notch_q, n)?;
        debug!(frequencies = ?bank.frequencies(), q = config.notch_q, "notch stage");
        stages.push(FilterStage::Notch(bank));
    }

    if config.bandpass_enabled {
        let order = config.filter_order;
        let filter = match config.band_kind()? {
            BandKind::Bandpass { low_hz, high_hz } => IirFilter::bandpass(low_hz, high_hz, fs, order, n)?,
            BandKind::Highpass { cutoff_hz } => IirFilter::highpass(cutoff_hz, fs, order, n)?,
            BandKind::Lowpass { cutoff_hz } => IirFilter::lowpass(cutoff_hz, fs, order, n)?,
        };
        debug!(
            kind = filter.name(),
            order,
            sections = filter.num_sections(),
            "band stage"
        );
        stages.push(FilterStage::Band(filter));
    }

    Ok(())
}

#[cfg(not(feature = "iir"))]
fn push_iir_stages(config: &PipelineConfig, _stages: &mut Vec<FilterStage>) -> DspResult<()> {
    if config.notch_enabled || config.bandpass_enabled {
        warn!("built without the `iir` feature, skipping notch and band filters");
    }
    Ok(())
}
