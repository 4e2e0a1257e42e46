// tests/pipeline_integration.rs
#[cfg(feature = "iir")]
use std::f64::consts::PI;
use std::io::Write;

#[cfg(feature = "iir")]
use eeg_hygiene::utils::magnitude_at;
use eeg_hygiene::utils::{SyntheticConfig, SyntheticEeg};
use eeg_hygiene::{
    ConfigLoader, DspError, HygienePipeline, PipelineConfig, PipelineStats, PipelineWorker,
    SharedPipeline,
};
use ndarray::Array2;
use tempfile::NamedTempFile;

fn filters_off(num_channels: usize) -> PipelineConfig {
    PipelineConfig {
        num_channels,
        dc_block_enabled: false,
        notch_enabled: false,
        bandpass_enabled: false,
        artifact_enabled: false,
        ..PipelineConfig::default()
    }
}

#[cfg(feature = "iir")]
#[test]
fn test_powerline_removed_end_to_end() {
    let fs = 250.0;
    let config = PipelineConfig {
        sample_rate: fs,
        num_channels: 1,
        ..PipelineConfig::default()
    };
    let mut pipeline = HygienePipeline::new(config).unwrap();

    let n = (4.0 * fs) as usize;
    let mut output = Vec::with_capacity(n);
    for i in 0..n {
        let t = i as f64 / fs;
        let x = 30.0 * (2.0 * PI * 10.0 * t).sin() + 20.0 * (2.0 * PI * 60.0 * t).sin();
        let processed = pipeline.process(&[x]).unwrap();
        output.push(processed.channels[0]);
    }

    let settled = &output[n / 2..];
    let alpha = magnitude_at(settled, 10.0, fs);
    let line = magnitude_at(settled, 60.0, fs);
    assert!(line < 0.1 * alpha, "60 Hz {:.3} vs 10 Hz {:.3}", line, alpha);
    assert!(alpha > 25.0, "10 Hz component lost: {:.3}", alpha);
}

#[test]
fn test_artifact_rate_ten_percent() {
    let config = PipelineConfig {
        artifact_enabled: true,
        artifact_threshold: 100.0,
        artifact_blanking: 0,
        ..filters_off(1)
    };
    let mut pipeline = HygienePipeline::new(config).unwrap();

    for i in 0..100 {
        let value = if i % 10 == 0 { 150.0 } else { 50.0 };
        let processed = pipeline.process(&[value]).unwrap();
        assert_eq!(processed.artifact_flags[0], i % 10 == 0);
    }

    let rate = pipeline.get_stats().artifact_rate_percent.unwrap();
    assert!((rate - 10.0).abs() <= 1.0, "rate was {}", rate);
}

#[test]
fn test_batch_matches_single_calls() {
    let config = PipelineConfig {
        car_enabled: true,
        car_exclude_channels: vec![3],
        smoothing_enabled: true,
        ..PipelineConfig::default()
    };
    let mut batch = HygienePipeline::new(config.clone()).unwrap();
    let mut single = HygienePipeline::new(config).unwrap();

    let mut source = SyntheticEeg::new(SyntheticConfig::default(), 11);
    let block = source.block(750);

    let (out, flags) = batch.process_batch(block.view()).unwrap();
    assert_eq!(out.dim(), (750, 8));

    for (i, row) in block.rows().into_iter().enumerate() {
        let expected = single.process(row.as_slice().unwrap()).unwrap();
        for ch in 0..8 {
            assert!((out[[i, ch]] - expected.channels[ch]).abs() < 1e-10);
            assert_eq!(flags[[i, ch]], expected.artifact_flags[ch]);
        }
    }

    assert_eq!(batch.get_stats(), single.get_stats());
}

#[test]
fn test_batch_rejects_wrong_width() {
    let mut pipeline = HygienePipeline::new(filters_off(4)).unwrap();
    let block = Array2::<f64>::zeros((10, 3));
    assert!(matches!(
        pipeline.process_batch(block.view()),
        Err(DspError::ChannelMismatch { expected: 4, actual: 3 })
    ));
}

#[test]
fn test_synthetic_spikes_flagged() {
    let config = PipelineConfig {
        num_channels: 4,
        ..PipelineConfig::default()
    };
    let mut pipeline = HygienePipeline::new(config).unwrap();
    let mut source = SyntheticEeg::new(
        SyntheticConfig {
            num_channels: 4,
            spike_probability: 0.01,
            spike_amplitude: 400.0,
            ..SyntheticConfig::default()
        },
        3,
    );

    let mut flagged = 0;
    for _ in 0..5000 {
        let processed = pipeline.process(&source.next_sample()).unwrap();
        flagged += processed.artifact_flags.iter().filter(|&&f| f).count();
    }

    assert!(flagged > 0);
    let rate = pipeline.get_stats().artifact_rate_percent.unwrap();
    assert!(rate > 0.0 && rate < 50.0, "rate was {}", rate);
}

#[test]
fn test_stats_serialize_for_transport() {
    let mut pipeline = HygienePipeline::new(PipelineConfig::default()).unwrap();
    pipeline.process(&[0.0; 8]).unwrap();

    let json = serde_json::to_string(&pipeline.get_stats()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["total_samples"], 1);
    assert_eq!(parsed["filter_chain"][0], "DC Block");
    assert_eq!(parsed["artifact_rate_percent"], 0.0);

    let back: PipelineStats = serde_json::from_str(&json).unwrap();
    assert_eq!(back, pipeline.get_stats());
}

#[test]
fn test_pipeline_from_config_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "num_channels = 2\nnotch_enabled = false\nbandpass_enabled = false\ncar_enabled = true"
    )
    .unwrap();

    let loader = ConfigLoader::with_paths(vec![file.path().to_path_buf()]).with_env_prefix("EEGITEST_");
    let pipeline = HygienePipeline::from_loader(&loader).unwrap();
    assert_eq!(pipeline.num_channels(), 2);
    assert_eq!(pipeline.get_stats().filter_chain, vec!["DC Block", "CAR"]);
}

#[test]
fn test_invalid_config_file_surfaces_as_config_error() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "dc_block_alpha = 1.5").unwrap();

    let loader = ConfigLoader::with_paths(vec![file.path().to_path_buf()]).with_env_prefix("EEGITEST_");
    assert!(matches!(
        HygienePipeline::from_loader(&loader),
        Err(DspError::Config(_))
    ));
}

#[test]
fn test_shared_pipeline_matches_owned() {
    let shared = SharedPipeline::new(PipelineConfig::default()).unwrap();
    let mut owned = HygienePipeline::new(PipelineConfig::default()).unwrap();
    let mut source = SyntheticEeg::new(SyntheticConfig::default(), 5);

    for _ in 0..200 {
        let sample = source.next_sample();
        assert_eq!(shared.process(&sample).unwrap(), owned.process(&sample).unwrap());
    }
}

#[test]
fn test_worker_matches_owned_pipeline() {
    let config = PipelineConfig::default();
    let worker = PipelineWorker::spawn(config.clone(), 16).unwrap();
    let mut owned = HygienePipeline::new(config).unwrap();
    let mut source = SyntheticEeg::new(SyntheticConfig::default(), 9);

    for _ in 0..100 {
        let sample = source.next_sample();
        worker.submit(sample.clone()).unwrap();
        assert_eq!(worker.recv().unwrap(), owned.process(&sample).unwrap());
    }

    let stats = worker.shutdown().unwrap();
    assert_eq!(stats, owned.get_stats());
}
