//! Clean a synthetic EEG stream and report how much powerline survived
//!
//! Run with `cargo run --example basic_usage`. Set `RUST_LOG=debug` to see
//! every stage as it is built.

use eeg_hygiene::utils::{attenuation_db, SyntheticConfig, SyntheticEeg};
use eeg_hygiene::{ConfigLoader, HygienePipeline, PipelineConfig};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Picks up eeg_hygiene.toml / eeg_hygiene.local.toml and EEG_* overrides if present
    let config = match ConfigLoader::new().load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "falling back to default configuration");
            PipelineConfig::default()
        }
    };

    let sample_rate = config.sample_rate;
    let num_channels = config.num_channels;
    let powerline_hz = config.notch_freq;
    let mut pipeline = HygienePipeline::new(config)?;

    let mut source = SyntheticEeg::new(
        SyntheticConfig {
            sample_rate,
            num_channels,
            powerline_freq_hz: powerline_hz,
            ..SyntheticConfig::default()
        },
        2024,
    );

    let seconds = 8;
    let block = source.block(seconds * sample_rate as usize);
    let (cleaned, flags) = pipeline.process_batch(block.view())?;

    // Skip the first half while the filters settle
    let start = block.nrows() / 2;
    for ch in 0..num_channels {
        let raw: Vec<f64> = block.column(ch).iter().skip(start).copied().collect();
        let out: Vec<f64> = cleaned.column(ch).iter().skip(start).copied().collect();
        let flagged = flags.column(ch).iter().filter(|&&f| f).count();
        println!(
            "ch{:<2} powerline attenuation {:6.1} dB, {} samples flagged",
            ch,
            attenuation_db(&raw, &out, powerline_hz, sample_rate),
            flagged
        );
    }

    println!("{}", serde_json::to_string_pretty(&pipeline.get_stats())?);
    Ok(())
}
