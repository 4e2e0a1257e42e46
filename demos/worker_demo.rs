//! Feed a pipeline worker from an acquisition thread and swap its
//! configuration mid-stream.

use std::thread;
use std::time::Duration;

use eeg_hygiene::utils::{SyntheticConfig, SyntheticEeg};
use eeg_hygiene::{PipelineConfig, PipelineWorker};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    let config = PipelineConfig::for_powerline(250.0, 4, 60.0);
    let worker = PipelineWorker::spawn(config.clone(), 64)?;

    let mut source = SyntheticEeg::new(
        SyntheticConfig {
            num_channels: 4,
            spike_probability: 0.005,
            ..SyntheticConfig::default()
        },
        7,
    );

    thread::scope(|scope| -> Result<(), Box<dyn std::error::Error>> {
        let consumer = scope.spawn(|| {
            let mut received = 0usize;
            let mut flagged = 0usize;
            while let Ok(result) = worker.output().recv_timeout(Duration::from_millis(200)) {
                if let Ok(processed) = result {
                    received += 1;
                    flagged += processed.artifact_flags.iter().filter(|&&f| f).count();
                }
            }
            (received, flagged)
        });

        for _ in 0..500 {
            worker.submit(source.next_sample())?;
        }

        // Invalid: the old pipeline keeps running
        let broken = PipelineConfig {
            lowpass_freq: 200.0,
            ..config.clone()
        };
        if let Err(e) = worker.reconfigure(broken) {
            println!("reconfiguration rejected: {}", e);
        }

        worker.reconfigure(PipelineConfig {
            car_enabled: true,
            smoothing_enabled: true,
            ..config.clone()
        })?;
        println!("after reconfigure: {:?}", worker.stats()?.filter_chain);

        for _ in 0..500 {
            worker.submit(source.next_sample())?;
        }

        let (received, flagged) = consumer.join().map_err(|_| "consumer panicked")?;
        println!("received {} samples, {} channel flags", received, flagged);
        Ok(())
    })?;

    let stats = worker.shutdown()?;
    println!("{}", serde_json::to_string(&stats)?);
    Ok(())
}
