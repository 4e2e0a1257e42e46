// src/processing/worker.rs
//! Serialized access to a pipeline from concurrent code
//!
//! [`SharedPipeline`] locks around each call; [`PipelineWorker`] gives the
//! pipeline its own thread and feeds it through a bounded command channel.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::error::{DspError, DspResult};
use crate::processing::pipeline::{HygienePipeline, PipelineStats, ProcessedSample};

/// Cloneable handle to a pipeline behind a mutex
///
/// The lock is held for exactly one call, so samples from different threads
/// are processed in whatever order they acquire it.
#[derive(Clone)]
pub struct SharedPipeline {
    inner: Arc<Mutex<HygienePipeline>>,
}

impl SharedPipeline {
    pub fn new(config: PipelineConfig) -> DspResult<Self> {
        Ok(Self::from_pipeline(HygienePipeline::new(config)?))
    }

    pub fn from_pipeline(pipeline: HygienePipeline) -> Self {
        Self {
            inner: Arc::new(Mutex::new(pipeline)),
        }
    }

    pub fn process(&self, sample: &[f64]) -> DspResult<ProcessedSample> {
        self.inner.lock().process(sample)
    }

    pub fn process_into(&self, sample: &mut [f64], flags: &mut [bool]) -> DspResult<()> {
        self.inner.lock().process_into(sample, flags)
    }

    pub fn get_stats(&self) -> PipelineStats {
        self.inner.lock().get_stats()
    }

    pub fn reset(&self) {
        self.inner.lock().reset();
    }

    /// Build a pipeline from `config` and swap it in
    ///
    /// The replacement is built outside the lock; on error the current
    /// pipeline stays in place.
    pub fn reconfigure(&self, config: PipelineConfig) -> DspResult<()> {
        let pipeline = HygienePipeline::new(config)?;
        *self.inner.lock() = pipeline;
        Ok(())
    }

    /// Run `f` with exclusive access to the pipeline
    pub fn with_pipeline<R>(&self, f: impl FnOnce(&mut HygienePipeline) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

/// Commands accepted by the worker thread
pub enum WorkerCommand {
    Sample(Vec<f64>),
    Reset,
    Stats(Sender<PipelineStats>),
    Reconfigure(PipelineConfig, Sender<DspResult<()>>),
    Shutdown,
}

/// Pipeline owned by a dedicated thread
///
/// Commands queue in a bounded channel, so `submit` blocks once the worker
/// falls `capacity` commands behind. Results are delivered in submission
/// order on an unbounded output channel; a caller that never drains it
/// grows that queue without limit.
pub struct PipelineWorker {
    commands: Sender<WorkerCommand>,
    output: Receiver<DspResult<ProcessedSample>>,
    handle: Option<JoinHandle<PipelineStats>>,
}

impl PipelineWorker {
    /// Build the pipeline and start the worker thread
    pub fn spawn(config: PipelineConfig, capacity: usize) -> DspResult<Self> {
        let pipeline = HygienePipeline::new(config)?;
        let (command_tx, command_rx) = channel::bounded(capacity.max(1));
        let (output_tx, output_rx) = channel::unbounded();

        let handle = thread::Builder::new()
            .name("eeg-hygiene-worker".to_string())
            .spawn(move || run_worker(pipeline, command_rx, output_tx))
            .map_err(|_| DspError::WorkerStopped)?;

        info!(capacity, "pipeline worker started");
        Ok(Self {
            commands: command_tx,
            output: output_rx,
            handle: Some(handle),
        })
    }

    /// Queue a raw sample; the result arrives on [`output`](Self::output)
    pub fn submit(&self, sample: Vec<f64>) -> DspResult<()> {
        self.send(WorkerCommand::Sample(sample))
    }

    /// Block until the next processed sample is available
    pub fn recv(&self) -> DspResult<ProcessedSample> {
        self.output.recv().map_err(|_| DspError::WorkerStopped)?
    }

    /// Next processed sample if one is ready
    pub fn try_recv(&self) -> Option<DspResult<ProcessedSample>> {
        self.output.try_recv().ok()
    }

    /// Output channel, for use with `crossbeam::select!`
    pub fn output(&self) -> &Receiver<DspResult<ProcessedSample>> {
        &self.output
    }

    pub fn reset(&self) -> DspResult<()> {
        self.send(WorkerCommand::Reset)
    }

    /// Statistics after every previously queued command has run
    pub fn stats(&self) -> DspResult<PipelineStats> {
        let (reply_tx, reply_rx) = channel::bounded(1);
        self.send(WorkerCommand::Stats(reply_tx))?;
        reply_rx.recv().map_err(|_| DspError::WorkerStopped)
    }

    /// Replace the pipeline between two samples
    ///
    /// The new pipeline is built on the worker thread. If building fails the
    /// old pipeline keeps running and the error is returned here.
    pub fn reconfigure(&self, config: PipelineConfig) -> DspResult<()> {
        let (reply_tx, reply_rx) = channel::bounded(1);
        self.send(WorkerCommand::Reconfigure(config, reply_tx))?;
        reply_rx.recv().map_err(|_| DspError::WorkerStopped)?
    }

    /// Stop the worker after queued commands and return its final statistics
    pub fn shutdown(mut self) -> DspResult<PipelineStats> {
        self.stop()
    }

    fn send(&self, command: WorkerCommand) -> DspResult<()> {
        self.commands.send(command).map_err(|_| DspError::WorkerStopped)
    }

    fn stop(&mut self) -> DspResult<PipelineStats> {
        let handle = self.handle.take().ok_or(DspError::WorkerStopped)?;
        // A dead worker has already dropped its receiver; join reports it
        let _ = self.commands.send(WorkerCommand::Shutdown);
        let stats = handle.join().map_err(|_| DspError::WorkerStopped)?;
        info!(total_samples = stats.total_samples, "pipeline worker stopped");
        Ok(stats)
    }
}

impl Drop for PipelineWorker {
    fn drop(&mut self) {
        if self.handle.is_some() {
            if let Err(e) = self.stop() {
                warn!(error = %e, "pipeline worker did not stop cleanly");
            }
        }
    }
}

fn run_worker(
    mut pipeline: HygienePipeline,
    commands: Receiver<WorkerCommand>,
    output: Sender<DspResult<ProcessedSample>>,
) -> PipelineStats {
    while let Ok(command) = commands.recv() {
        match command {
            WorkerCommand::Sample(sample) => {
                // Nobody listening is not a reason to stop filtering
                let _ = output.send(pipeline.process(&sample));
            }
            WorkerCommand::Reset => pipeline.reset(),
            WorkerCommand::Stats(reply) => {
                let _ = reply.send(pipeline.get_stats());
            }
            WorkerCommand::Reconfigure(config, reply) => {
                let result = HygienePipeline::new(config).map(|replacement| {
                    pipeline = replacement;
                });
                if let Err(e) = &result {
                    warn!(error = %e, "reconfiguration rejected, keeping current pipeline");
                }
                let _ = reply.send(result);
            }
            WorkerCommand::Shutdown => break,
        }
    }

    debug!("pipeline worker loop exited");
    pipeline.get_stats()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passthrough(num_channels: usize) -> PipelineConfig {
        PipelineConfig {
            num_channels,
            dc_block_enabled: false,
            notch_enabled: false,
            bandpass_enabled: false,
            artifact_enabled: false,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn test_shared_pipeline_across_threads() {
        let shared = SharedPipeline::new(PipelineConfig::default()).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for _ in 0..25 {
                        shared.process(&[1.0; 8]).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(shared.get_stats().total_samples, 100);
        shared.reset();
        assert_eq!(shared.get_stats().total_samples, 0);
    }

    #[test]
    fn test_shared_reconfigure_keeps_old_on_error() {
        let shared = SharedPipeline::new(passthrough(2)).unwrap();
        let mut bad = passthrough(2);
        bad.sample_rate = -1.0;

        assert!(shared.reconfigure(bad).is_err());
        assert_eq!(shared.with_pipeline(|p| p.num_channels()), 2);

        shared.reconfigure(passthrough(3)).unwrap();
        assert_eq!(shared.with_pipeline(|p| p.num_channels()), 3);
    }

    #[test]
    fn test_worker_preserves_order() {
        let worker = PipelineWorker::spawn(passthrough(1), 4).unwrap();
        let results = thread::scope(|scope| {
            let reader = scope.spawn(|| (0..20).map(|_| worker.recv().unwrap()).collect::<Vec<_>>());
            for i in 0..20 {
                worker.submit(vec![i as f64]).unwrap();
            }
            reader.join().unwrap()
        });

        for (i, processed) in results.iter().enumerate() {
            assert_eq!(processed.channels, vec![i as f64]);
        }

        let stats = worker.shutdown().unwrap();
        assert_eq!(stats.total_samples, 20);
    }

    #[test]
    fn test_worker_reports_channel_mismatch() {
        let worker = PipelineWorker::spawn(passthrough(2), 4).unwrap();
        worker.submit(vec![1.0]).unwrap();
        assert!(matches!(
            worker.recv(),
            Err(DspError::ChannelMismatch { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_worker_reconfigure() {
        let worker = PipelineWorker::spawn(passthrough(2), 4).unwrap();
        worker.submit(vec![1.0, 2.0]).unwrap();
        worker.recv().unwrap();

        let mut bad = passthrough(2);
        bad.num_channels = 0;
        assert!(worker.reconfigure(bad).is_err());
        assert_eq!(worker.stats().unwrap().total_samples, 1);

        worker.reconfigure(passthrough(3)).unwrap();
        assert_eq!(worker.stats().unwrap().total_samples, 0);
        worker.submit(vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(worker.recv().unwrap().channels.len(), 3);
    }

    #[test]
    fn test_worker_reset_and_stats() {
        let worker = PipelineWorker::spawn(PipelineConfig::default(), 8).unwrap();
        for _ in 0..5 {
            worker.submit(vec![0.0; 8]).unwrap();
        }
        assert_eq!(worker.stats().unwrap().total_samples, 5);

        worker.reset().unwrap();
        assert_eq!(worker.stats().unwrap().total_samples, 0);
    }
}
