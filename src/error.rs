// src/error.rs
//! Unified error handling for the hygiene pipeline
//!
//! Every fallible operation in the crate returns [`DspResult`]. Configuration
//! problems are caught when a stage or pipeline is constructed, so nothing in
//! the per-sample path fails except a caller handing over a vector of the
//! wrong width.

use thiserror::Error;

use crate::config::loader::ConfigError;

/// Unified error type for the hygiene pipeline
#[derive(Debug, Error)]
pub enum DspError {
    /// Invalid parameters detected while building a stage or pipeline
    #[error("[CONFIG] Configuration error in {component}: {reason}")]
    Configuration {
        /// Stage or config section that rejected the value
        component: String,
        /// Human readable reason
        reason: String,
    },

    /// A sample vector did not have the channel count fixed at construction
    #[error("[DATA] Channel count mismatch: expected {expected}, got {actual}")]
    ChannelMismatch {
        /// Channel count the pipeline was built for
        expected: usize,
        /// Width of the offending vector
        actual: usize,
    },

    /// Loading a configuration file failed
    #[error("[CONFIG] {0}")]
    Config(#[from] ConfigError),

    /// The worker thread owning the pipeline is gone
    #[error("[WORKER] Pipeline worker has stopped")]
    WorkerStopped,
}

/// Result type alias for pipeline operations
pub type DspResult<T> = Result<T, DspError>;

/// Error builder for consistent component tagging
pub struct DspErrorBuilder {
    component: String,
}

impl DspErrorBuilder {
    pub fn new(component: &str) -> Self {
        Self {
            component: component.to_string(),
        }
    }

    pub fn configuration(self, reason: impl Into<String>) -> DspError {
        DspError::Configuration {
            component: self.component,
            reason: reason.into(),
        }
    }
}

/// Check that a vector has the expected channel count
pub(crate) fn check_channels(expected: usize, actual: usize) -> DspResult<()> {
    if expected != actual {
        return Err(DspError::ChannelMismatch { expected, actual });
    }
    Ok(())
}
