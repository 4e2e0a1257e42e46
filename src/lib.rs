//! EEG-Hygiene: Real-time signal hygiene for multichannel EEG acquisition
//!
//! This library cleans raw EEG samples one at a time, before they leave the
//! acquisition device. It features:
//!
//! - DC blocking to remove electrode drift
//! - Powerline notch filtering at a mains frequency and its harmonics
//! - Butterworth bandpass, highpass or lowpass filtering
//! - Amplitude-threshold artifact rejection with per-channel blanking
//! - Common average referencing and exponential smoothing
//! - Layered TOML configuration with environment overrides
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use eeg_hygiene::{HygienePipeline, PipelineConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::for_powerline(250.0, 8, 50.0);
//!     let mut pipeline = HygienePipeline::new(config)?;
//!
//!     let raw = [12.0, -3.5, 40.1, 8.8, 0.0, 2.2, -7.9, 15.3];
//!     let cleaned = pipeline.process(&raw)?;
//!     println!("{:?} {:?}", cleaned.channels, cleaned.artifact_flags);
//!
//!     println!("{}", serde_json::to_string(&pipeline.get_stats())?);
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod error;
pub mod processing;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::{ConfigError, ConfigLoader, PipelineConfig};
pub use error::{DspError, DspErrorBuilder, DspResult};
pub use processing::{
    ArtifactRejector, HygienePipeline, PipelineStats, PipelineWorker, ProcessedSample,
    SharedPipeline,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn version_info() -> VersionInfo {
    let mut features = vec![
        "DC blocking".to_string(),
        "Artifact rejection".to_string(),
        "Common average reference".to_string(),
        "Exponential smoothing".to_string(),
    ];
    if cfg!(feature = "iir") {
        features.push("Butterworth and notch IIR filtering".to_string());
    }

    VersionInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: "Real-time EEG signal hygiene pipeline".to_string(),
        features,
    }
}

/// Library version information
#[derive(Debug, Clone)]
pub struct VersionInfo {
    /// Library name
    pub name: String,
    /// Version string
    pub version: String,
    /// Description
    pub description: String,
    /// Enabled capabilities
    pub features: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_info() {
        let info = version_info();
        assert_eq!(info.name, NAME);
        assert_eq!(info.version, VERSION);
        assert!(!info.features.is_empty());
        assert_eq!(
            info.features.iter().any(|f| f.contains("IIR")),
            cfg!(feature = "iir")
        );
    }

    #[test]
    fn test_constants() {
        assert!(!VERSION.is_empty());
        assert_eq!(NAME, "eeg-hygiene");
    }
}
