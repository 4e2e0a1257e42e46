// src/config/constants.rs
//! Pipeline configuration constants

/// Acquisition defaults
pub mod signal {
    pub const DEFAULT_SAMPLE_RATE_HZ: f64 = 250.0;
    pub const DEFAULT_CHANNEL_COUNT: usize = 8;
}

/// DC blocker constants
pub mod dc_block {
    /// Pole location; roughly 0.2 Hz cutoff at 250 SPS
    pub const DEFAULT_ALPHA: f64 = 0.995;
}

/// Powerline notch constants
pub mod notch {
    /// Americas/Asia mains; Europe uses 50 Hz
    pub const DEFAULT_FREQ_HZ: f64 = 60.0;
    pub const DEFAULT_HARMONICS: usize = 3;
    pub const DEFAULT_Q: f64 = 30.0;
    pub const POWERLINE_FREQUENCIES_HZ: &[f64] = &[50.0, 60.0];
}

/// Butterworth band filter constants
pub mod band {
    pub const DEFAULT_HIGHPASS_HZ: f64 = 0.5;
    pub const DEFAULT_LOWPASS_HZ: f64 = 45.0;
    pub const DEFAULT_ORDER: usize = 4;
    pub const MIN_ORDER: usize = 1;
    pub const MAX_ORDER: usize = 16;
}

/// Artifact rejection constants
pub mod artifact {
    /// Microvolts
    pub const DEFAULT_THRESHOLD_UV: f64 = 150.0;
    pub const DEFAULT_BLANKING_SAMPLES: usize = 5;
}

/// Exponential smoothing constants
pub mod smoothing {
    pub const DEFAULT_ALPHA: f64 = 0.3;
}

/// Configuration file discovery
pub mod paths {
    pub const DEFAULT_CONFIG_FILE: &str = "eeg_hygiene.toml";
    pub const LOCAL_CONFIG_FILE: &str = "eeg_hygiene.local.toml";
    pub const ENV_PREFIX: &str = "EEG_";
}
