//! Utility functions and diagnostics

pub mod spectrum;
pub mod synthetic;

pub use spectrum::{attenuation_db, magnitude_at};
pub use synthetic::{SyntheticConfig, SyntheticEeg};
