// src/processing/mod.rs
//! Streaming signal hygiene for multichannel EEG

pub mod artifact;
pub mod filters;
pub mod pipeline;
pub mod worker;

pub use artifact::ArtifactRejector;
pub use filters::{Filter, FilterStage};
pub use pipeline::*;
pub use worker::*;
