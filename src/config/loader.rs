// src/config/loader.rs
//! Layered configuration loader
//!
//! Defaults are overlaid by each existing TOML file in order, then by
//! `EEG_*` environment variables, and the result is validated before it is
//! handed out.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::config::{constants::paths, PipelineConfig};

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Configuration parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

/// Configuration loader for [`PipelineConfig`]
pub struct ConfigLoader {
    config_paths: Vec<PathBuf>,
    env_prefix: String,
}

impl ConfigLoader {
    /// Loader over the default file locations in the working directory
    pub fn new() -> Self {
        Self::with_paths(vec![
            PathBuf::from(paths::DEFAULT_CONFIG_FILE),
            PathBuf::from(paths::LOCAL_CONFIG_FILE),
        ])
    }

    /// Loader over custom paths, later paths take precedence
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            config_paths: paths,
            env_prefix: paths::ENV_PREFIX.to_string(),
        }
    }

    /// Use a different environment variable prefix
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = prefix.to_string();
        self
    }

    pub fn config_paths(&self) -> &[PathBuf] {
        &self.config_paths
    }

    /// Load, merge and validate the configuration
    pub fn load(&self) -> Result<PipelineConfig, ConfigError> {
        let mut merged = toml::Value::try_from(PipelineConfig::default())
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        for path in &self.config_paths {
            match Self::load_config_file(path) {
                Ok(file_config) => {
                    debug!(path = %path.display(), "merging configuration file");
                    merge_toml_values(&mut merged, file_config);
                }
                Err(ConfigError::FileNotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        self.apply_environment_overrides(&mut merged, std::env::vars());

        let config: PipelineConfig = merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::Parse(format!("Failed to deserialize config: {}", e)))?;

        config
            .validate()
            .map_err(|e| ConfigError::Validation(e.to_string()))?;

        info!(
            sample_rate = config.sample_rate,
            num_channels = config.num_channels,
            "pipeline configuration loaded"
        );
        Ok(config)
    }

    /// Parse and validate a single file without merging
    pub fn validate_config_file<P: AsRef<Path>>(&self, path: P) -> Result<PipelineConfig, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = toml::from_str(&content)?;
        config
            .validate()
            .map_err(|e| ConfigError::Validation(e.to_string()))?;
        Ok(config)
    }

    /// Write a configuration out as TOML
    pub fn export_config<P: AsRef<Path>>(config: &PipelineConfig, path: P) -> Result<(), ConfigError> {
        let toml_content =
            toml::to_string_pretty(config).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    fn load_config_file(path: &Path) -> Result<toml::Value, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        let config: toml::Value = toml::from_str(&content)?;
        Ok(config)
    }

    fn apply_environment_overrides(
        &self,
        config: &mut toml::Value,
        vars: impl Iterator<Item = (String, String)>,
    ) {
        let toml::Value::Table(table) = config else {
            return;
        };

        for (key, value) in vars {
            let Some(stripped) = key.strip_prefix(&self.env_prefix) else {
                continue;
            };
            let config_key = stripped.to_lowercase();
            let expects_list = match table.get(&config_key) {
                Some(existing) => existing.is_array(),
                None => continue,
            };

            let parsed = match parse_env_value(&value) {
                scalar @ toml::Value::Integer(_) if expects_list => toml::Value::Array(vec![scalar]),
                parsed => parsed,
            };
            debug!(key = %config_key, "applying environment override");
            table.insert(config_key, parsed);
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn merge_toml_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                if let Some(base_value) = base_table.get_mut(&key) {
                    merge_toml_values(base_value, value);
                } else {
                    base_table.insert(key, value);
                }
            }
        }
        (base_value, overlay_value) => {
            *base_value = overlay_value;
        }
    }
}

fn parse_env_value(value: &str) -> toml::Value {
    let value = value.trim();
    if let Ok(int_val) = value.parse::<i64>() {
        toml::Value::Integer(int_val)
    } else if let Ok(float_val) = value.parse::<f64>() {
        toml::Value::Float(float_val)
    } else if let Ok(bool_val) = value.parse::<bool>() {
        toml::Value::Boolean(bool_val)
    } else if value.is_empty() || value.contains(',') {
        // Channel lists such as "0,3,7"
        let items: Option<Vec<toml::Value>> = value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<i64>().ok().map(toml::Value::Integer))
            .collect();
        match items {
            Some(items) => toml::Value::Array(items),
            None => toml::Value::String(value.to_string()),
        }
    } else {
        toml::Value::String(value.to_string())
    }
}
