//! Configuration loading and parsing

use anyhow::{bail, Context, Result};
use daq_threshold_decoder::{DecoderConfig, NUM_CHANNELS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub decoder: DecoderConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InputConfig {
    #[serde(default)]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Directory receiving the .thresh files
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    /// Channels written to per-channel files
    #[serde(default = "default_channels")]
    pub channels: Vec<u8>,
    /// Whether to write per-channel files next to the aggregate file
    #[serde(default = "default_true")]
    pub split: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            channels: default_channels(),
            split: default_true(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_channels() -> Vec<u8> {
    (1..=NUM_CHANNELS as u8).collect()
}

fn default_true() -> bool {
    true
}

impl AppConfig {
    /// Reject settings the writer cannot honour
    pub fn validate(&self) -> Result<()> {
        if let Some(ch) = self
            .output
            .channels
            .iter()
            .find(|&&ch| ch == 0 || usize::from(ch) > NUM_CHANNELS)
        {
            bail!("Invalid channel {} (expected 1..={})", ch, NUM_CHANNELS);
        }
        let hz = self.decoder.nominal_frequency_hz;
        if hz.is_nan() || hz <= 0.0 {
            bail!("Nominal frequency must be positive, got {}", hz);
        }
        Ok(())
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    config.validate()?;
    Ok(config)
}
