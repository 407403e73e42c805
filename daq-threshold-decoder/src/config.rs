//! Decoder configuration types
//!
//! This module defines the minimal configuration needed by the decoder library.
//! Output locations, channel selection for split files and other I/O concerns
//! belong to the application layer.

use crate::event::NOMINAL_FREQUENCY_HZ;
use serde::{Deserialize, Serialize};

/// Configuration for the decoder library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Oscillator frequency assumed when an event contains no PPS tick
    #[serde(default = "default_nominal_frequency")]
    pub nominal_frequency_hz: f64,

    /// Reconstruct events on the rayon thread pool
    #[serde(default = "default_true")]
    pub parallel: bool,
}

fn default_true() -> bool {
    true
}

fn default_nominal_frequency() -> f64 {
    NOMINAL_FREQUENCY_HZ
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            nominal_frequency_hz: default_nominal_frequency(),
            parallel: default_true(),
        }
    }
}

impl DecoderConfig {
    /// Create a new decoder configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the fallback oscillator frequency
    pub fn with_nominal_frequency(mut self, hz: f64) -> Self {
        self.nominal_frequency_hz = hz;
        self
    }

    /// Builder method: enable or disable parallel reconstruction
    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }
}
