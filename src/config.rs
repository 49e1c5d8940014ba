use crate::error::{StageError, StageResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Gate activation threshold on the 0-255 byte magnitude scale.
pub const DEFAULT_THRESHOLD: f32 = 10.0;

/// Frequency bins per analysis window.
pub const DEFAULT_BIN_COUNT: usize = 128;

const MIN_BIN_COUNT: usize = 16;
const MAX_BIN_COUNT: usize = 16384;

const MIN_FRAME_RATE: f32 = 1.0;
const MAX_FRAME_RATE: f32 = 1000.0;

/// Tunables for the stage.
///
/// The threshold and bin count were tuned by ear on real rigs and have no
/// deeper derivation, so both stay configurable. Every field has a default,
/// which means a partial JSON file only overrides what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Mean bin magnitude above which music counts as playing (strict `>`)
    pub threshold: f32,
    /// Frequency bins per analysis; the FFT runs over twice as many samples
    pub bin_count: usize,
    /// Spectral smoothing time constant (0 = none, 1 = frozen)
    pub smoothing: f32,
    /// dB level mapped to byte 0
    pub min_decibels: f32,
    /// dB level mapped to byte 255
    pub max_decibels: f32,
    /// Host loop ticks per second
    pub frame_rate: f32,
    /// Soundtrack volume (0.0 to 1.0)
    pub track_volume: f32,
    /// Length of each dancer's looping clip in seconds
    pub clip_duration: f32,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            bin_count: DEFAULT_BIN_COUNT,
            smoothing: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
            frame_rate: 60.0,
            track_volume: 0.5,
            clip_duration: 8.0,
        }
    }
}

impl StageConfig {
    /// Load and validate a JSON config file.
    pub fn load<P: AsRef<Path>>(path: P) -> StageResult<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: StageConfig = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> StageResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> StageResult<()> {
        if !self.bin_count.is_power_of_two()
            || self.bin_count < MIN_BIN_COUNT
            || self.bin_count > MAX_BIN_COUNT
        {
            return Err(StageError::InvalidConfig(format!(
                "bin_count must be a power of two in {}..={}, got {}",
                MIN_BIN_COUNT, MAX_BIN_COUNT, self.bin_count
            )));
        }
        if !(0.0..=1.0).contains(&self.smoothing) {
            return Err(StageError::InvalidConfig(format!(
                "smoothing must be within 0.0..=1.0, got {}",
                self.smoothing
            )));
        }
        if !(self.min_decibels < self.max_decibels) {
            return Err(StageError::InvalidConfig(format!(
                "min_decibels ({}) must be below max_decibels ({})",
                self.min_decibels, self.max_decibels
            )));
        }
        if !(self.threshold >= 0.0) {
            return Err(StageError::InvalidConfig(format!(
                "threshold must be non-negative, got {}",
                self.threshold
            )));
        }
        if !(MIN_FRAME_RATE..=MAX_FRAME_RATE).contains(&self.frame_rate) {
            return Err(StageError::InvalidConfig(format!(
                "frame_rate must be within {}..={}, got {}",
                MIN_FRAME_RATE, MAX_FRAME_RATE, self.frame_rate
            )));
        }
        if !(self.clip_duration > 0.0) {
            return Err(StageError::InvalidConfig(format!(
                "clip_duration must be positive, got {}",
                self.clip_duration
            )));
        }
        if !(0.0..=1.0).contains(&self.track_volume) {
            return Err(StageError::InvalidConfig(format!(
                "track_volume must be within 0.0..=1.0, got {}",
                self.track_volume
            )));
        }
        Ok(())
    }
}
