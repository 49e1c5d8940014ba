pub mod analyser;
pub mod microphone;
pub mod monitor;
pub mod soundtrack;
pub mod source;
pub mod wav_replay;

pub use analyser::FrequencyAnalyser;
pub use microphone::MicrophoneInput;
pub use monitor::{AudioLevelMonitor, MonitorStatus};
pub use soundtrack::Soundtrack;
pub use source::StreamingSource;
pub use wav_replay::WavReplayInput;

use crate::config::StageConfig;
use crate::error::StageResult;

/// Mean byte magnitude across the frequency bins of one analysis window.
///
/// Lives for a single frame. `Unavailable` stands in when there is no live
/// input behind the monitor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoudnessSample {
    Unavailable,
    Level(f32),
}

impl LoudnessSample {
    /// Builds a level sample. Negative and NaN inputs collapse to 0.
    pub fn new(level: f32) -> Self {
        if level > 0.0 {
            LoudnessSample::Level(level)
        } else {
            LoudnessSample::Level(0.0)
        }
    }

    /// Arithmetic mean of a bin buffer. An empty buffer yields 0.
    pub fn from_bins(bins: &[u8]) -> Self {
        if bins.is_empty() {
            return LoudnessSample::new(0.0);
        }
        let sum: u32 = bins.iter().map(|&b| b as u32).sum();
        LoudnessSample::new(sum as f32 / bins.len() as f32)
    }

    pub fn level(self) -> Option<f32> {
        match self {
            LoudnessSample::Level(level) => Some(level),
            LoudnessSample::Unavailable => None,
        }
    }

    pub fn level_or_zero(self) -> f32 {
        self.level().unwrap_or(0.0)
    }

    pub fn is_available(self) -> bool {
        matches!(self, LoudnessSample::Level(_))
    }
}

/// Parameters shared by every analysis path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisSettings {
    pub bin_count: usize,
    pub smoothing: f32,
    pub min_decibels: f32,
    pub max_decibels: f32,
}

impl AnalysisSettings {
    pub fn fft_size(&self) -> usize {
        self.bin_count * 2
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        AnalysisSettings::from(&StageConfig::default())
    }
}

impl From<&StageConfig> for AnalysisSettings {
    fn from(config: &StageConfig) -> Self {
        Self {
            bin_count: config.bin_count,
            smoothing: config.smoothing,
            min_decibels: config.min_decibels,
            max_decibels: config.max_decibels,
        }
    }
}

/// Anything that can hand back a frequency-magnitude buffer on demand.
pub trait SpectrumSource: Send {
    /// Overwrite `bins` with byte magnitudes from the latest analysis window.
    fn fill_frequency_data(&mut self, bins: &mut [u8]);
}

/// A live input that has not been opened yet.
///
/// `acquire` may block for as long as the platform needs (permission
/// prompts, device enumeration), so the monitor always calls it off the
/// tick thread.
pub trait AudioInput: Send + 'static {
    fn acquire(self: Box<Self>, settings: &AnalysisSettings) -> StageResult<Box<dyn SpectrumSource>>;

    /// Human readable name used in logs.
    fn describe(&self) -> String;
}
