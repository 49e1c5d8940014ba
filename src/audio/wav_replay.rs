use crossbeam_channel::TrySendError;
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use super::{AnalysisSettings, AudioInput, SpectrumSource, StreamingSource};
use crate::error::{StageError, StageResult};

const CHANNEL_CAPACITY: usize = 64;

/// Feed cadence of the replay thread.
const CHUNK_MILLIS: u64 = 10;

/// Replays a WAV file in real time as though it were a microphone.
///
/// Useful on rigs with no input hardware and for reproducible runs. The file
/// loops until the consuming monitor goes away.
#[derive(Debug, Clone)]
pub struct WavReplayInput {
    path: PathBuf,
}

impl WavReplayInput {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Decode the whole file to mono f32.
    pub fn load_mono(path: &Path) -> StageResult<(u32, Vec<f32>)> {
        let mut reader = hound::WavReader::open(path)?;
        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
            hound::SampleFormat::Int => {
                let full_scale = (1u64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|s| s as f32 / full_scale))
                    .collect::<Result<_, _>>()?
            }
        };

        let mono = interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();

        Ok((spec.sample_rate, mono))
    }
}

impl AudioInput for WavReplayInput {
    fn acquire(self: Box<Self>, settings: &AnalysisSettings) -> StageResult<Box<dyn SpectrumSource>> {
        let (sample_rate, samples) = Self::load_mono(&self.path)
            .map_err(|e| StageError::DeviceUnavailable(format!("cannot replay {}: {}", self.path.display(), e)))?;

        if samples.is_empty() || sample_rate == 0 {
            return Err(StageError::DeviceUnavailable(format!(
                "{} contains no audio",
                self.path.display()
            )));
        }

        info!(
            "Replaying {} ({}Hz, {:.2}s) as live input",
            self.path.display(),
            sample_rate,
            samples.len() as f32 / sample_rate as f32
        );

        let (audio_tx, audio_rx) = crossbeam_channel::bounded(CHANNEL_CAPACITY);
        let chunk_len = ((sample_rate as u64 * CHUNK_MILLIS / 1000) as usize).max(1);
        let chunk_period = Duration::from_millis(CHUNK_MILLIS);

        std::thread::Builder::new()
            .name("wav-replay".to_string())
            .spawn(move || {
                let mut position = 0;
                let mut next_deadline = Instant::now();
                loop {
                    let end = (position + chunk_len).min(samples.len());
                    let chunk = samples[position..end].to_vec();
                    position = if end == samples.len() { 0 } else { end };

                    if let Err(TrySendError::Disconnected(_)) = audio_tx.try_send(chunk) {
                        debug!("Replay consumer gone, stopping");
                        break;
                    }

                    next_deadline += chunk_period;
                    let now = Instant::now();
                    if next_deadline > now {
                        std::thread::sleep(next_deadline - now);
                    }
                }
            })?;

        Ok(Box::new(StreamingSource::new(audio_rx, *settings)))
    }

    fn describe(&self) -> String {
        format!("WAV replay of {}", self.path.display())
    }
}
