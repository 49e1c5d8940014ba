use crossbeam_channel::{Receiver, TryRecvError};
use log::{info, warn};

use super::{AnalysisSettings, AudioInput, LoudnessSample, SpectrumSource};
use crate::error::{StageError, StageResult};

/// Where the monitor is in its one-shot acquisition lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorStatus {
    /// `initialize` has not been called
    Uninitialized,
    /// Acquisition running on its own thread
    Pending,
    /// A source is attached and producing spectra
    Live,
    /// Acquisition failed; stays this way for good
    Inert,
}

enum MonitorState {
    Uninitialized,
    Pending(Receiver<StageResult<Box<dyn SpectrumSource>>>),
    Live(Box<dyn SpectrumSource>),
    Inert,
}

/// Per-frame loudness from a live audio input.
///
/// `initialize` starts the (possibly very slow) device acquisition on a
/// separate thread and returns at once. The result is picked up by the next
/// `sample` call, so everything the monitor owns is only ever touched from
/// the tick thread. Until a source is live, and forever after a failed
/// acquisition, `sample` reports `LoudnessSample::Unavailable`.
pub struct AudioLevelMonitor {
    settings: AnalysisSettings,
    state: MonitorState,
    bins: Vec<u8>,
}

impl AudioLevelMonitor {
    pub fn new(settings: AnalysisSettings) -> Self {
        Self {
            bins: vec![0; settings.bin_count],
            settings,
            state: MonitorState::Uninitialized,
        }
    }

    pub fn status(&self) -> MonitorStatus {
        match self.state {
            MonitorState::Uninitialized => MonitorStatus::Uninitialized,
            MonitorState::Pending(_) => MonitorStatus::Pending,
            MonitorState::Live(_) => MonitorStatus::Live,
            MonitorState::Inert => MonitorStatus::Inert,
        }
    }

    /// Start acquiring `input`. Only the first call has any effect.
    pub fn initialize(&mut self, input: Box<dyn AudioInput>) {
        if !matches!(self.state, MonitorState::Uninitialized) {
            warn!("Audio monitor already initialized, ignoring {}", input.describe());
            return;
        }

        let description = input.describe();
        info!("Requesting audio input: {}", description);

        let settings = self.settings;
        let (result_tx, result_rx) = crossbeam_channel::bounded(1);
        let spawned = std::thread::Builder::new()
            .name("audio-acquire".to_string())
            .spawn(move || {
                let _ = result_tx.send(input.acquire(&settings));
            });

        self.state = match spawned {
            Ok(_) => MonitorState::Pending(result_rx),
            Err(e) => {
                self.fail(StageError::DeviceUnavailable(format!(
                    "cannot start acquisition of {}: {}",
                    description, e
                )));
                MonitorState::Inert
            }
        };
    }

    /// Install an already-open source, skipping the asynchronous path.
    pub fn attach(&mut self, source: Box<dyn SpectrumSource>) {
        if !matches!(self.state, MonitorState::Uninitialized) {
            warn!("Audio monitor already initialized, ignoring attached source");
            return;
        }
        self.state = MonitorState::Live(source);
    }

    /// Loudness of the current analysis window.
    pub fn sample(&mut self) -> LoudnessSample {
        self.poll_acquisition();

        match &mut self.state {
            MonitorState::Live(source) => {
                source.fill_frequency_data(&mut self.bins);
                LoudnessSample::from_bins(&self.bins)
            }
            _ => LoudnessSample::Unavailable,
        }
    }

    fn poll_acquisition(&mut self) {
        let outcome = match &self.state {
            MonitorState::Pending(receiver) => match receiver.try_recv() {
                Ok(outcome) => outcome,
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => Err(StageError::DeviceUnavailable(
                    "acquisition thread exited without a result".to_string(),
                )),
            },
            _ => return,
        };

        self.state = match outcome {
            Ok(source) => {
                info!("🎤 Audio input live ({} bins)", self.settings.bin_count);
                MonitorState::Live(source)
            }
            Err(e) => {
                self.fail(e);
                MonitorState::Inert
            }
        };
    }

    fn fail(&self, error: StageError) {
        warn!("{}; dancers will stay paused", error);
    }
}
