use crossbeam_channel::Receiver;
use std::collections::VecDeque;

use super::{AnalysisSettings, FrequencyAnalyser, SpectrumSource};

/// Consumer side of a capture thread.
///
/// Mono chunks arrive over a channel from whichever thread owns the device;
/// every fill drains the channel, keeps the newest `fft_size` samples and
/// analyses them.
pub struct StreamingSource {
    receiver: Receiver<Vec<f32>>,
    window: VecDeque<f32>,
    scratch: Vec<f32>,
    analyser: FrequencyAnalyser,
}

impl StreamingSource {
    pub fn new(receiver: Receiver<Vec<f32>>, settings: AnalysisSettings) -> Self {
        let fft_size = settings.fft_size();
        Self {
            receiver,
            window: VecDeque::with_capacity(fft_size),
            scratch: Vec::with_capacity(fft_size),
            analyser: FrequencyAnalyser::new(settings),
        }
    }

    fn drain(&mut self) {
        let fft_size = self.analyser.fft_size();
        while let Ok(chunk) = self.receiver.try_recv() {
            let keep = &chunk[chunk.len().saturating_sub(fft_size)..];
            self.window.extend(keep.iter().copied());
            let excess = self.window.len().saturating_sub(fft_size);
            self.window.drain(..excess);
        }
    }
}

impl SpectrumSource for StreamingSource {
    fn fill_frequency_data(&mut self, bins: &mut [u8]) {
        self.drain();

        self.scratch.clear();
        self.scratch.extend(self.window.iter().copied());
        self.analyser.analyse(&self.scratch, bins);
    }
}
