use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

use super::AnalysisSettings;

/// Byte-scale spectrum analyser.
///
/// Turns the most recent `fft_size` mono samples into `bin_count` magnitudes
/// on a 0-255 scale, the same reduction a browser analyser node applies to a
/// microphone stream:
///
/// 1. Blackman window, forward FFT
/// 2. `|X[k]| / fft_size`, smoothed against the previous call
/// 3. dB, mapped linearly from `min_decibels..max_decibels` onto `0..=255`
pub struct FrequencyAnalyser {
    settings: AnalysisSettings,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
}

impl FrequencyAnalyser {
    pub fn new(settings: AnalysisSettings) -> Self {
        let fft_size = settings.fft_size();
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);

        Self {
            settings,
            fft,
            window: Self::blackman_window(fft_size),
            buffer: vec![Complex::new(0.0, 0.0); fft_size],
            smoothed: vec![0.0; settings.bin_count],
        }
    }

    fn blackman_window(size: usize) -> Vec<f32> {
        let alpha = 0.16;
        let a0 = 0.5 * (1.0 - alpha);
        let a1 = 0.5;
        let a2 = 0.5 * alpha;

        (0..size)
            .map(|i| {
                let phase = 2.0 * std::f32::consts::PI * i as f32 / size as f32;
                a0 - a1 * phase.cos() + a2 * (2.0 * phase).cos()
            })
            .collect()
    }

    pub fn fft_size(&self) -> usize {
        self.settings.fft_size()
    }

    /// Analyse `samples` and write one byte per bin into `bins`.
    ///
    /// Only the last `fft_size` samples are used; shorter input is padded
    /// with silence on the oldest side. `bins` may be shorter or longer than
    /// `bin_count`, extra output bins are zeroed.
    pub fn analyse(&mut self, samples: &[f32], bins: &mut [u8]) {
        let fft_size = self.fft_size();
        let recent = &samples[samples.len().saturating_sub(fft_size)..];
        let pad = fft_size - recent.len();

        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let sample = if i < pad { 0.0 } else { recent[i - pad] };
            *slot = Complex::new(sample * self.window[i], 0.0);
        }

        self.fft.process(&mut self.buffer);

        let tau = self.settings.smoothing;
        let scale = 1.0 / fft_size as f32;
        for (smoothed, value) in self.smoothed.iter_mut().zip(self.buffer.iter()) {
            let magnitude = value.norm() * scale;
            *smoothed = tau * *smoothed + (1.0 - tau) * magnitude;
        }

        for (i, out) in bins.iter_mut().enumerate() {
            *out = match self.smoothed.get(i) {
                Some(&magnitude) => self.to_byte(magnitude),
                None => 0,
            };
        }
    }

    fn to_byte(&self, magnitude: f32) -> u8 {
        if !(magnitude > 0.0) {
            return 0;
        }
        let db = 20.0 * magnitude.log10();
        let range = self.settings.max_decibels - self.settings.min_decibels;
        let scaled = 255.0 * (db - self.settings.min_decibels) / range;
        scaled.clamp(0.0, 255.0) as u8
    }
}
