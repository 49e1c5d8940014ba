use log::debug;
use std::time::Instant;

use crate::animation::{AnimationPlaybackSet, SharedPlayer};
use crate::audio::{AnalysisSettings, AudioInput, AudioLevelMonitor, LoudnessSample, MonitorStatus, SpectrumSource};
use crate::config::StageConfig;
use crate::gate::{GateState, MusicGate, Transition};

/// What happened during one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    pub sample: LoudnessSample,
    pub transition: Option<Transition>,
}

/// Everything the per-frame callback touches, owned in one place.
///
/// The host loop calls [`Stage::tick`] once per rendered frame. Within a
/// tick the order is fixed: sample the monitor, feed the gate, apply any
/// edge to the dancers, then advance them.
pub struct Stage {
    monitor: AudioLevelMonitor,
    gate: MusicGate,
    dancers: AnimationPlaybackSet,
    frame: u64,
    status_interval: u64,
}

impl Stage {
    pub fn new(config: &StageConfig) -> Self {
        Self {
            monitor: AudioLevelMonitor::new(AnalysisSettings::from(config)),
            gate: MusicGate::new(config.threshold),
            dancers: AnimationPlaybackSet::new(),
            frame: 0,
            status_interval: (config.frame_rate.round() as u64).max(1),
        }
    }

    /// Kick off audio acquisition. Does not wait for it.
    pub fn listen(&mut self, input: Box<dyn AudioInput>) {
        self.monitor.initialize(input);
    }

    /// Use a source that is already open.
    pub fn attach(&mut self, source: Box<dyn SpectrumSource>) {
        self.monitor.attach(source);
    }

    /// Hand a freshly loaded character to the stage.
    pub fn add_dancer(&mut self, player: &SharedPlayer) {
        self.dancers.register(player);
    }

    pub fn tick(&mut self, delta: f32) -> FrameReport {
        self.frame += 1;

        let sample = self.monitor.sample();
        let transition = self.gate.update(sample);
        if let Some(transition) = transition {
            let applied = self.dancers.on_transition(transition);
            debug!("{:?} applied to {} dancers", transition, applied);
        }
        self.dancers.advance(delta);

        if self.frame % self.status_interval == 0 {
            self.dancers.prune();
            debug!(
                "frame {}: level {:?}, gate {:?}, monitor {:?}, {} dancers at rate {}",
                self.frame,
                sample.level(),
                self.gate.state(),
                self.monitor.status(),
                self.dancers.len(),
                self.dancers.rate()
            );
        }

        FrameReport {
            frame: self.frame,
            sample,
            transition,
        }
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn gate_state(&self) -> GateState {
        self.gate.state()
    }

    pub fn monitor_status(&self) -> MonitorStatus {
        self.monitor.status()
    }

    pub fn dancer_count(&self) -> usize {
        self.dancers.len()
    }

    pub fn playback_rate(&self) -> f32 {
        self.dancers.rate()
    }
}

/// Seconds between successive frames.
pub struct FrameClock {
    last: Instant,
    elapsed: f32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
            elapsed: 0.0,
        }
    }

    /// Time since the previous call, or since construction on the first.
    pub fn delta(&mut self) -> f32 {
        let now = Instant::now();
        let delta = now.duration_since(self.last).as_secs_f32();
        self.last = now;
        self.elapsed += delta;
        delta
    }

    /// Total of every delta handed out so far.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_clock_measures_gaps() {
        let mut clock = FrameClock::new();
        std::thread::sleep(Duration::from_millis(20));
        let first = clock.delta();
        let second = clock.delta();

        assert!(first >= 0.019);
        assert!(second < first);
        assert!((clock.elapsed() - (first + second)).abs() < 1e-6);
    }

    #[test]
    fn test_stage_without_input_stays_idle() {
        let mut stage = Stage::new(&StageConfig::default());
        for _ in 0..10 {
            let report = stage.tick(1.0 / 60.0);
            assert_eq!(report.sample, LoudnessSample::Unavailable);
            assert_eq!(report.transition, None);
        }
        assert_eq!(stage.frame(), 10);
        assert_eq!(stage.gate_state(), GateState::Idle);
        assert_eq!(stage.monitor_status(), MonitorStatus::Uninitialized);
    }
}
