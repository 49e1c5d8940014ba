use crate::audio::LoudnessSample;
use crate::config::DEFAULT_THRESHOLD;
use log::info;

/// Whether the gate currently believes music is playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GateState {
    #[default]
    Idle,
    Active,
}

/// Edge emitted when the gate changes state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Started,
    Stopped,
}

impl Transition {
    /// Playback rate the dancers should run at after this edge.
    pub fn playback_rate(self) -> f32 {
        match self {
            Transition::Started => 1.0,
            Transition::Stopped => 0.0,
        }
    }
}

/// Single-threshold music detector.
///
/// A sample is "active" when it is strictly above the threshold. The gate
/// only reports edges: it fires `Started` once on the first active sample
/// after being idle and `Stopped` once on the first inactive sample after
/// being active. Unavailable samples count as inactive.
#[derive(Debug)]
pub struct MusicGate {
    threshold: f32,
    state: GateState,
}

impl Default for MusicGate {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl MusicGate {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            state: GateState::Idle,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn update(&mut self, sample: LoudnessSample) -> Option<Transition> {
        let active = sample.level().is_some_and(|level| level > self.threshold);

        match (self.state, active) {
            (GateState::Idle, true) => {
                self.state = GateState::Active;
                info!("🎶 Music detected (level {:.1} > {:.1})", sample.level_or_zero(), self.threshold);
                Some(Transition::Started)
            }
            (GateState::Active, false) => {
                self.state = GateState::Idle;
                info!("🔇 Music stopped (level {:.1})", sample.level_or_zero());
                Some(Transition::Stopped)
            }
            _ => None,
        }
    }
}
