//! Audio-gated dance floor.
//!
//! A live input is reduced to one loudness value per frame, a single
//! threshold gate turns that into music started/stopped edges, and the edges
//! set the playback rate of every dancer on the stage.

pub mod animation;
pub mod audio;
pub mod config;
pub mod error;
pub mod gate;
pub mod stage;

pub use animation::{AnimationClip, AnimationPlaybackSet, AnimationPlayer, ClipPlayer, SharedPlayer};
pub use audio::{AudioInput, AudioLevelMonitor, LoudnessSample, MonitorStatus, SpectrumSource};
pub use config::StageConfig;
pub use error::{StageError, StageResult};
pub use gate::{GateState, MusicGate, Transition};
pub use stage::{FrameClock, FrameReport, Stage};
