pub mod clip;
pub mod playback;

pub use clip::{AnimationClip, ClipPlayer};
pub use playback::AnimationPlaybackSet;

use std::cell::RefCell;
use std::rc::Rc;

/// Playback of one character's animation.
///
/// The scene that loaded the character owns the player; the stage only
/// changes its playback rate and asks it to advance.
pub trait AnimationPlayer {
    fn playback_rate(&self) -> f32;

    fn set_playback_rate(&mut self, rate: f32);

    /// Move the clip cursor forward by `delta` seconds scaled by the
    /// current playback rate.
    fn advance(&mut self, delta: f32);
}

/// How the scene hands players out. The playback set keeps only weak
/// references to these.
pub type SharedPlayer = Rc<RefCell<dyn AnimationPlayer>>;
