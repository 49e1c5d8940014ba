use super::AnimationPlayer;

/// Named, fixed-length animation clip.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    pub duration: f32,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>, duration: f32) -> Self {
        Self {
            name: name.into(),
            duration,
        }
    }
}

/// Looping playback of a single clip on a single model.
#[derive(Debug, Clone)]
pub struct ClipPlayer {
    model: String,
    clip: AnimationClip,
    rate: f32,
    elapsed: f32,
    loops: u32,
}

impl ClipPlayer {
    pub fn new(model: impl Into<String>, clip: AnimationClip) -> Self {
        Self {
            model: model.into(),
            clip,
            rate: 0.0,
            elapsed: 0.0,
            loops: 0,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Position within the current loop, in `0.0..duration`.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Completed passes through the clip.
    pub fn loops(&self) -> u32 {
        self.loops
    }
}

impl AnimationPlayer for ClipPlayer {
    fn playback_rate(&self) -> f32 {
        self.rate
    }

    fn set_playback_rate(&mut self, rate: f32) {
        self.rate = rate;
    }

    fn advance(&mut self, delta: f32) {
        if !delta.is_finite() || delta <= 0.0 || self.rate == 0.0 {
            return;
        }
        if !(self.clip.duration > 0.0) {
            return;
        }

        self.elapsed += delta * self.rate;
        while self.elapsed >= self.clip.duration {
            self.elapsed -= self.clip.duration;
            self.loops += 1;
        }
    }
}
