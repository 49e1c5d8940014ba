use log::debug;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::{AnimationPlayer, SharedPlayer};
use crate::error::StageError;
use crate::gate::Transition;

/// Uniform playback rate across every registered dancer.
///
/// Holds weak references only. A player whose owner dropped it, or that is
/// mid-borrow elsewhere when a change fans out, is skipped for that call;
/// the rest of the set is still updated, and the skipped player is brought
/// back to the set's rate the next time it is reachable.
pub struct AnimationPlaybackSet {
    players: Vec<Weak<RefCell<dyn AnimationPlayer>>>,
    rate: f32,
}

impl Default for AnimationPlaybackSet {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationPlaybackSet {
    /// Empty set, paused.
    pub fn new() -> Self {
        Self {
            players: Vec::new(),
            rate: 0.0,
        }
    }

    /// Rate every member is running at.
    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Members whose owners still hold them.
    pub fn len(&self) -> usize {
        self.players.iter().filter(|p| p.strong_count() > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add `player`, immediately bringing it to the set's current rate.
    pub fn register(&mut self, player: &SharedPlayer) {
        let slot = self.players.len();
        if let Ok(mut p) = player.try_borrow_mut() {
            p.set_playback_rate(self.rate);
        } else {
            debug!("{}; it will catch up on the next tick", StageError::InvalidPlayerReference { slot });
        }
        self.players.push(Rc::downgrade(player));
        debug!("Registered dancer in slot {} at rate {}", slot, self.rate);
    }

    /// Apply a gate edge to every member. Returns how many were updated.
    pub fn on_transition(&mut self, transition: Transition) -> usize {
        self.rate = transition.playback_rate();
        self.for_each_live(|_| {})
    }

    /// Advance every member by `delta` seconds at its own rate.
    pub fn advance(&mut self, delta: f32) {
        self.for_each_live(|player| player.advance(delta));
    }

    /// Visit every reachable member, first pulling any straggler that missed
    /// an earlier change back to the set's rate.
    fn for_each_live(&self, mut apply: impl FnMut(&mut dyn AnimationPlayer)) -> usize {
        let rate = self.rate;
        let mut applied = 0;
        for (slot, weak) in self.players.iter().enumerate() {
            let Some(player) = weak.upgrade() else {
                continue;
            };
            let Ok(mut p) = player.try_borrow_mut() else {
                debug!("Skipping: {}", StageError::InvalidPlayerReference { slot });
                continue;
            };
            if p.playback_rate() != rate {
                p.set_playback_rate(rate);
            }
            apply(&mut *p);
            applied += 1;
        }
        applied
    }

    /// Forget members whose owners have dropped them.
    pub fn prune(&mut self) -> usize {
        let before = self.players.len();
        self.players.retain(|p| p.strong_count() > 0);
        before - self.players.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimationClip, ClipPlayer};

    fn dancers(count: usize) -> Vec<SharedPlayer> {
        (0..count)
            .map(|i| {
                let player: SharedPlayer = Rc::new(RefCell::new(ClipPlayer::new(
                    format!("dancer-{}", i),
                    AnimationClip::new("dance", 4.0),
                )));
                player
            })
            .collect()
    }

    fn rates(players: &[SharedPlayer]) -> Vec<f32> {
        players.iter().map(|p| p.borrow().playback_rate()).collect()
    }

    #[test]
    fn test_fan_out_across_sizes() {
        for count in [0, 1, 5] {
            let players = dancers(count);
            let mut set = AnimationPlaybackSet::new();
            players.iter().for_each(|p| set.register(p));

            assert_eq!(set.on_transition(Transition::Started), count);
            assert!(rates(&players).iter().all(|&r| r == 1.0));

            assert_eq!(set.on_transition(Transition::Stopped), count);
            assert!(rates(&players).iter().all(|&r| r == 0.0));
        }
    }

    #[test]
    fn test_late_registration_inherits_active_rate() {
        let players = dancers(2);
        let mut set = AnimationPlaybackSet::new();
        set.register(&players[0]);
        set.on_transition(Transition::Started);

        set.register(&players[1]);
        assert_eq!(players[1].borrow().playback_rate(), 1.0);
    }

    #[test]
    fn test_registration_while_idle_is_paused() {
        let players = dancers(1);
        players[0].borrow_mut().set_playback_rate(1.0);

        let mut set = AnimationPlaybackSet::new();
        set.register(&players[0]);
        assert_eq!(players[0].borrow().playback_rate(), 0.0);
    }

    #[test]
    fn test_dropped_player_is_skipped() {
        let mut players = dancers(3);
        let mut set = AnimationPlaybackSet::new();
        players.iter().for_each(|p| set.register(p));

        players.remove(1);
        assert_eq!(set.len(), 2);
        assert_eq!(set.on_transition(Transition::Started), 2);
        assert!(rates(&players).iter().all(|&r| r == 1.0));

        assert_eq!(set.prune(), 1);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_borrowed_player_is_skipped_then_catches_up() {
        let players = dancers(3);
        let mut set = AnimationPlaybackSet::new();
        players.iter().for_each(|p| set.register(p));

        let held = players[0].borrow();
        assert_eq!(set.on_transition(Transition::Started), 2);
        drop(held);

        assert_eq!(players[0].borrow().playback_rate(), 0.0);
        assert_eq!(players[1].borrow().playback_rate(), 1.0);

        set.advance(0.016);
        assert!(rates(&players).iter().all(|&r| r == set.rate()));
        assert_eq!(set.rate(), 1.0);
    }

    #[test]
    fn test_borrowed_at_registration_catches_up() {
        let players = dancers(1);
        let mut set = AnimationPlaybackSet::new();
        set.on_transition(Transition::Started);

        let held = players[0].borrow();
        set.register(&players[0]);
        drop(held);
        assert_eq!(players[0].borrow().playback_rate(), 0.0);

        set.advance(0.016);
        assert_eq!(players[0].borrow().playback_rate(), 1.0);
    }

    #[test]
    fn test_advance_respects_rate() {
        let owned = Rc::new(RefCell::new(ClipPlayer::new("solo", AnimationClip::new("dance", 4.0))));
        let shared: SharedPlayer = owned.clone();
        let mut set = AnimationPlaybackSet::new();
        set.register(&shared);

        set.advance(1.0);
        assert_eq!(owned.borrow().elapsed(), 0.0);

        set.on_transition(Transition::Started);
        set.advance(1.0);
        assert!((owned.borrow().elapsed() - 1.0).abs() < 1e-6);
    }
}
