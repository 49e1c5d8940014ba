//! Frame-by-frame scenarios driving the whole stage

use dancefloor::audio::AnalysisSettings;
use dancefloor::*;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

/// Plays back one flat spectrum level per frame, then silence.
struct ScriptedSource {
    levels: VecDeque<u8>,
}

impl ScriptedSource {
    fn new(levels: &[u8]) -> Self {
        Self {
            levels: levels.iter().copied().collect(),
        }
    }
}

impl SpectrumSource for ScriptedSource {
    fn fill_frequency_data(&mut self, bins: &mut [u8]) {
        let level = self.levels.pop_front().unwrap_or(0);
        bins.iter_mut().for_each(|b| *b = level);
    }
}

struct DeniedMicrophone;

impl AudioInput for DeniedMicrophone {
    fn acquire(self: Box<Self>, _: &AnalysisSettings) -> StageResult<Box<dyn SpectrumSource>> {
        std::thread::sleep(Duration::from_millis(10));
        Err(StageError::DeviceUnavailable("permission refused".to_string()))
    }

    fn describe(&self) -> String {
        "denied microphone".to_string()
    }
}

struct LoudMicrophone;

impl AudioInput for LoudMicrophone {
    fn acquire(self: Box<Self>, _: &AnalysisSettings) -> StageResult<Box<dyn SpectrumSource>> {
        Ok(Box::new(ScriptedSource::new(&[200; 1000])))
    }

    fn describe(&self) -> String {
        "loud microphone".to_string()
    }
}

fn floor(count: usize) -> (Vec<Rc<RefCell<ClipPlayer>>>, Vec<SharedPlayer>) {
    let owned: Vec<_> = (0..count)
        .map(|i| Rc::new(RefCell::new(ClipPlayer::new(format!("biped-{}", i), AnimationClip::new("dance", 8.0)))))
        .collect();
    let shared = owned
        .iter()
        .map(|p| {
            let player: SharedPlayer = p.clone();
            player
        })
        .collect();
    (owned, shared)
}

#[test]
fn test_music_starts_then_stops() {
    let mut stage = Stage::new(&StageConfig::default());
    stage.attach(Box::new(ScriptedSource::new(&[5, 8, 15, 20, 9, 3])));

    let (owned, shared) = floor(5);
    shared.iter().for_each(|p| stage.add_dancer(p));

    let transitions: Vec<Option<Transition>> = (0..6).map(|_| stage.tick(0.1).transition).collect();

    assert_eq!(
        transitions,
        vec![
            None,
            None,
            Some(Transition::Started),
            None,
            Some(Transition::Stopped),
            None,
        ]
    );
    assert_eq!(stage.gate_state(), GateState::Idle);
    for dancer in &owned {
        let dancer = dancer.borrow();
        assert_eq!(dancer.playback_rate(), 0.0);
        // Danced on frames 3 and 4 only
        assert!((dancer.elapsed() - 0.2).abs() < 1e-5);
    }
}

#[test]
fn test_threshold_level_does_not_start() {
    let mut stage = Stage::new(&StageConfig::default());
    stage.attach(Box::new(ScriptedSource::new(&[10, 10, 10])));

    for _ in 0..3 {
        assert_eq!(stage.tick(0.016).transition, None);
    }
    assert_eq!(stage.gate_state(), GateState::Idle);
}

#[test]
fn test_dancer_joining_mid_song_dances() {
    let mut stage = Stage::new(&StageConfig::default());
    stage.attach(Box::new(ScriptedSource::new(&[50, 50, 50, 0])));

    let (owned, shared) = floor(2);
    stage.add_dancer(&shared[0]);
    assert_eq!(stage.tick(0.016).transition, Some(Transition::Started));

    stage.add_dancer(&shared[1]);
    assert_eq!(owned[1].borrow().playback_rate(), 1.0);

    stage.tick(0.016);
    stage.tick(0.016);
    assert_eq!(stage.tick(0.016).transition, Some(Transition::Stopped));
    assert!(owned.iter().all(|p| p.borrow().playback_rate() == 0.0));
}

#[test]
fn test_denied_microphone_keeps_floor_paused() {
    let mut stage = Stage::new(&StageConfig::default());
    stage.listen(Box::new(DeniedMicrophone));

    let (owned, shared) = floor(3);
    shared.iter().for_each(|p| stage.add_dancer(p));

    for _ in 0..200 {
        let report = stage.tick(0.016);
        assert_eq!(report.sample, LoudnessSample::Unavailable);
        assert_eq!(report.transition, None);
        std::thread::sleep(Duration::from_millis(1));
    }

    assert_eq!(stage.monitor_status(), MonitorStatus::Inert);
    assert_eq!(stage.gate_state(), GateState::Idle);
    assert!(owned.iter().all(|p| p.borrow().elapsed() == 0.0));
}

#[test]
fn test_granted_microphone_starts_floor_once_live() {
    let mut stage = Stage::new(&StageConfig::default());
    stage.listen(Box::new(LoudMicrophone));

    let (owned, shared) = floor(2);
    shared.iter().for_each(|p| stage.add_dancer(p));

    let mut started = 0;
    for _ in 0..200 {
        if stage.tick(0.016).transition == Some(Transition::Started) {
            started += 1;
        }
        if stage.monitor_status() == MonitorStatus::Live {
            break;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    stage.tick(0.016);

    assert_eq!(stage.monitor_status(), MonitorStatus::Live);
    assert_eq!(stage.gate_state(), GateState::Active);
    assert!(started <= 1);
    assert!(owned.iter().all(|p| p.borrow().playback_rate() == 1.0));
}

#[test]
fn test_removed_dancer_does_not_break_fan_out() {
    let mut stage = Stage::new(&StageConfig::default());
    stage.attach(Box::new(ScriptedSource::new(&[80])));

    let (mut owned, mut shared) = floor(4);
    shared.iter().for_each(|p| stage.add_dancer(p));

    owned.remove(2);
    shared.remove(2);

    assert_eq!(stage.tick(0.016).transition, Some(Transition::Started));
    assert_eq!(stage.dancer_count(), 3);
    assert!(owned.iter().all(|p| p.borrow().playback_rate() == 1.0));
}
