use anyhow::Result;
use clap::Parser;
use log::{info, warn};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use dancefloor::audio::{MicrophoneInput, Soundtrack, WavReplayInput};
use dancefloor::{AnimationClip, AudioInput, ClipPlayer, FrameClock, SharedPlayer, Stage, StageConfig};

#[derive(Parser)]
#[command(name = "dancefloor")]
#[command(about = "Pause and resume dancing characters depending on whether the room hears music")]
struct Args {
    /// JSON config file (missing fields fall back to defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Activation threshold on the 0-255 loudness scale
    #[arg(long)]
    threshold: Option<f32>,

    /// Frequency bins per analysis (power of two)
    #[arg(long)]
    bins: Option<usize>,

    /// Frame rate of the host loop
    #[arg(long)]
    fps: Option<f32>,

    /// Number of dancers on the floor
    #[arg(long, default_value = "5")]
    dancers: usize,

    /// Replay this WAV file instead of listening to a microphone
    #[arg(long)]
    wav: Option<PathBuf>,

    /// Name of the input device to listen on (default device otherwise)
    #[arg(long)]
    input_device: Option<String>,

    /// Background track to loop while running
    #[arg(long)]
    track: Option<PathBuf>,

    /// Stop after this many frames (at least one)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    frames: Option<u64>,

    /// Write the effective config to this path and exit
    #[arg(long)]
    write_config: Option<PathBuf>,
}

fn frame_period(config: &StageConfig) -> Duration {
    Duration::from_secs_f32(1.0 / config.frame_rate)
}

fn effective_config(args: &Args) -> Result<StageConfig> {
    let mut config = match &args.config {
        Some(path) => StageConfig::load(path)?,
        None => StageConfig::default(),
    };

    if let Some(threshold) = args.threshold {
        config.threshold = threshold;
    }
    if let Some(bins) = args.bins {
        config.bin_count = bins;
    }
    if let Some(fps) = args.fps {
        config.frame_rate = fps;
    }

    config.validate()?;
    Ok(config)
}

fn audio_input(args: &Args) -> Box<dyn AudioInput> {
    if let Some(path) = &args.wav {
        return Box::new(WavReplayInput::new(path));
    }
    match &args.input_device {
        Some(name) => Box::new(MicrophoneInput::with_device_name(name.clone())),
        None => Box::new(MicrophoneInput::new()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    info!("Starting dancefloor");
    let config = effective_config(&args)?;

    if let Some(path) = &args.write_config {
        config.save(path)?;
        info!("Config written to {}", path.display());
        return Ok(());
    }

    info!(
        "Threshold {:.1}, {} bins, {:.0} fps, {} dancers",
        config.threshold, config.bin_count, config.frame_rate, args.dancers
    );

    let mut stage = Stage::new(&config);
    stage.listen(audio_input(&args));

    let soundtrack = match &args.track {
        Some(path) => match Soundtrack::open(path, config.track_volume) {
            Ok(track) => Some(track),
            Err(e) => {
                warn!("Soundtrack unavailable: {:#}", e);
                None
            }
        },
        None => None,
    };

    let clip = AnimationClip::new("All Night Dance", config.clip_duration);
    let floor: Vec<SharedPlayer> = (0..args.dancers)
        .map(|i| {
            let player: SharedPlayer = Rc::new(RefCell::new(ClipPlayer::new(format!("biped-{}", i), clip.clone())));
            player
        })
        .collect();
    for dancer in &floor {
        stage.add_dancer(dancer);
    }

    let mut ticker = tokio::time::interval(frame_period(&config));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut clock = FrameClock::new();
    let mut transitions = 0u64;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let report = stage.tick(clock.delta());
                if report.transition.is_some() {
                    transitions += 1;
                }
                if args.frames.is_some_and(|limit| report.frame >= limit) {
                    info!("Frame limit reached");
                    break;
                }
            }
            _ = &mut shutdown => {
                info!("Ctrl-C received");
                break;
            }
        }
    }

    if let Some(track) = &soundtrack {
        if track.is_playing() {
            track.stop();
        }
    }

    info!(
        "Ran {} frames over {:.1}s: {} transitions, gate {:?}, monitor {:?}, {} dancers at rate {}",
        stage.frame(),
        clock.elapsed(),
        transitions,
        stage.gate_state(),
        stage.monitor_status(),
        stage.dancer_count(),
        stage.playback_rate()
    );

    Ok(())
}
