use anyhow::{Context, Result};
use log::info;
use rodio::{Decoder, OutputStream, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Background track looped through the default output device.
///
/// Output streams are tied to the thread that opened them, so the host loop
/// keeps this value alive on its own thread for as long as the track should
/// play.
pub struct Soundtrack {
    #[allow(dead_code)]
    stream: OutputStream,
    sink: Sink,
}

impl Soundtrack {
    /// Decode `path` and start looping it at `volume`.
    pub fn open<P: AsRef<Path>>(path: P, volume: f32) -> Result<Self> {
        let path = path.as_ref();
        let (stream, stream_handle) = OutputStream::try_default().context("no audio output device")?;

        let file = BufReader::new(File::open(path).with_context(|| format!("cannot open {}", path.display()))?);
        let source = Decoder::new(file).with_context(|| format!("cannot decode {}", path.display()))?;

        let sink = Sink::try_new(&stream_handle)?;
        sink.set_volume(volume.clamp(0.0, 1.0));
        sink.append(source.repeat_infinite());
        sink.play();

        info!("Soundtrack looping: {} (volume {:.2})", path.display(), sink.volume());

        Ok(Self {
            stream,
            sink,
        })
    }

    pub fn stop(&self) {
        self.sink.stop();
        info!("Soundtrack stopped");
    }

    pub fn is_playing(&self) -> bool {
        !self.sink.is_paused() && !self.sink.empty()
    }
}
