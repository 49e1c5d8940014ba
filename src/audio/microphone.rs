use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use crossbeam_channel::Sender;
use log::{info, warn};

use super::{AnalysisSettings, AudioInput, SpectrumSource, StreamingSource};
use crate::error::{StageError, StageResult};

/// Chunks buffered between the capture callback and the tick thread.
/// Anything beyond this is dropped; the analyser only wants the newest window.
const CHANNEL_CAPACITY: usize = 64;

/// Live microphone via cpal.
///
/// The cpal stream is not `Send` on every platform, so it is built on and
/// owned by a dedicated capture thread which holds it for the rest of the
/// process. Only the sample channel crosses back to the caller.
#[derive(Debug, Default, Clone)]
pub struct MicrophoneInput {
    device_name: Option<String>,
}

impl MicrophoneInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefer the input device whose name matches exactly.
    pub fn with_device_name(name: impl Into<String>) -> Self {
        Self {
            device_name: Some(name.into()),
        }
    }

    fn find_device(&self) -> StageResult<Device> {
        let host = cpal::default_host();

        if let Some(wanted) = &self.device_name {
            let devices = host
                .input_devices()
                .map_err(|e| StageError::DeviceUnavailable(format!("cannot enumerate inputs: {}", e)))?;
            for device in devices {
                if device.name().map(|name| &name == wanted).unwrap_or(false) {
                    return Ok(device);
                }
            }
            return Err(StageError::DeviceUnavailable(format!("no input device named '{}'", wanted)));
        }

        host.default_input_device()
            .ok_or_else(|| StageError::DeviceUnavailable("no input device available".to_string()))
    }

    fn open_stream(&self, sender: Sender<Vec<f32>>) -> StageResult<Stream> {
        let device = self.find_device()?;
        let supported = device
            .default_input_config()
            .map_err(|e| StageError::DeviceUnavailable(format!("failed to get default input config: {}", e)))?;

        info!("Using audio device: {}", device.name().unwrap_or_else(|_| "Unknown".to_string()));
        info!("Audio config: {:?}", supported);

        let sample_format = supported.sample_format();
        let config: StreamConfig = supported.into();

        let stream = match sample_format {
            SampleFormat::F32 => Self::create_input_stream::<f32>(&device, &config, sender),
            SampleFormat::I16 => Self::create_input_stream::<i16>(&device, &config, sender),
            SampleFormat::U16 => Self::create_input_stream::<u16>(&device, &config, sender),
            other => Err(StageError::DeviceUnavailable(format!("unsupported sample format {:?}", other))),
        }?;

        stream
            .play()
            .map_err(|e| StageError::DeviceUnavailable(format!("failed to start input stream: {}", e)))?;

        Ok(stream)
    }

    fn create_input_stream<T>(device: &Device, config: &StreamConfig, sender: Sender<Vec<f32>>) -> StageResult<Stream>
    where
        T: SizedSample,
        f32: FromSample<T>,
    {
        let channels = config.channels.max(1) as usize;

        info!("Creating input stream with {} channels at {} Hz", channels, config.sample_rate.0);

        device
            .build_input_stream(
                config,
                move |data: &[T], _: &cpal::InputCallbackInfo| {
                    let mono: Vec<f32> = data
                        .chunks(channels)
                        .map(|frame| frame.iter().map(|s| s.to_sample::<f32>()).sum::<f32>() / channels as f32)
                        .collect();

                    // Full means the tick thread is behind, Disconnected means
                    // the monitor is gone. Either way the chunk is not needed.
                    let _ = sender.try_send(mono);
                },
                |err| {
                    warn!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| StageError::DeviceUnavailable(format!("failed to build input stream: {}", e)))
    }
}

impl AudioInput for MicrophoneInput {
    fn acquire(self: Box<Self>, settings: &AnalysisSettings) -> StageResult<Box<dyn SpectrumSource>> {
        let (audio_tx, audio_rx) = crossbeam_channel::bounded(CHANNEL_CAPACITY);
        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<StageResult<()>>(1);

        std::thread::Builder::new()
            .name("mic-capture".to_string())
            .spawn(move || match self.open_stream(audio_tx) {
                Ok(stream) => {
                    let _ = ready_tx.send(Ok(()));
                    let _stream = stream;
                    loop {
                        std::thread::park();
                    }
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                }
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Box::new(StreamingSource::new(audio_rx, *settings))),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(StageError::DeviceUnavailable("capture thread exited early".to_string())),
        }
    }

    fn describe(&self) -> String {
        match &self.device_name {
            Some(name) => format!("microphone '{}'", name),
            None => "default microphone".to_string(),
        }
    }
}
