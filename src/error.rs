use thiserror::Error;

/// Failure conditions of the dancefloor controller.
///
/// None of these are fatal to the host loop. `DeviceUnavailable` turns the
/// monitor inert, `InvalidPlayerReference` makes the playback set skip one
/// member. The remaining variants only surface while loading configuration
/// or opening a replay file, before the loop starts.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("audio input unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("animation player in slot {slot} is no longer usable")]
    InvalidPlayerReference { slot: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Wav(#[from] hound::Error),
}

pub type StageResult<T> = std::result::Result<T, StageError>;
