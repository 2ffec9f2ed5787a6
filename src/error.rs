use thiserror::Error;

use crate::publish::PublishError;

/// Errors surfaced by editor operations that can genuinely fail.
///
/// Invalid *user* operations (limit reached, nothing selected, undo at the
/// stack boundary) are not errors; they become [`crate::editor::Notice`]s.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("failed to encode scene image: {0}")]
    ImageEncode(#[from] image::ImageError),

    #[error("failed to serialize scene document: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("publishing is disabled in this configuration")]
    PublishDisabled,

    #[error("no publish sink is configured")]
    NoPublisher,

    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// Errors from the audio engine's device and voice layer.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio output device available")]
    NoDevice,

    #[error("audio device reported an unsupported sample format")]
    UnsupportedFormat,

    #[error("failed to open audio stream: {0}")]
    Stream(String),

    #[error("voice '{0}' could not be synthesized")]
    Voice(&'static str),
}
