use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Content identifier returned by a successful publish; the host turns it
/// into a shareable view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishId(pub String);

impl std::fmt::Display for PublishId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Everything the sink needs to store one published composition.
#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub title: String,
    pub image_png: Vec<u8>,
    /// The scene document as JSON, exactly what `save_local` would persist.
    pub scene_json: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PublishError {
    #[error("not signed in")]
    Unauthorized,

    #[error("publish rejected: {0}")]
    Rejected(String),

    #[error("publish failed: {0}")]
    Transport(String),
}

/// Submit-and-get-an-id boundary around the host's upload/persist flow.
/// The editor treats any failure as recoverable and leaves the local scene
/// untouched.
pub trait PublishSink {
    fn publish(&mut self, request: &PublishRequest) -> Result<PublishId, PublishError>;
}
