//! Error types for a hand pong session

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The frame source could not be opened; the session never starts.
    #[error("camera not accessible ({source_name}): {reason}")]
    CameraUnavailable { source_name: String, reason: String },

    /// A frame could not be read mid-session.
    #[error("failed to get frame from camera: {0}")]
    FrameRead(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("hand tracker error: {0}")]
    Tracker(String),

    #[error("frame output error: {0}")]
    Sink(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

impl Error {
    /// True when the camera failed, either at open or mid-session.
    pub fn is_camera_failure(&self) -> bool {
        matches!(self, Error::CameraUnavailable { .. } | Error::FrameRead(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
