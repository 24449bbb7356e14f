//! Error types for voxa-sc

use thiserror::Error;
use voxa_core::Error as CoreError;

/// Voice capture errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Voice capture unavailable: {0}")]
    Unavailable(String),

    #[error("Microphone access denied: {0}")]
    Denied(String),

    #[error("Capture session already stopped")]
    AlreadyStopped,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<CaptureError> for CoreError {
    fn from(err: CaptureError) -> Self {
        match err {
            CaptureError::Config(msg) => CoreError::Configuration(msg),
            other => CoreError::Capture(other.to_string()),
        }
    }
}
