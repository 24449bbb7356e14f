//! Error types for voxa-spk

use std::time::Duration;
use thiserror::Error;
use voxa_core::Error as CoreError;

/// Speech synthesis errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpeechError {
    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("TTS API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Speech synthesis unavailable: {0}")]
    Unavailable(String),

    #[error("Speech synthesis timed out after {0:?}")]
    Timeout(Duration),
}

impl SpeechError {
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            SpeechError::Timeout(timeout)
        } else {
            SpeechError::Http(err.to_string())
        }
    }
}

impl From<SpeechError> for CoreError {
    fn from(err: SpeechError) -> Self {
        CoreError::Synthesis(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = SpeechError::Api {
            status: 401,
            body: "invalid key".into(),
        };
        assert_eq!(err.to_string(), "TTS API returned 401: invalid key");
    }

    #[test]
    fn test_maps_to_core_synthesis() {
        let core: CoreError = SpeechError::Timeout(Duration::from_secs(10)).into();
        assert_eq!(core.code(), "SYNTHESIS_ERROR");
    }
}
