//! Error types for voxa-widget

use crate::chat::ChatState;
use thiserror::Error;
use voxa_core::Error as CoreError;
use voxa_sc::CaptureError;

/// Chat flow errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChatError {
    #[error("Chat is busy ({0})")]
    Busy(ChatState),

    #[error("Voice capture is not active")]
    NotListening,

    #[error(transparent)]
    Capture(#[from] CaptureError),
}

impl From<ChatError> for CoreError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Capture(e) => e.into(),
            other => CoreError::Validation(other.to_string()),
        }
    }
}
