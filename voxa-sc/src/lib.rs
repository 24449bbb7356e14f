//! voxa-sc: voice capture for the chat widget
//!
//! Capture is modelled as an explicit `CaptureSession` that consumes results
//! from a `SpeechRecognizer`, keeps interim and committed text, restarts the
//! recognizer when a segment ends and can be stopped or cancelled at any time.

pub mod config;
pub mod error;
pub mod recognizer;
pub mod session;

pub use config::CaptureConfig;
pub use error::CaptureError;
pub use recognizer::{
    ChannelRecognizer, RecognitionEvent, RecognizerFeed, ScriptedRecognizer, SpeechRecognizer,
    UnavailableRecognizer,
};
pub use session::{CaptureSession, CaptureState};
