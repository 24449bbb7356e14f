//! voxa-spk: text-to-speech for assistant replies
//!
//! - `TtsEngine` trait with an ElevenLabs implementation
//! - `SpeechSynthesizer` adding text validation, a bounded request queue and
//!   an audio cache
//! - `Speaker`, the narrow interface the chat flow depends on

pub mod config;
pub mod engines;
pub mod error;
pub mod synthesizer;

pub use config::{ApiConfig, SpeechConfig, VoiceSettings};
pub use engines::elevenlabs::ElevenLabsEngine;
pub use engines::{TtsEngine, Voice};
pub use error::SpeechError;
pub use synthesizer::{Speaker, SpeechSynthesizer, MAX_TEXT_CHARS};
