//! TTS engine implementations

pub mod elevenlabs;

use crate::config::VoiceSettings;
use crate::error::SpeechError;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A voice offered by the remote provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub voice_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Trait for TTS engines
#[async_trait]
pub trait TtsEngine: Send + Sync {
    /// Synthesize text to speech audio
    async fn synthesize(&self, text: &str, voice: &VoiceSettings) -> Result<Bytes, SpeechError>;

    async fn list_voices(&self) -> Result<Vec<Voice>, SpeechError>;

    /// Check if engine is usable (credentials present etc.)
    fn is_available(&self) -> bool;

    fn name(&self) -> &str;
}
