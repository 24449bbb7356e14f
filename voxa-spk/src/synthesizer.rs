//! Speech synthesizer with caching and request limiting

use crate::config::{validate_voice_id, SpeechConfig, VoiceSettings};
use crate::engines::elevenlabs::ElevenLabsEngine;
use crate::engines::{TtsEngine, Voice};
use crate::error::SpeechError;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info};

/// Longest reply text accepted for synthesis, in characters.
pub const MAX_TEXT_CHARS: usize = 5_000;

/// Anything that can turn reply text into audio.
#[async_trait]
pub trait Speaker: Send + Sync {
    async fn speak(&self, text: &str) -> Result<Bytes, SpeechError>;
}

pub struct SpeechSynthesizer {
    config: Arc<SpeechConfig>,
    engine: Arc<dyn TtsEngine>,
    cache: RwLock<HashMap<String, CachedAudio>>,
    permits: Semaphore,
}

#[derive(Clone)]
struct CachedAudio {
    audio: Bytes,
    inserted_at: DateTime<Utc>,
}

impl SpeechSynthesizer {
    /// Build a synthesizer backed by the ElevenLabs engine.
    pub fn new(config: SpeechConfig) -> Result<Self, SpeechError> {
        if !config.enabled {
            return Err(SpeechError::Config("Speech synthesis is disabled".to_string()));
        }

        let engine = ElevenLabsEngine::new(&config.api)?;
        if !engine.is_available() {
            return Err(SpeechError::Unavailable(
                "ElevenLabs API key not provided".to_string(),
            ));
        }

        Self::with_engine(config, Arc::new(engine))
    }

    pub fn with_engine(
        config: SpeechConfig,
        engine: Arc<dyn TtsEngine>,
    ) -> Result<Self, SpeechError> {
        config.validate().map_err(SpeechError::Config)?;

        info!(engine = engine.name(), voice = %config.voice.voice_id, "Speech synthesizer ready");
        Ok(Self {
            permits: Semaphore::new(config.max_concurrent_requests),
            config: Arc::new(config),
            engine,
            cache: RwLock::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &SpeechConfig {
        &self.config
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Synthesize with the configured default voice.
    pub async fn speak(&self, text: &str) -> Result<Bytes, SpeechError> {
        self.speak_with_settings(text, &self.config.voice).await
    }

    pub async fn speak_with_voice(&self, text: &str, voice_id: &str) -> Result<Bytes, SpeechError> {
        validate_voice_id(voice_id).map_err(SpeechError::Synthesis)?;
        let settings = self.config.voice.with_voice(voice_id);
        self.speak_with_settings(text, &settings).await
    }

    pub async fn voices(&self) -> Result<Vec<Voice>, SpeechError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| SpeechError::Synthesis(format!("Failed to acquire permit: {}", e)))?;
        self.engine.list_voices().await
    }

    async fn speak_with_settings(
        &self,
        text: &str,
        voice: &VoiceSettings,
    ) -> Result<Bytes, SpeechError> {
        validate_text(text)?;

        let key = cache_key(text, voice);
        if self.config.enable_cache {
            if let Some(hit) = self.cache.read().get(&key) {
                debug!(voice_id = %voice.voice_id, "Synthesis cache hit");
                return Ok(hit.audio.clone());
            }
        }

        // Waits while the limit of in-flight requests is reached
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| SpeechError::Synthesis(format!("Failed to acquire permit: {}", e)))?;

        let audio = self.engine.synthesize(text, voice).await?;

        if self.config.enable_cache {
            self.store(key, audio.clone());
        }

        Ok(audio)
    }

    fn store(&self, key: String, audio: Bytes) {
        let mut cache = self.cache.write();
        cache.insert(
            key,
            CachedAudio {
                audio,
                inserted_at: Utc::now(),
            },
        );

        while cache.len() > self.config.max_cache_entries {
            let oldest = cache
                .iter()
                .min_by_key(|(_, entry)| entry.inserted_at)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(k) => {
                    cache.remove(&k);
                }
                None => break,
            }
        }
    }

    pub fn cache_len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn clear_cache(&self) {
        self.cache.write().clear();
    }

    /// Requests currently holding a permit.
    pub fn in_flight(&self) -> usize {
        self.config
            .max_concurrent_requests
            .saturating_sub(self.permits.available_permits())
    }
}

#[async_trait]
impl Speaker for SpeechSynthesizer {
    async fn speak(&self, text: &str) -> Result<Bytes, SpeechError> {
        SpeechSynthesizer::speak(self, text).await
    }
}

fn validate_text(text: &str) -> Result<(), SpeechError> {
    if text.trim().is_empty() {
        return Err(SpeechError::Synthesis("Text cannot be empty".to_string()));
    }
    if text.contains('\0') {
        return Err(SpeechError::Synthesis("Text contains null bytes".to_string()));
    }
    if text.chars().count() > MAX_TEXT_CHARS {
        return Err(SpeechError::Synthesis(format!(
            "Text too long (max {} characters)",
            MAX_TEXT_CHARS
        )));
    }
    Ok(())
}

fn cache_key(text: &str, voice: &VoiceSettings) -> String {
    let mut hasher = Sha256::new();
    hasher.update(voice.voice_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(voice.stability.to_le_bytes());
    hasher.update(voice.similarity_boost.to_le_bytes());
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
