//! ElevenLabs text-to-speech engine
//!
//! One request per call, no retries. Callers decide what a failure means.

use crate::config::{ApiConfig, VoiceSettings};
use crate::engines::{TtsEngine, Voice};
use crate::error::SpeechError;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

const API_KEY_HEADER: &str = "xi-api-key";

pub struct ElevenLabsEngine {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model_id: String,
    timeout: Duration,
}

#[derive(Deserialize)]
struct VoicesResponse {
    #[serde(default)]
    voices: Vec<Voice>,
}

impl ElevenLabsEngine {
    /// Build from config, resolving the key from the environment if needed.
    pub fn new(api: &ApiConfig) -> Result<Self, SpeechError> {
        Self::with_key(api, api.resolve_api_key())
    }

    pub fn with_key(api: &ApiConfig, api_key: Option<String>) -> Result<Self, SpeechError> {
        let timeout = Duration::from_secs(api.timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SpeechError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            model_id: api.model_id.clone(),
            timeout,
        })
    }

    fn key(&self) -> Result<&str, SpeechError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| SpeechError::Unavailable("ElevenLabs API key not provided".to_string()))
    }

    async fn error_from_response(response: reqwest::Response) -> SpeechError {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        warn!(status, "ElevenLabs request failed");
        SpeechError::Api { status, body }
    }
}

#[async_trait]
impl TtsEngine for ElevenLabsEngine {
    async fn synthesize(&self, text: &str, voice: &VoiceSettings) -> Result<Bytes, SpeechError> {
        let key = self.key()?;
        let url = format!("{}/text-to-speech/{}", self.base_url, voice.voice_id);

        let body = json!({
            "text": text,
            "model_id": self.model_id,
            "voice_settings": {
                "stability": voice.stability,
                "similarity_boost": voice.similarity_boost,
            },
        });

        debug!(voice_id = %voice.voice_id, chars = text.chars().count(), "Requesting synthesis");

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, key)
            .header("Content-Type", "application/json")
            .header("Accept", "audio/mpeg")
            .json(&body)
            .send()
            .await
            .map_err(|e| SpeechError::from_reqwest(e, self.timeout))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| SpeechError::from_reqwest(e, self.timeout))?;

        if audio.is_empty() {
            return Err(SpeechError::Synthesis("API returned empty audio".to_string()));
        }

        Ok(audio)
    }

    async fn list_voices(&self) -> Result<Vec<Voice>, SpeechError> {
        let key = self.key()?;
        let url = format!("{}/voices", self.base_url);

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, key)
            .send()
            .await
            .map_err(|e| SpeechError::from_reqwest(e, self.timeout))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let parsed: VoicesResponse = response
            .json()
            .await
            .map_err(|e| SpeechError::Synthesis(format!("Failed to parse voices response: {}", e)))?;

        Ok(parsed.voices)
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    fn name(&self) -> &str {
        "ElevenLabs"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_trailing_slash() {
        let api = ApiConfig {
            base_url: "https://api.elevenlabs.io/v1/".into(),
            ..Default::default()
        };
        let engine = ElevenLabsEngine::with_key(&api, Some("k".into())).unwrap();
        assert_eq!(engine.base_url, "https://api.elevenlabs.io/v1");
        assert!(engine.is_available());
    }

    #[test]
    fn test_missing_key_is_unavailable() {
        let engine = ElevenLabsEngine::with_key(&ApiConfig::default(), None).unwrap();
        assert!(!engine.is_available());

        let engine = ElevenLabsEngine::with_key(&ApiConfig::default(), Some(String::new())).unwrap();
        assert!(!engine.is_available());
    }

    #[tokio::test]
    async fn test_synthesize_without_key_fails_fast() {
        let engine = ElevenLabsEngine::with_key(&ApiConfig::default(), None).unwrap();
        let err = engine
            .synthesize("hello", &VoiceSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SpeechError::Unavailable(_)));
    }
}
