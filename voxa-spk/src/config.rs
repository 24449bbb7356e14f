//! Configuration for speech synthesis

use serde::{Deserialize, Serialize};
use url::Url;
use voxa_core::config::env_var;

pub const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io/v1";
pub const DEFAULT_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";
pub const DEFAULT_MODEL_ID: &str = "eleven_monolingual_v1";
pub const API_KEY_ENV: &str = "ELEVENLABS_API_KEY";
pub const VOICE_ID_ENV: &str = "ELEVENLABS_VOICE_ID";

/// Speech synthesis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Replies are spoken only when enabled
    pub enabled: bool,

    pub api: ApiConfig,

    /// Default voice used by `speak`
    pub voice: VoiceSettings,

    pub enable_cache: bool,

    /// Cached clips kept before the oldest are evicted
    pub max_cache_entries: usize,

    /// Synthesis requests allowed in flight at once
    pub max_concurrent_requests: usize,
}

/// Remote TTS API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,

    /// Falls back to `ELEVENLABS_API_KEY` when unset
    pub api_key: Option<String>,

    pub model_id: String,

    pub timeout_secs: u64,
}

/// Voice selection and tuning sent with every request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceSettings {
    pub voice_id: String,
    pub stability: f32,
    pub similarity_boost: f32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api: ApiConfig::default(),
            voice: VoiceSettings::default(),
            enable_cache: true,
            max_cache_entries: 256,
            max_concurrent_requests: 4,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            model_id: DEFAULT_MODEL_ID.to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            voice_id: DEFAULT_VOICE_ID.to_string(),
            stability: 0.5,
            similarity_boost: 0.5,
        }
    }
}

impl ApiConfig {
    /// Configured key, or the environment fallback.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .or_else(|| env_var(API_KEY_ENV))
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.len() > 2048 {
            return Err("API base URL too long (max 2048 chars)".to_string());
        }

        let url = Url::parse(&self.base_url)
            .map_err(|e| format!("Invalid API base URL '{}': {}", self.base_url, e))?;

        // plain http is only tolerated for local stubs
        let loopback = matches!(url.host_str(), Some("localhost") | Some("127.0.0.1"));
        if url.scheme() != "https" && !(url.scheme() == "http" && loopback) {
            return Err("API base URL must use HTTPS".to_string());
        }

        if self.model_id.is_empty() || self.model_id.len() > 256 {
            return Err("Model id must be 1-256 characters".to_string());
        }
        if self.model_id.chars().any(|c| c.is_control()) {
            return Err("Model id contains invalid characters".to_string());
        }

        if self.timeout_secs == 0 {
            return Err("API timeout must be greater than 0".to_string());
        }
        if self.timeout_secs > 300 {
            return Err("API timeout too large (max 300 seconds)".to_string());
        }

        Ok(())
    }
}

impl VoiceSettings {
    pub fn validate(&self) -> Result<(), String> {
        validate_voice_id(&self.voice_id)?;

        if !(0.0..=1.0).contains(&self.stability) {
            return Err("Stability must be between 0.0 and 1.0".to_string());
        }
        if !(0.0..=1.0).contains(&self.similarity_boost) {
            return Err("Similarity boost must be between 0.0 and 1.0".to_string());
        }

        Ok(())
    }

    /// Same tuning with another voice.
    pub fn with_voice(&self, voice_id: &str) -> Self {
        Self {
            voice_id: voice_id.to_string(),
            ..self.clone()
        }
    }
}

/// Voice ids end up in the request path, so only ASCII alphanumerics,
/// `-` and `_` are allowed.
pub fn validate_voice_id(voice_id: &str) -> Result<(), String> {
    if voice_id.is_empty() {
        return Err("Voice id cannot be empty".to_string());
    }
    if voice_id.len() > 128 {
        return Err("Voice id too long (max 128 chars)".to_string());
    }
    if !voice_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(format!("Voice id '{}' contains invalid characters", voice_id));
    }
    Ok(())
}

impl SpeechConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.api.validate()?;
        self.voice.validate()?;

        if self.max_concurrent_requests == 0 {
            return Err("max_concurrent_requests must be greater than 0".to_string());
        }
        if self.max_concurrent_requests > 1000 {
            return Err("max_concurrent_requests too large (max 1000)".to_string());
        }
        if self.enable_cache && self.max_cache_entries == 0 {
            return Err("max_cache_entries must be greater than 0 when caching".to_string());
        }

        Ok(())
    }

    /// Apply `ELEVENLABS_API_KEY` / `ELEVENLABS_VOICE_ID` overrides.
    pub fn apply_env(&mut self) {
        if let Some(key) = env_var(API_KEY_ENV) {
            self.api.api_key = Some(key);
        }
        if let Some(voice) = env_var(VOICE_ID_ENV) {
            self.voice.voice_id = voice;
        }
    }
}
