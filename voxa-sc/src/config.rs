//! Configuration for voice capture

use serde::{Deserialize, Serialize};

/// Voice capture configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Re-open the recognizer when a segment ends while still listening
    pub continuous: bool,

    /// Upper bound on automatic re-opens per session
    pub max_restarts: u32,

    /// Committed text beyond this many characters is dropped
    pub max_transcript_chars: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            continuous: true,
            max_restarts: 32,
            max_transcript_chars: 10_000,
        }
    }
}

impl CaptureConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_restarts > 10_000 {
            return Err("max_restarts too large (max 10000)".to_string());
        }
        if self.max_transcript_chars == 0 {
            return Err("max_transcript_chars must be greater than 0".to_string());
        }
        if self.max_transcript_chars > 1_000_000 {
            return Err("max_transcript_chars too large (max 1000000)".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CaptureConfig::default();
        assert!(config.continuous);
        assert_eq!(config.max_restarts, 32);
        assert_eq!(config.max_transcript_chars, 10_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let mut config = CaptureConfig::default();
        config.max_transcript_chars = 0;
        assert!(config.validate().is_err());

        config.max_transcript_chars = 100;
        config.max_restarts = 20_000;
        assert!(config.validate().is_err());
    }
}
