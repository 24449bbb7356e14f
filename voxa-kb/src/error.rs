//! Error types for voxa-kb

use voxa_core::Error as CoreError;
use thiserror::Error;

/// Knowledge store errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KbError {
    #[error("Invalid URL: {url}")]
    InvalidUrl { url: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<KbError> for CoreError {
    fn from(err: KbError) -> Self {
        match err {
            KbError::InvalidUrl { .. } | KbError::Validation(_) => {
                CoreError::Validation(err.to_string())
            }
            KbError::Query(msg) => CoreError::Query(msg),
            KbError::Config(msg) => CoreError::Configuration(msg),
        }
    }
}
