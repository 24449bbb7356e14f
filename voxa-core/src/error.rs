use thiserror::Error;

/// Failure taxonomy shared by every voxa crate.
///
/// The four user-facing kinds map one-to-one onto how the chat widget
/// degrades: validation problems are reported inline, synthesis failures are
/// swallowed, query failures become a generic assistant reply and capture
/// failures simply hide the voice feature.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Capture error: {0}")]
    Capture(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable machine-readable code, used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::Synthesis(_) => "SYNTHESIS_ERROR",
            Error::Query(_) => "QUERY_ERROR",
            Error::Capture(_) => "CAPTURE_ERROR",
            Error::Configuration(_) => "CONFIGURATION_ERROR",
            Error::Serialization(_) => "SERIALIZATION_ERROR",
            Error::Io(_) => "IO_ERROR",
        }
    }

    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Error::Validation(_) | Error::Synthesis(_) | Error::Query(_) | Error::Capture(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
