// Configuration document loading shared by the voxa crates

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::str::FromStr;

/// Maximum accepted size of a configuration document.
const MAX_DOCUMENT_BYTES: u64 = 1024 * 1024;

/// Parse a configuration document. JSON is tried first, then TOML.
pub fn parse_document<T: DeserializeOwned>(content: &str) -> Result<T> {
    let json_err = match serde_json::from_str::<T>(content) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    match toml::from_str::<T>(content) {
        Ok(value) => Ok(value),
        Err(toml_err) => Err(Error::Configuration(format!(
            "document is neither valid JSON ({}) nor valid TOML ({})",
            json_err,
            toml_err.message()
        ))),
    }
}

/// Read and parse a configuration file.
/// SECURITY: rejects paths with traversal sequences and oversized files
pub fn read_document<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let display = path.to_string_lossy();

    if display.contains("..") {
        return Err(Error::Configuration(format!(
            "Path traversal detected: '{}'",
            display
        )));
    }

    let metadata = std::fs::metadata(path)?;
    if metadata.len() > MAX_DOCUMENT_BYTES {
        return Err(Error::Configuration(format!(
            "Config file too large ({} bytes, max {})",
            metadata.len(),
            MAX_DOCUMENT_BYTES
        )));
    }

    let content = std::fs::read_to_string(path)?;
    parse_document(&content)
}

/// Environment variable, trimmed; empty values count as unset.
pub fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Environment variable parsed into `T`. Unparseable values are ignored.
pub fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    env_var(name).and_then(|v| v.parse().ok())
}
