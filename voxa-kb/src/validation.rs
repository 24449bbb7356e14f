//! Caller-side validation of knowledge sources
//!
//! The store itself accepts any descriptor. Uploads go through a
//! `FilePolicy` first, which rejects only the offending files and lets the
//! rest of the batch through.

use crate::error::KbError;
use crate::item::FileDescriptor;
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectionReason {
    TooLarge { limit_bytes: u64 },
    UnsupportedType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRejection {
    pub file: FileDescriptor,
    #[serde(flatten)]
    pub reason: RejectionReason,
    pub message: String,
}

impl FileRejection {
    fn new(file: FileDescriptor, reason: RejectionReason) -> Self {
        let message = match &reason {
            RejectionReason::TooLarge { limit_bytes } => format!(
                "File {} exceeds the {}MB limit.",
                file.name,
                limit_bytes / (1024 * 1024)
            ),
            RejectionReason::UnsupportedType => format!(
                "File {} is not a supported format (PDF, DOCX, TXT).",
                file.name
            ),
        };
        Self { file, reason, message }
    }
}

/// Size and type limits for uploaded files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePolicy {
    pub max_file_size_bytes: u64,
    /// A MIME type is accepted when it contains any of these fragments.
    pub allowed_mime_fragments: Vec<String>,
}

impl Default for FilePolicy {
    fn default() -> Self {
        Self {
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            allowed_mime_fragments: default_mime_fragments(),
        }
    }
}

pub fn default_mime_fragments() -> Vec<String> {
    vec!["pdf".to_string(), "word".to_string(), "text/plain".to_string()]
}

impl FilePolicy {
    pub fn check(&self, file: &FileDescriptor) -> Result<(), RejectionReason> {
        let mime = file.mime_type.to_ascii_lowercase();
        if !self
            .allowed_mime_fragments
            .iter()
            .any(|fragment| mime.contains(fragment.as_str()))
        {
            return Err(RejectionReason::UnsupportedType);
        }

        if file.size_bytes > self.max_file_size_bytes {
            return Err(RejectionReason::TooLarge {
                limit_bytes: self.max_file_size_bytes,
            });
        }

        Ok(())
    }

    /// Split a batch into accepted files and per-file rejections, keeping
    /// input order on both sides.
    pub fn partition(
        &self,
        files: impl IntoIterator<Item = FileDescriptor>,
    ) -> (Vec<FileDescriptor>, Vec<FileRejection>) {
        let mut accepted = Vec::new();
        let mut rejected = Vec::new();

        for file in files {
            match self.check(&file) {
                Ok(()) => accepted.push(file),
                Err(reason) => rejected.push(FileRejection::new(file, reason)),
            }
        }

        (accepted, rejected)
    }
}

/// Parse a knowledge URL. Only absolute http(s) URLs with a host are accepted.
pub fn validate_url(raw: &str) -> Result<Url, KbError> {
    let trimmed = raw.trim();
    let invalid = || KbError::InvalidUrl {
        url: raw.to_string(),
    };

    let parsed = Url::parse(trimmed).map_err(|_| invalid())?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(invalid());
    }

    Ok(parsed)
}
