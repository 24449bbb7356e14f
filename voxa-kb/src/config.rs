//! Knowledge store configuration

use crate::ranker::RankerKind;
use crate::store::KnowledgeStore;
use crate::validation::{default_mime_fragments, FilePolicy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeConfig {
    pub max_file_size_mb: u64,
    pub allowed_mime_fragments: Vec<String>,
    pub ranker: RankerKind,
    /// Upper bound on matches returned by the keyword ranker.
    pub keyword_limit: usize,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 10,
            allowed_mime_fragments: default_mime_fragments(),
            ranker: RankerKind::default(),
            keyword_limit: 3,
        }
    }
}

impl KnowledgeConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_file_size_mb == 0 {
            return Err("max_file_size_mb must be greater than 0".to_string());
        }
        if self.max_file_size_mb > 1024 {
            return Err("max_file_size_mb cannot exceed 1024".to_string());
        }
        if self.allowed_mime_fragments.is_empty() {
            return Err("allowed_mime_fragments cannot be empty".to_string());
        }
        if self
            .allowed_mime_fragments
            .iter()
            .any(|f| f.trim().is_empty())
        {
            return Err("allowed_mime_fragments cannot contain empty entries".to_string());
        }
        if self.keyword_limit == 0 {
            return Err("keyword_limit must be greater than 0".to_string());
        }
        Ok(())
    }

    pub fn policy(&self) -> FilePolicy {
        FilePolicy {
            max_file_size_bytes: self.max_file_size_mb * 1024 * 1024,
            allowed_mime_fragments: self
                .allowed_mime_fragments
                .iter()
                .map(|f| f.to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn build_store(&self) -> KnowledgeStore {
        KnowledgeStore::with_ranker(self.ranker.build(self.keyword_limit))
    }
}
