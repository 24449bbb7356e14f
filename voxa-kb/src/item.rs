//! Knowledge item model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque identifier of a knowledge item, unique for the store's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Metadata of an uploaded file, as reported by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

impl FileDescriptor {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size_bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileItem {
    pub id: ItemId,
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlItem {
    pub id: ItemId,
    pub url: String,
    pub added_at: DateTime<Utc>,
}

/// A file or URL registered as a context source for query answering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum KnowledgeItem {
    File(FileItem),
    Url(UrlItem),
}

impl KnowledgeItem {
    pub fn id(&self) -> &ItemId {
        match self {
            KnowledgeItem::File(f) => &f.id,
            KnowledgeItem::Url(u) => &u.id,
        }
    }

    /// File name or URL, used as the citation of query matches.
    pub fn label(&self) -> &str {
        match self {
            KnowledgeItem::File(f) => &f.name,
            KnowledgeItem::Url(u) => &u.url,
        }
    }

    pub fn added_at(&self) -> DateTime<Utc> {
        match self {
            KnowledgeItem::File(f) => f.added_at,
            KnowledgeItem::Url(u) => u.added_at,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, KnowledgeItem::File(_))
    }

    pub fn is_url(&self) -> bool {
        matches!(self, KnowledgeItem::Url(_))
    }
}
