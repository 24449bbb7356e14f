//! In-memory knowledge store
//!
//! Items live in an `Arc<Vec<_>>` behind a read-write lock. Mutations copy on
//! write when a `KnowledgeIter` still holds the previous snapshot, so listing
//! never blocks writers and never observes a half-applied batch.

use crate::error::KbError;
use crate::item::{FileDescriptor, FileItem, ItemId, KnowledgeItem, UrlItem};
use crate::query::{QueryMatch, QueryResult};
use crate::ranker::{RandomRanker, Ranker};
use crate::validation::validate_url;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeStats {
    pub total_items: usize,
    pub file_count: usize,
    pub url_count: usize,
    pub last_updated_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct StoreInner {
    items: Arc<Vec<KnowledgeItem>>,
    last_added_at: Option<DateTime<Utc>>,
}

impl StoreInner {
    /// Timestamps never go backwards in insertion order.
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_added_at {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_added_at = Some(ts);
        ts
    }
}

/// Session-scoped collection of knowledge sources.
pub struct KnowledgeStore {
    inner: RwLock<StoreInner>,
    ranker: Arc<dyn Ranker>,
}

impl Default for KnowledgeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for KnowledgeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeStore")
            .field("items", &self.len())
            .field("ranker", &self.ranker.name())
            .finish()
    }
}

impl KnowledgeStore {
    pub fn new() -> Self {
        Self::with_ranker(Arc::new(RandomRanker))
    }

    pub fn with_ranker(ranker: Arc<dyn Ranker>) -> Self {
        Self {
            inner: RwLock::new(StoreInner::default()),
            ranker,
        }
    }

    pub fn ranker_name(&self) -> &str {
        self.ranker.name()
    }

    /// Append one file item per descriptor. Returns the created items in
    /// input order.
    pub fn add_files(
        &self,
        files: impl IntoIterator<Item = FileDescriptor>,
    ) -> Vec<KnowledgeItem> {
        let mut inner = self.inner.write();
        let mut created = Vec::new();

        for file in files {
            let added_at = inner.next_timestamp();
            created.push(KnowledgeItem::File(FileItem {
                id: ItemId::generate(),
                name: file.name,
                mime_type: file.mime_type,
                size_bytes: file.size_bytes,
                added_at,
            }));
        }

        if !created.is_empty() {
            Arc::make_mut(&mut inner.items).extend(created.iter().cloned());
            debug!(count = created.len(), "Added file items");
        }

        created
    }

    /// Append URL items. Every URL is validated before anything is stored;
    /// one invalid entry rejects the whole batch.
    pub fn add_urls<I, S>(&self, urls: I) -> Result<Vec<KnowledgeItem>, KbError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut validated = Vec::new();
        for raw in urls {
            let raw = raw.as_ref();
            validate_url(raw)?;
            validated.push(raw.trim().to_string());
        }

        let mut inner = self.inner.write();
        let mut created = Vec::with_capacity(validated.len());
        for url in validated {
            let added_at = inner.next_timestamp();
            created.push(KnowledgeItem::Url(UrlItem {
                id: ItemId::generate(),
                url,
                added_at,
            }));
        }

        if !created.is_empty() {
            Arc::make_mut(&mut inner.items).extend(created.iter().cloned());
            debug!(count = created.len(), "Added URL items");
        }

        Ok(created)
    }

    /// Delete an item. Unknown ids are ignored; the return value only tells
    /// whether something was removed.
    pub fn remove(&self, id: &ItemId) -> bool {
        let mut inner = self.inner.write();
        let Some(pos) = inner.items.iter().position(|item| item.id() == id) else {
            debug!(id = %id, "Remove ignored, no such item");
            return false;
        };

        Arc::make_mut(&mut inner.items).remove(pos);
        debug!(id = %id, "Removed knowledge item");
        true
    }

    pub fn clear(&self) {
        let mut inner = self.inner.write();
        let count = inner.items.len();
        inner.items = Arc::new(Vec::new());
        info!(count, "Cleared knowledge store");
    }

    /// End-of-session reset. Same effect as `clear`.
    pub fn reset(&self) {
        self.clear();
    }

    pub fn query(&self, text: &str) -> Result<QueryResult, KbError> {
        let snapshot = self.snapshot();
        if snapshot.is_empty() {
            return Ok(QueryResult::empty(text));
        }

        let picks = self.ranker.rank(text, &snapshot);
        let mut matches = Vec::with_capacity(picks.len());
        for idx in picks {
            let item = snapshot.get(idx).ok_or_else(|| {
                KbError::Query(format!(
                    "ranker '{}' selected index {} of {} items",
                    self.ranker.name(),
                    idx,
                    snapshot.len()
                ))
            })?;
            matches.push(QueryMatch::from_item(item, text));
        }

        debug!(matches = matches.len(), ranker = self.ranker.name(), "Answered query");
        Ok(QueryResult {
            query: text.to_string(),
            matches,
        })
    }

    /// Iterate all items in insertion order. Each call starts over from the
    /// current contents.
    pub fn list(&self) -> KnowledgeIter {
        KnowledgeIter {
            items: self.snapshot(),
            pos: 0,
        }
    }

    pub fn get(&self, id: &ItemId) -> Option<KnowledgeItem> {
        self.inner
            .read()
            .items
            .iter()
            .find(|item| item.id() == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> KnowledgeStats {
        let inner = self.inner.read();
        let file_count = inner.items.iter().filter(|i| i.is_file()).count();
        KnowledgeStats {
            total_items: inner.items.len(),
            file_count,
            url_count: inner.items.len() - file_count,
            last_updated_at: inner.items.iter().map(KnowledgeItem::added_at).max(),
        }
    }

    fn snapshot(&self) -> Arc<Vec<KnowledgeItem>> {
        Arc::clone(&self.inner.read().items)
    }
}

/// Finite iterator over a store snapshot.
#[derive(Debug, Clone)]
pub struct KnowledgeIter {
    items: Arc<Vec<KnowledgeItem>>,
    pos: usize,
}

impl Iterator for KnowledgeIter {
    type Item = KnowledgeItem;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.items.get(self.pos)?.clone();
        self.pos += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.items.len().saturating_sub(self.pos);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for KnowledgeIter {}
