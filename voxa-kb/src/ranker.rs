//! Source selection for knowledge queries
//!
//! A `Ranker` decides which stored items answer a query. The store only
//! guarantees it is called with a non-empty slice; the returned indices are
//! bounds-checked by the caller.

use crate::item::KnowledgeItem;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

pub trait Ranker: Send + Sync {
    fn name(&self) -> &str;

    /// Indices into `items` in relevance order.
    fn rank(&self, query: &str, items: &[KnowledgeItem]) -> Vec<usize>;
}

/// Picks one source uniformly at random.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomRanker;

impl Ranker for RandomRanker {
    fn name(&self) -> &str {
        "random"
    }

    fn rank(&self, _query: &str, items: &[KnowledgeItem]) -> Vec<usize> {
        if items.is_empty() {
            return Vec::new();
        }
        vec![rand::thread_rng().gen_range(0..items.len())]
    }
}

/// Always answers from the earliest item.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstRanker;

impl Ranker for FirstRanker {
    fn name(&self) -> &str {
        "first"
    }

    fn rank(&self, _query: &str, items: &[KnowledgeItem]) -> Vec<usize> {
        if items.is_empty() {
            Vec::new()
        } else {
            vec![0]
        }
    }
}

/// Scores items by how many query terms occur in their label.
#[derive(Debug, Clone, Copy)]
pub struct KeywordRanker {
    limit: usize,
}

impl KeywordRanker {
    pub fn new(limit: usize) -> Self {
        Self { limit: limit.max(1) }
    }
}

impl Default for KeywordRanker {
    fn default() -> Self {
        Self::new(3)
    }
}

fn terms(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 1)
        .map(|t| t.to_lowercase())
}

impl Ranker for KeywordRanker {
    fn name(&self) -> &str {
        "keyword"
    }

    fn rank(&self, query: &str, items: &[KnowledgeItem]) -> Vec<usize> {
        if items.is_empty() {
            return Vec::new();
        }

        let wanted: HashSet<String> = terms(query).collect();
        let mut scored: Vec<(usize, usize)> = items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                let label_terms: HashSet<String> = terms(item.label()).collect();
                (idx, wanted.intersection(&label_terms).count())
            })
            .filter(|(_, score)| *score > 0)
            .collect();

        if scored.is_empty() {
            return vec![0];
        }

        // stable: equal scores keep insertion order
        scored.sort_by(|a, b| b.1.cmp(&a.1));
        scored.into_iter().take(self.limit).map(|(idx, _)| idx).collect()
    }
}

/// Ranker selection in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankerKind {
    #[default]
    Random,
    Keyword,
    First,
}

impl RankerKind {
    pub fn build(self, keyword_limit: usize) -> Arc<dyn Ranker> {
        match self {
            RankerKind::Random => Arc::new(RandomRanker),
            RankerKind::Keyword => Arc::new(KeywordRanker::new(keyword_limit)),
            RankerKind::First => Arc::new(FirstRanker),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{FileItem, ItemId, UrlItem};
    use chrono::Utc;

    fn file(name: &str) -> KnowledgeItem {
        KnowledgeItem::File(FileItem {
            id: ItemId::generate(),
            name: name.into(),
            mime_type: "application/pdf".into(),
            size_bytes: 1,
            added_at: Utc::now(),
        })
    }

    fn url(url: &str) -> KnowledgeItem {
        KnowledgeItem::Url(UrlItem {
            id: ItemId::generate(),
            url: url.into(),
            added_at: Utc::now(),
        })
    }

    #[test]
    fn test_random_ranker_stays_in_bounds() {
        let items = vec![file("a.pdf"), file("b.pdf"), url("https://c.example")];
        for _ in 0..200 {
            let picks = RandomRanker.rank("anything", &items);
            assert_eq!(picks.len(), 1);
            assert!(picks[0] < items.len());
        }
    }

    #[test]
    fn test_rankers_return_nothing_for_empty_input() {
        assert!(RandomRanker.rank("q", &[]).is_empty());
        assert!(FirstRanker.rank("q", &[]).is_empty());
        assert!(KeywordRanker::default().rank("q", &[]).is_empty());
    }

    #[test]
    fn test_keyword_ranker_prefers_overlap() {
        let items = vec![
            file("shipping-times.pdf"),
            file("refund-policy.pdf"),
            url("https://shop.example/refund"),
        ];
        let picks = KeywordRanker::new(2).rank("What is the refund policy?", &items);
        assert_eq!(picks, vec![1, 2]);
    }

    #[test]
    fn test_keyword_ranker_falls_back_to_first_item() {
        let items = vec![file("handbook.pdf"), file("pricing.pdf")];
        assert_eq!(KeywordRanker::default().rank("weather", &items), vec![0]);
    }

    #[test]
    fn test_ranker_kind_parses_lowercase() {
        let kind: RankerKind = serde_json::from_str("\"keyword\"").unwrap();
        assert_eq!(kind, RankerKind::Keyword);
        assert_eq!(kind.build(2).name(), "keyword");
        assert_eq!(RankerKind::default().build(1).name(), "random");
    }
}
