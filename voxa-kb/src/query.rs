//! Query results returned by the knowledge store

use crate::item::{ItemId, KnowledgeItem};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryMatch {
    pub source_id: ItemId,
    pub source_label: String,
    pub content: String,
}

impl QueryMatch {
    pub fn from_item(item: &KnowledgeItem, query: &str) -> Self {
        Self {
            source_id: item.id().clone(),
            source_label: item.label().to_string(),
            content: simulated_answer(item.label(), query),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    pub query: String,
    pub matches: Vec<QueryMatch>,
}

impl QueryResult {
    pub fn empty(query: &str) -> Self {
        Self {
            query: query.to_string(),
            matches: Vec::new(),
        }
    }

    pub fn best(&self) -> Option<&QueryMatch> {
        self.matches.first()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// Placeholder answer text citing the selected source.
pub fn simulated_answer(label: &str, query: &str) -> String {
    format!(
        "Based on information from \"{}\", the answer to your query about \"{}\" would be provided here. \
         This is a simulated response that would be generated from the actual content of your \
         knowledge base in a real implementation.",
        label, query
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_answer_mentions_label_and_query() {
        let text = simulated_answer("faq.pdf", "refund policy");
        assert!(text.starts_with("Based on information from \"faq.pdf\""));
        assert!(text.contains("\"refund policy\""));
        assert!(text.ends_with("in a real implementation."));
    }

    #[test]
    fn test_empty_result_has_no_best_match() {
        let result = QueryResult::empty("hello");
        assert!(result.is_empty());
        assert!(result.best().is_none());
        assert_eq!(result.query, "hello");
    }
}
