//! Dashboard model: knowledge listing, usage analytics and the settings form

use crate::config::WidgetConfig;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};
use voxa_core::{Error, Result};
use voxa_kb::{ItemId, KnowledgeItem, KnowledgeStats, KnowledgeStore};
use voxa_spk::config::{validate_voice_id, DEFAULT_VOICE_ID};

pub const TOP_QUERIES: [&str; 5] = [
    "How do I reset my password?",
    "What are your business hours?",
    "Do you offer refunds?",
    "How can I contact support?",
    "What payment methods do you accept?",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub total_interactions: u32,
    pub average_response_time_secs: f64,
    pub top_queries: Vec<String>,
    pub knowledge_base_size: usize,
}

/// Where dashboard usage numbers come from.
pub trait AnalyticsSource: Send + Sync {
    fn analytics(&self, knowledge_base_size: usize) -> Analytics;
}

/// Placeholder numbers until real interaction tracking exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockAnalytics;

impl AnalyticsSource for MockAnalytics {
    fn analytics(&self, knowledge_base_size: usize) -> Analytics {
        let mut rng = rand::thread_rng();
        let response: f64 = rng.gen_range(0.5..2.5);
        Analytics {
            total_interactions: rng.gen_range(0..1000),
            average_response_time_secs: (response * 100.0).round() / 100.0,
            top_queries: TOP_QUERIES.iter().map(|q| q.to_string()).collect(),
            knowledge_base_size,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub items: Vec<KnowledgeItem>,
    pub stats: KnowledgeStats,
    pub analytics: Analytics,
}

pub struct Dashboard {
    store: Arc<KnowledgeStore>,
    analytics: Arc<dyn AnalyticsSource>,
}

impl Dashboard {
    pub fn new(store: Arc<KnowledgeStore>) -> Self {
        Self::with_analytics(store, Arc::new(MockAnalytics))
    }

    pub fn with_analytics(store: Arc<KnowledgeStore>, analytics: Arc<dyn AnalyticsSource>) -> Self {
        Self { store, analytics }
    }

    pub fn snapshot(store: &KnowledgeStore, analytics: &dyn AnalyticsSource) -> DashboardSnapshot {
        let items: Vec<KnowledgeItem> = store.list().collect();
        let stats = store.stats();
        let analytics = analytics.analytics(items.len());
        DashboardSnapshot {
            items,
            stats,
            analytics,
        }
    }

    pub fn current(&self) -> DashboardSnapshot {
        Self::snapshot(&self.store, self.analytics.as_ref())
    }

    /// Removes from the store itself, so chat and listing agree.
    pub fn remove_item(&self, id: &ItemId) -> bool {
        let removed = self.store.remove(id);
        debug!(id = %id, removed, "Dashboard removed knowledge item");
        removed
    }

    pub fn clear(&self) {
        self.store.clear();
        info!("Knowledge base cleared from dashboard");
    }
}

/// In-memory dashboard settings. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsForm {
    #[serde(flatten)]
    pub widget: WidgetConfig,
    #[serde(default = "default_voice_id")]
    pub voice_id: String,
}

fn default_voice_id() -> String {
    DEFAULT_VOICE_ID.to_string()
}

impl Default for SettingsForm {
    fn default() -> Self {
        Self {
            widget: WidgetConfig::default(),
            voice_id: default_voice_id(),
        }
    }
}

impl SettingsForm {
    pub fn from_widget(widget: WidgetConfig) -> Self {
        Self {
            widget,
            voice_id: default_voice_id(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.widget.validate().map_err(Error::Validation)?;
        validate_voice_id(&self.voice_id).map_err(Error::Validation)?;
        Ok(())
    }

    /// Apply a partial camelCase document. Nothing changes unless the merged
    /// form is valid.
    pub fn update(&mut self, patch: Value) -> Result<()> {
        let overrides = match patch {
            Value::Object(map) => map,
            Value::Null => return Ok(()),
            _ => return Err(Error::Validation("Settings patch must be an object".to_string())),
        };

        let mut merged = match serde_json::to_value(&*self)? {
            Value::Object(map) => map,
            _ => return Err(Error::Serialization("settings form is not an object".to_string())),
        };
        for (key, value) in overrides {
            if !merged.contains_key(&key) {
                return Err(Error::Validation(format!("Unknown setting '{}'", key)));
            }
            merged.insert(key, value);
        }

        let next: SettingsForm = serde_json::from_value(Value::Object(merged))
            .map_err(|e| Error::Validation(format!("Invalid settings: {}", e)))?;
        next.validate()?;

        *self = next;
        debug!("Dashboard settings updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Theme;
    use serde_json::json;
    use voxa_kb::FileDescriptor;

    struct FixedAnalytics;

    impl AnalyticsSource for FixedAnalytics {
        fn analytics(&self, knowledge_base_size: usize) -> Analytics {
            Analytics {
                total_interactions: 7,
                average_response_time_secs: 1.25,
                top_queries: vec![],
                knowledge_base_size,
            }
        }
    }

    #[test]
    fn test_mock_analytics_ranges() {
        for _ in 0..200 {
            let a = MockAnalytics.analytics(3);
            assert!(a.total_interactions < 1000);
            assert!((0.5..=2.5).contains(&a.average_response_time_secs));
            let cents = a.average_response_time_secs * 100.0;
            assert!((cents - cents.round()).abs() < 1e-9);
            assert_eq!(a.top_queries.len(), 5);
            assert_eq!(a.top_queries[2], "Do you offer refunds?");
            assert_eq!(a.knowledge_base_size, 3);
        }
    }

    #[test]
    fn test_snapshot_and_remove() {
        let store = Arc::new(KnowledgeStore::new());
        let added = store.add_files(vec![
            FileDescriptor::new("a.pdf", "application/pdf", 1),
            FileDescriptor::new("b.txt", "text/plain", 1),
        ]);
        let dashboard = Dashboard::with_analytics(store.clone(), Arc::new(FixedAnalytics));

        let snap = dashboard.current();
        assert_eq!(snap.items.len(), 2);
        assert_eq!(snap.stats.total_items, 2);
        assert_eq!(snap.analytics.knowledge_base_size, 2);

        assert!(dashboard.remove_item(added[0].id()));
        assert_eq!(store.len(), 1);
        assert!(!dashboard.remove_item(added[0].id()));

        dashboard.clear();
        assert!(dashboard.current().items.is_empty());
    }

    #[test]
    fn test_settings_update_merges() {
        let mut form = SettingsForm::default();
        form.update(json!({ "theme": "dark", "voiceId": "abc_123" })).unwrap();
        assert_eq!(form.widget.theme, Theme::Dark);
        assert_eq!(form.voice_id, "abc_123");
        assert_eq!(form.widget.widget_title, "AI Assistant");
    }

    #[test]
    fn test_invalid_settings_leave_form_unchanged() {
        let mut form = SettingsForm::default();
        let before = form.clone();

        assert!(form.update(json!({ "primaryColor": "red" })).is_err());
        assert!(form.update(json!({ "voiceId": "bad id!" })).is_err());
        assert!(form.update(json!({ "position": "middle" })).is_err());
        assert!(form.update(json!({ "nonsense": 1 })).is_err());
        assert!(form.update(json!("string")).is_err());
        assert_eq!(form, before);
    }

    #[test]
    fn test_settings_serialize_flat() {
        let value = serde_json::to_value(SettingsForm::default()).unwrap();
        assert_eq!(value["voiceId"], "21m00Tcm4TlvDq8ikWAM");
        assert_eq!(value["primaryColor"], "#5c6bc0");
    }
}
