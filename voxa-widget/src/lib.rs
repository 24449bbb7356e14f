//! voxa-widget: the user-facing half of voxa
//!
//! Chat flow over a shared knowledge store, embed snippet generation for the
//! three supported host formats, the loader bootstrap script and the
//! dashboard model.

pub mod chat;
pub mod config;
pub mod dashboard;
pub mod embed;
pub mod error;
pub mod loader;

pub use chat::{
    ChatConfig, ChatSession, ChatState, Exchange, Role, Transcript, Turn, TurnStatus,
    ERROR_REPLY, NO_MATCH_REPLY,
};
pub use config::{Position, Theme, WidgetConfig};
pub use dashboard::{
    Analytics, AnalyticsSource, Dashboard, DashboardSnapshot, MockAnalytics, SettingsForm,
};
pub use embed::{generate, generate_with, EmbedFormat, EmbedOptions};
pub use error::ChatError;
pub use loader::{render_loader_script, LoaderConfig, LoaderOptions, ThemePalette};
