//! Knowledge store for the voxa chat widget
//!
//! Holds the files and URLs a session has registered and answers queries
//! with a templated response citing one of them.

pub mod config;
pub mod error;
pub mod item;
pub mod query;
pub mod ranker;
pub mod store;
pub mod validation;

pub use config::KnowledgeConfig;
pub use error::KbError;
pub use item::{FileDescriptor, FileItem, ItemId, KnowledgeItem, UrlItem};
pub use query::{QueryMatch, QueryResult};
pub use ranker::{FirstRanker, KeywordRanker, RandomRanker, Ranker, RankerKind};
pub use store::{KnowledgeIter, KnowledgeStats, KnowledgeStore};
pub use validation::{validate_url, FilePolicy, FileRejection, RejectionReason};
