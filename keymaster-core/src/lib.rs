//! keymaster-core: domain types, backend client traits, and the catalog
//! state & search synchronization engine for the shortcut trainer.

use serde::{Deserialize, Serialize};

pub mod client;
mod error;
mod history;
mod search;
mod store;

pub use client::{CatalogClient, MemCatalog};
#[cfg(feature = "sqlite")]
pub use client::SqliteCatalog;
pub use error::ClientError;
pub use history::{HistoryStore, JsonHistoryStore, MemHistory, HISTORY_LIMIT};
pub use search::{SearchController, DEFAULT_DEBOUNCE, MAX_SUGGESTIONS};
pub use store::CatalogStore;

pub type ShortcutId = i64;

/// A single key combination tracked by the trainer. Only `learned` ever
/// changes after a shortcut is persisted; `id` is absent for records the
/// backend has not assigned yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Shortcut {
    pub id: Option<ShortcutId>,
    pub keys: String,
    pub description: String,
    pub category: String,
    pub app_name: String,
    pub learned: bool,
}

/// An application whose shortcuts are catalogued. `name` is the display
/// key; selection also carries the id so partially loaded state stays
/// addressable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Application {
    pub id: Option<i64>,
    pub name: String,
    pub icon: Option<String>,
}

/// A per-application grouping used only for client-side filtering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: Option<i64>,
    pub name: String,
    pub display_order: Option<i64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    History,
    Popular,
}

/// Candidate search string offered before the user commits a query.
/// Ephemeral: recomputed from its inputs, never persisted directly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchSuggestion {
    pub text: String,
    pub kind: SuggestionKind,
    pub count: Option<u32>,
}

/// Mastery metrics over the currently loaded (unfiltered) shortcut list.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Progress {
    pub learned: usize,
    pub total: usize,
    pub percentage: f64,
}
