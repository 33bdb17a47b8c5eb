//! Search controller: debounced free-text search with a ranked,
//! deduplicated suggestion feed and persisted query history.

use std::time::Duration;

use tokio::time::Instant;
use tracing::warn;

use crate::client::CatalogClient;
use crate::history::{HistoryStore, HISTORY_LIMIT};
use crate::store::CatalogStore;
use crate::{SearchSuggestion, Shortcut, SuggestionKind};

/// Trailing-edge debounce delay applied to keystrokes.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Suggestion panel cap.
pub const MAX_SUGGESTIONS: usize = 8;

/// Fixed popularity table for common shortcut queries. Counts are display
/// hints, not live statistics.
const POPULAR_TERMS: &[(&str, u32)] = &[
    ("copy", 5),
    ("paste", 4),
    ("save", 6),
    ("undo", 3),
    ("navigation", 8),
    ("window", 7),
];

/// The single cancellable unit of work: clearing it before the deadline
/// means the associated search never fires. In-flight requests are never
/// aborted here; the store discards superseded responses instead.
struct DebounceTimer {
    deadline: Instant,
    text: String,
}

/// Owns the raw query text, the pending debounce timer, and the
/// suggestion feed. Drives the store's search entry point and never
/// mutates any other store state.
pub struct SearchController<H> {
    history_store: H,
    history: Vec<String>,
    value: String,
    timer: Option<DebounceTimer>,
    delay: Duration,
    suggestions: Vec<SearchSuggestion>,
    panel_open: bool,
}

impl<H: HistoryStore> SearchController<H> {
    /// History is read once at startup; an unreadable store degrades to
    /// an empty history rather than surfacing an error.
    pub fn new(history_store: H) -> Self {
        Self::with_delay(history_store, DEFAULT_DEBOUNCE)
    }

    pub fn with_delay(history_store: H, delay: Duration) -> Self {
        let history = history_store.load().unwrap_or_else(|err| {
            warn!("failed to load search history: {err}");
            Vec::new()
        });
        Self {
            history_store,
            history,
            value: String::new(),
            timer: None,
            delay,
            suggestions: Vec::new(),
            panel_open: false,
        }
    }

    // --- reads ---

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_debouncing(&self) -> bool {
        self.timer.is_some()
    }

    pub fn panel_open(&self) -> bool {
        self.panel_open
    }

    pub fn suggestions(&self) -> &[SearchSuggestion] {
        &self.suggestions
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Deadline of the pending timer, if any. Drivers sleep until this
    /// instant and then call [`fire_due`](Self::fire_due).
    pub fn deadline(&self) -> Option<Instant> {
        self.timer.as_ref().map(|t| t.deadline)
    }

    // --- input events ---

    /// A keystroke: restart the debounce timer with the new text and
    /// recompute suggestions against the currently loaded shortcuts.
    /// Only one timer is ever pending; each keystroke replaces it.
    pub fn input_changed(&mut self, text: &str, shortcuts: &[Shortcut]) {
        self.value = text.to_string();
        self.panel_open = true;
        self.timer = Some(DebounceTimer {
            deadline: Instant::now() + self.delay,
            text: text.to_string(),
        });
        self.refresh_suggestions(shortcuts);
    }

    /// Recompute the suggestion feed without touching the timer. Called
    /// when an input of the feed (loaded shortcuts, history) changes.
    pub fn refresh_suggestions(&mut self, shortcuts: &[Shortcut]) {
        self.suggestions = self.suggest(shortcuts);
    }

    pub fn open_panel(&mut self) {
        self.panel_open = true;
    }

    pub fn close_panel(&mut self) {
        self.panel_open = false;
    }

    /// Tear-down: drop any pending timer without firing it.
    pub fn cancel(&mut self) {
        self.timer = None;
    }

    // --- firing paths ---

    /// Fire the pending timer if its deadline has passed. Returns true
    /// when a search was issued.
    pub async fn fire_due<C: CatalogClient>(&mut self, store: &CatalogStore<C>) -> bool {
        let due = match &self.timer {
            Some(t) => t.deadline <= Instant::now(),
            None => false,
        };
        if !due {
            return false;
        }
        let text = self.timer.take().map(|t| t.text).unwrap_or_default();
        self.fire(&text, store).await;
        true
    }

    /// Accept key: adopt the first suggestion when the panel is open and
    /// non-empty, otherwise commit the raw input. Either way the pending
    /// timer is cancelled and the search fires immediately.
    pub async fn accept<C: CatalogClient>(&mut self, store: &CatalogStore<C>) {
        let text = if self.panel_open && !self.suggestions.is_empty() {
            self.suggestions[0].text.clone()
        } else {
            self.value.clone()
        };
        self.value = text.clone();
        self.timer = None;
        self.panel_open = false;
        self.fire(&text, store).await;
    }

    /// Click on a suggestion: adopt its text and fire immediately.
    pub async fn choose<C: CatalogClient>(&mut self, text: &str, store: &CatalogStore<C>) {
        self.value = text.to_string();
        self.timer = None;
        self.panel_open = false;
        self.fire(text, store).await;
    }

    /// Explicit clear: empty the input and fire a blank search, which the
    /// store resolves as a full reload of the current application.
    pub async fn clear<C: CatalogClient>(&mut self, store: &CatalogStore<C>) {
        self.value.clear();
        self.timer = None;
        self.panel_open = false;
        self.fire("", store).await;
    }

    async fn fire<C: CatalogClient>(&mut self, text: &str, store: &CatalogStore<C>) {
        store.search_shortcuts(text).await;
        if !text.trim().is_empty() {
            self.record_history(text);
        }
    }

    /// Prepend, drop any identical prior entry (case-sensitive), cap at
    /// [`HISTORY_LIMIT`], and write through. Write failures are logged
    /// and otherwise ignored.
    fn record_history(&mut self, query: &str) {
        self.history.retain(|h| h != query);
        self.history.insert(0, query.to_string());
        self.history.truncate(HISTORY_LIMIT);
        if let Err(err) = self.history_store.save(&self.history) {
            warn!("failed to save search history: {err}");
        }
    }

    // --- suggestions ---

    /// Blank input shows the history. Otherwise candidates come from the
    /// popular-term table, then the loaded shortcuts, then the history,
    /// matched case-insensitively by substring, deduplicated keeping the
    /// first occurrence, capped at [`MAX_SUGGESTIONS`].
    fn suggest(&self, shortcuts: &[Shortcut]) -> Vec<SearchSuggestion> {
        let input = self.value.trim();
        if input.is_empty() {
            return self
                .history
                .iter()
                .take(HISTORY_LIMIT)
                .map(|text| SearchSuggestion {
                    text: text.clone(),
                    kind: SuggestionKind::History,
                    count: None,
                })
                .collect();
        }

        let needle = input.to_lowercase();
        let mut candidates = Vec::new();
        for (term, count) in POPULAR_TERMS {
            if term.contains(&needle) {
                candidates.push(SearchSuggestion {
                    text: (*term).to_string(),
                    kind: SuggestionKind::Popular,
                    count: Some(*count),
                });
            }
        }
        for sc in shortcuts {
            if sc.keys.to_lowercase().contains(&needle)
                || sc.description.to_lowercase().contains(&needle)
                || sc.category.to_lowercase().contains(&needle)
            {
                candidates.push(SearchSuggestion {
                    text: sc.keys.clone(),
                    kind: SuggestionKind::Popular,
                    count: Some(1),
                });
            }
        }
        for item in &self.history {
            if item.to_lowercase().contains(&needle) {
                candidates.push(SearchSuggestion {
                    text: item.clone(),
                    kind: SuggestionKind::History,
                    count: None,
                });
            }
        }

        // First occurrence wins, so earlier sources outrank later ones.
        let mut seen: Vec<String> = Vec::new();
        let mut out = Vec::new();
        for cand in candidates {
            let key = cand.text.to_lowercase();
            if seen.contains(&key) {
                continue;
            }
            seen.push(key);
            out.push(cand);
            if out.len() == MAX_SUGGESTIONS {
                break;
            }
        }
        out
    }
}
