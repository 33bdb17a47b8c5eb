//! Catalog store: the authoritative in-memory view of shortcuts,
//! applications, and categories, reconciled against a backend client.

use std::sync::RwLock;

use tracing::{debug, warn};

use crate::client::CatalogClient;
use crate::{Application, Category, Progress, Shortcut};

/// Session state for the shortcut catalog. All mutation goes through the
/// async operations below; reads are cheap clones of the current state.
/// Lock scopes never span an await, so overlapping operations interleave
/// only at response boundaries and each response is applied atomically.
pub struct CatalogStore<C> {
    client: C,
    state: RwLock<CatalogState>,
}

#[derive(Default)]
struct CatalogState {
    shortcuts: Vec<Shortcut>,
    apps: Vec<Application>,
    categories: Vec<Category>,
    selected_app: String,
    selected_app_id: Option<i64>,
    selected_category: Option<String>,
    loading: bool,
    error: String,
    // Issue tokens for the two replaceable lists. A response is applied
    // only while its token is still the latest; superseded responses are
    // discarded on arrival.
    shortcut_epoch: u64,
    category_epoch: u64,
}

impl<C: CatalogClient> CatalogStore<C> {
    pub fn new(client: C) -> Self {
        let state = CatalogState {
            loading: true,
            ..Default::default()
        };
        Self {
            client,
            state: RwLock::new(state),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    // --- reads ---

    pub fn shortcuts(&self) -> Vec<Shortcut> {
        self.read(|s| s.shortcuts.clone())
    }

    pub fn applications(&self) -> Vec<Application> {
        self.read(|s| s.apps.clone())
    }

    pub fn categories(&self) -> Vec<Category> {
        self.read(|s| s.categories.clone())
    }

    pub fn selected_application(&self) -> (String, Option<i64>) {
        self.read(|s| (s.selected_app.clone(), s.selected_app_id))
    }

    pub fn selected_category(&self) -> Option<String> {
        self.read(|s| s.selected_category.clone())
    }

    pub fn is_loading(&self) -> bool {
        self.read(|s| s.loading)
    }

    /// User-visible error message; empty when there is none.
    pub fn error(&self) -> String {
        self.read(|s| s.error.clone())
    }

    /// Category projection over whichever base list is currently loaded,
    /// be that the per-application list or the latest search results.
    pub fn filtered_shortcuts(&self) -> Vec<Shortcut> {
        self.read(|s| match &s.selected_category {
            Some(cat) => s
                .shortcuts
                .iter()
                .filter(|sc| &sc.category == cat)
                .cloned()
                .collect(),
            None => s.shortcuts.clone(),
        })
    }

    /// Counts are always over the full loaded list, not the filtered one.
    pub fn learned_count(&self) -> usize {
        self.read(|s| s.shortcuts.iter().filter(|sc| sc.learned).count())
    }

    pub fn total_count(&self) -> usize {
        self.read(|s| s.shortcuts.len())
    }

    pub fn progress_percentage(&self) -> f64 {
        self.progress().percentage
    }

    pub fn progress(&self) -> Progress {
        self.read(|s| {
            let total = s.shortcuts.len();
            let learned = s.shortcuts.iter().filter(|sc| sc.learned).count();
            let percentage = if total > 0 {
                learned as f64 / total as f64 * 100.0
            } else {
                0.0
            };
            Progress {
                learned,
                total,
                percentage,
            }
        })
    }

    fn read<T>(&self, f: impl FnOnce(&CatalogState) -> T) -> T {
        f(&self.state.read().expect("poisoned"))
    }

    fn write<T>(&self, f: impl FnOnce(&mut CatalogState) -> T) -> T {
        f(&mut self.state.write().expect("poisoned"))
    }

    // --- operations ---

    /// Fetch the application list. A non-empty list with no prior
    /// selection auto-selects its first entry and loads that
    /// application's shortcuts and categories.
    pub async fn load_applications(&self) {
        match self.client.get_applications().await {
            Ok(apps) => {
                let auto_select = self.write(|s| {
                    s.apps = apps;
                    if s.apps.is_empty() {
                        // An empty catalog is not an error.
                        s.loading = false;
                        None
                    } else if s.selected_app.is_empty() {
                        let first = s.apps[0].clone();
                        s.selected_app = first.name.clone();
                        s.selected_app_id = first.id;
                        Some(first.id)
                    } else {
                        None
                    }
                });
                if let Some(app_id) = auto_select {
                    self.load_shortcuts(app_id).await;
                    self.load_categories(app_id).await;
                }
            }
            Err(err) => {
                warn!("failed to load applications: {err}");
                self.write(|s| {
                    s.error = "Failed to load applications".into();
                    s.loading = false;
                });
            }
        }
    }

    /// Replace the shortcut list with the backend's list for `app_id`, or
    /// for every application when absent. On failure the previous list
    /// stays visible and a user-facing error is set.
    pub async fn load_shortcuts(&self, app_id: Option<i64>) {
        let issued = self.write(|s| {
            s.loading = true;
            s.error.clear();
            s.shortcut_epoch += 1;
            s.shortcut_epoch
        });
        let result = self.client.get_shortcuts(app_id).await;
        self.write(|s| {
            if s.shortcut_epoch != issued {
                debug!("discarding superseded shortcut load for app {app_id:?}");
                return;
            }
            match result {
                Ok(list) => s.shortcuts = list,
                Err(err) => {
                    warn!("failed to load shortcuts: {err}");
                    s.error = "Failed to load shortcuts".into();
                }
            }
            s.loading = false;
        });
    }

    /// Category load failures are non-critical: the filter bar simply
    /// shows fewer options, so they are logged and swallowed.
    pub async fn load_categories(&self, app_id: Option<i64>) {
        let issued = self.write(|s| {
            s.category_epoch += 1;
            s.category_epoch
        });
        let result = self.client.get_categories(app_id).await;
        self.write(|s| {
            if s.category_epoch != issued {
                debug!("discarding superseded category load for app {app_id:?}");
                return;
            }
            match result {
                Ok(list) => s.categories = list,
                Err(err) => warn!("failed to load categories: {err}"),
            }
        });
    }

    /// Select an application and reload its shortcut and category lists.
    /// Changing the application always clears the category filter.
    pub async fn select_application(&self, name: &str, app_id: Option<i64>) {
        self.write(|s| {
            s.selected_app = name.to_string();
            s.selected_app_id = app_id;
            s.selected_category = None;
        });
        self.load_shortcuts(app_id).await;
        self.load_categories(app_id).await;
    }

    /// Purely local; never issues a network call.
    pub fn select_category(&self, category: Option<String>) {
        self.write(|s| s.selected_category = category);
    }

    /// Drop the category filter and reload the current application's list.
    pub async fn reset_filters(&self) {
        let app_id = self.write(|s| {
            s.selected_category = None;
            s.selected_app_id
        });
        self.load_shortcuts(app_id).await;
    }

    /// Confirm-then-apply: the local `learned` flag flips only after the
    /// backend acknowledges the update, so no rollback path exists.
    pub async fn toggle_learned(&self, shortcut_id: i64, current: bool) {
        match self.client.set_shortcut_learned(shortcut_id, !current).await {
            Ok(()) => self.write(|s| {
                if let Some(sc) = s
                    .shortcuts
                    .iter_mut()
                    .find(|sc| sc.id == Some(shortcut_id))
                {
                    sc.learned = !current;
                }
            }),
            Err(err) => {
                warn!("failed to update shortcut {shortcut_id}: {err}");
                self.write(|s| s.error = "Failed to update shortcut".into());
            }
        }
    }

    /// Server-side search scoped to the selected application. A blank
    /// query falls back to a full reload of the per-application list.
    pub async fn search_shortcuts(&self, query: &str) {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            let app_id = self.read(|s| s.selected_app_id);
            self.load_shortcuts(app_id).await;
            return;
        }
        let (issued, app_id) = self.write(|s| {
            s.loading = true;
            s.error.clear();
            s.shortcut_epoch += 1;
            (s.shortcut_epoch, s.selected_app_id)
        });
        let result = self.client.search_shortcuts(trimmed, app_id).await;
        self.write(|s| {
            if s.shortcut_epoch != issued {
                debug!("discarding superseded search for {trimmed:?}");
                return;
            }
            match result {
                Ok(list) => s.shortcuts = list,
                Err(err) => {
                    warn!("search failed: {err}");
                    s.error = "Failed to search shortcuts".into();
                }
            }
            s.loading = false;
        });
    }
}
