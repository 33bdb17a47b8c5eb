//! Backend catalog access: the async client trait, an in-memory fake with
//! fault injection, and the SQLite backend behind the `sqlite` feature.

use std::sync::RwLock;
use std::time::Duration;

use crate::{Application, Category, ClientError, Shortcut};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteCatalog;

/// Asynchronous request/response interface to the service that owns
/// persistent shortcut data. Every call resolves to either a full payload
/// or a backend error; implementations never partially apply a request.
#[allow(async_fn_in_trait)]
pub trait CatalogClient {
    async fn get_applications(&self) -> Result<Vec<Application>, ClientError>;
    async fn get_shortcuts(&self, app_id: Option<i64>) -> Result<Vec<Shortcut>, ClientError>;
    async fn get_categories(&self, app_id: Option<i64>) -> Result<Vec<Category>, ClientError>;
    async fn search_shortcuts(
        &self,
        query: &str,
        app_id: Option<i64>,
    ) -> Result<Vec<Shortcut>, ClientError>;
    async fn set_shortcut_learned(&self, shortcut_id: i64, learned: bool)
        -> Result<(), ClientError>;
}

/// In-memory catalog backend. Doubles as the substitutable test double:
/// it records every call it serves, can be told to fail, and can delay
/// responses to exercise out-of-order arrival.
#[derive(Default)]
pub struct MemCatalog {
    inner: RwLock<MemInner>,
}

#[derive(Default)]
struct MemInner {
    apps: Vec<Application>,
    categories: Vec<(Option<i64>, Category)>,
    shortcuts: Vec<Shortcut>,
    calls: Vec<String>,
    fail_with: Option<String>,
    latency: Duration,
}

impl MemCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_apps(&self, apps: Vec<Application>) {
        self.inner.write().expect("poisoned").apps = apps;
    }

    pub fn seed_categories(&self, app_id: Option<i64>, categories: Vec<Category>) {
        let mut inner = self.inner.write().expect("poisoned");
        inner
            .categories
            .extend(categories.into_iter().map(|c| (app_id, c)));
    }

    pub fn seed_shortcuts(&self, shortcuts: Vec<Shortcut>) {
        self.inner.write().expect("poisoned").shortcuts = shortcuts;
    }

    /// Every subsequent call fails with this message until cleared.
    pub fn fail_with<S: Into<String>>(&self, msg: S) {
        self.inner.write().expect("poisoned").fail_with = Some(msg.into());
    }

    pub fn clear_failure(&self) {
        self.inner.write().expect("poisoned").fail_with = None;
    }

    /// Delay applied to calls issued from now on, before they resolve.
    pub fn set_latency(&self, latency: Duration) {
        self.inner.write().expect("poisoned").latency = latency;
    }

    pub fn calls(&self) -> Vec<String> {
        self.inner.read().expect("poisoned").calls.clone()
    }

    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    /// Record the call and snapshot the injected latency/failure as they
    /// stand at issue time; the failure, if any, resolves after the
    /// latency like a real slow error would.
    fn begin(&self, call: String) -> (Duration, Option<String>) {
        let mut inner = self.inner.write().expect("poisoned");
        inner.calls.push(call);
        (inner.latency, inner.fail_with.clone())
    }

    async fn resolve(latency: Duration, fail: Option<String>) -> Result<(), ClientError> {
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        match fail {
            Some(msg) => Err(ClientError::backend(msg)),
            None => Ok(()),
        }
    }

    fn app_name_for(inner: &MemInner, app_id: i64) -> Option<String> {
        inner
            .apps
            .iter()
            .find(|a| a.id == Some(app_id))
            .map(|a| a.name.clone())
    }
}

fn fmt_id(app_id: Option<i64>) -> String {
    app_id.map(|v| v.to_string()).unwrap_or_else(|| "*".into())
}

fn matches_query(shortcut: &Shortcut, needle: &str) -> bool {
    shortcut.keys.to_lowercase().contains(needle)
        || shortcut.description.to_lowercase().contains(needle)
        || shortcut.category.to_lowercase().contains(needle)
}

impl CatalogClient for MemCatalog {
    async fn get_applications(&self) -> Result<Vec<Application>, ClientError> {
        let (latency, fail) = self.begin("get_applications".into());
        Self::resolve(latency, fail).await?;
        Ok(self.inner.read().expect("poisoned").apps.clone())
    }

    async fn get_shortcuts(&self, app_id: Option<i64>) -> Result<Vec<Shortcut>, ClientError> {
        let (latency, fail) = self.begin(format!("get_shortcuts({})", fmt_id(app_id)));
        Self::resolve(latency, fail).await?;
        let inner = self.inner.read().expect("poisoned");
        Ok(match app_id {
            Some(id) => {
                let name = Self::app_name_for(&inner, id);
                inner
                    .shortcuts
                    .iter()
                    .filter(|s| Some(&s.app_name) == name.as_ref())
                    .cloned()
                    .collect()
            }
            None => inner.shortcuts.clone(),
        })
    }

    async fn get_categories(&self, app_id: Option<i64>) -> Result<Vec<Category>, ClientError> {
        let (latency, fail) = self.begin(format!("get_categories({})", fmt_id(app_id)));
        Self::resolve(latency, fail).await?;
        let inner = self.inner.read().expect("poisoned");
        Ok(inner
            .categories
            .iter()
            .filter(|(owner, _)| app_id.is_none() || *owner == app_id)
            .map(|(_, c)| c.clone())
            .collect())
    }

    async fn search_shortcuts(
        &self,
        query: &str,
        app_id: Option<i64>,
    ) -> Result<Vec<Shortcut>, ClientError> {
        let (latency, fail) = self.begin(format!("search_shortcuts({query},{})", fmt_id(app_id)));
        Self::resolve(latency, fail).await?;
        let needle = query.to_lowercase();
        let inner = self.inner.read().expect("poisoned");
        let name = app_id.and_then(|id| Self::app_name_for(&inner, id));
        Ok(inner
            .shortcuts
            .iter()
            .filter(|s| name.as_ref().is_none_or(|n| &s.app_name == n))
            .filter(|s| matches_query(s, &needle))
            .cloned()
            .collect())
    }

    async fn set_shortcut_learned(
        &self,
        shortcut_id: i64,
        learned: bool,
    ) -> Result<(), ClientError> {
        let (latency, fail) = self.begin(format!("set_shortcut_learned({shortcut_id},{learned})"));
        Self::resolve(latency, fail).await?;
        let mut inner = self.inner.write().expect("poisoned");
        match inner
            .shortcuts
            .iter_mut()
            .find(|s| s.id == Some(shortcut_id))
        {
            Some(s) => {
                s.learned = learned;
                Ok(())
            }
            None => Err(ClientError::backend(format!(
                "no shortcut with id {shortcut_id}"
            ))),
        }
    }
}

#[cfg(feature = "sqlite")]
mod sqlite {
    use super::*;
    use include_dir::{include_dir, Dir};
    use rusqlite::{params, Connection};
    use std::path::Path;
    use std::sync::Mutex;

    static MIGRATIONS: Dir = include_dir!("$CARGO_MANIFEST_DIR/migrations");

    /// Catalog backend over a local SQLite database; plays the role the
    /// remote data service does in hosted deployments. Search uses plain
    /// LIKE matching over keys, description, and category.
    pub struct SqliteCatalog {
        conn: Mutex<Connection>,
    }

    impl SqliteCatalog {
        pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ClientError> {
            let conn = Connection::open(path.as_ref())?;
            conn.pragma_update(None, "foreign_keys", 1)?;
            let _ = conn.pragma_update(None, "journal_mode", "WAL");
            let catalog = Self {
                conn: Mutex::new(conn),
            };
            catalog.run_migrations()?;
            Ok(catalog)
        }

        fn run_migrations(&self) -> Result<(), ClientError> {
            let conn = self.conn.lock().expect("poisoned");
            let current: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
            let mut files: Vec<_> = MIGRATIONS
                .files()
                .filter(|f| f.path().extension().map(|e| e == "sql").unwrap_or(false))
                .collect();
            files.sort_by_key(|f| f.path().to_path_buf());
            for file in files {
                let name = file
                    .path()
                    .file_stem()
                    .unwrap_or_default()
                    .to_string_lossy()
                    .to_string();
                let ver = version_prefix(&name).unwrap_or(0) as i64;
                if ver <= current {
                    continue;
                }
                let sql = file.contents_utf8().ok_or_else(|| {
                    ClientError::backend(format!("invalid utf-8 in migration {name}"))
                })?;
                let tx = conn.unchecked_transaction()?;
                tx.execute_batch(sql)?;
                tx.execute(&format!("PRAGMA user_version = {ver}"), [])?;
                tx.commit()?;
            }
            Ok(())
        }
    }

    fn version_prefix(name: &str) -> Option<u32> {
        let digits: String = name.chars().take_while(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            None
        } else {
            digits.parse::<u32>().ok()
        }
    }

    fn row_to_shortcut(row: &rusqlite::Row<'_>) -> rusqlite::Result<Shortcut> {
        Ok(Shortcut {
            id: row.get(0)?,
            keys: row.get(1)?,
            description: row.get(2)?,
            category: row.get(3)?,
            app_name: row.get(4)?,
            learned: row.get::<_, i64>(5)? != 0,
        })
    }

    const SHORTCUT_COLS: &str = "s.id, s.keys, s.description, s.category, s.app_name, s.learned";

    impl CatalogClient for SqliteCatalog {
        async fn get_applications(&self) -> Result<Vec<Application>, ClientError> {
            let conn = self.conn.lock().expect("poisoned");
            let mut stmt = conn.prepare("SELECT id, name, icon FROM apps ORDER BY id")?;
            let rows = stmt.query_map([], |row| {
                Ok(Application {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    icon: row.get(2)?,
                })
            })?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        }

        async fn get_shortcuts(&self, app_id: Option<i64>) -> Result<Vec<Shortcut>, ClientError> {
            let conn = self.conn.lock().expect("poisoned");
            match app_id {
                Some(id) => {
                    let sql = format!(
                        "SELECT {SHORTCUT_COLS} FROM shortcuts s \
                         JOIN apps a ON a.name = s.app_name \
                         WHERE a.id = ? ORDER BY s.category, s.id"
                    );
                    let mut stmt = conn.prepare(&sql)?;
                    let rows = stmt.query_map([id], row_to_shortcut)?;
                    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
                }
                None => {
                    let sql = format!(
                        "SELECT {SHORTCUT_COLS} FROM shortcuts s ORDER BY s.app_name, s.category, s.id"
                    );
                    let mut stmt = conn.prepare(&sql)?;
                    let rows = stmt.query_map([], row_to_shortcut)?;
                    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
                }
            }
        }

        async fn get_categories(&self, app_id: Option<i64>) -> Result<Vec<Category>, ClientError> {
            let conn = self.conn.lock().expect("poisoned");
            let map = |row: &rusqlite::Row<'_>| {
                Ok(Category {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    display_order: row.get(2)?,
                })
            };
            match app_id {
                Some(id) => {
                    let mut stmt = conn.prepare(
                        "SELECT id, name, display_order FROM categories \
                         WHERE app_id = ? ORDER BY display_order, name",
                    )?;
                    let rows = stmt.query_map([id], map)?;
                    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
                }
                None => {
                    let mut stmt = conn.prepare(
                        "SELECT id, name, display_order FROM categories ORDER BY display_order, name",
                    )?;
                    let rows = stmt.query_map([], map)?;
                    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
                }
            }
        }

        async fn search_shortcuts(
            &self,
            query: &str,
            app_id: Option<i64>,
        ) -> Result<Vec<Shortcut>, ClientError> {
            let like = format!("%{query}%");
            let conn = self.conn.lock().expect("poisoned");
            match app_id {
                Some(id) => {
                    let sql = format!(
                        "SELECT {SHORTCUT_COLS} FROM shortcuts s \
                         JOIN apps a ON a.name = s.app_name \
                         WHERE a.id = ?1 AND (s.keys LIKE ?2 OR s.description LIKE ?2 OR s.category LIKE ?2) \
                         ORDER BY s.category, s.id"
                    );
                    let mut stmt = conn.prepare(&sql)?;
                    let rows = stmt.query_map(params![id, like], row_to_shortcut)?;
                    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
                }
                None => {
                    let sql = format!(
                        "SELECT {SHORTCUT_COLS} FROM shortcuts s \
                         WHERE s.keys LIKE ?1 OR s.description LIKE ?1 OR s.category LIKE ?1 \
                         ORDER BY s.app_name, s.category, s.id"
                    );
                    let mut stmt = conn.prepare(&sql)?;
                    let rows = stmt.query_map([like], row_to_shortcut)?;
                    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
                }
            }
        }

        async fn set_shortcut_learned(
            &self,
            shortcut_id: i64,
            learned: bool,
        ) -> Result<(), ClientError> {
            let conn = self.conn.lock().expect("poisoned");
            let changed = conn.execute(
                "UPDATE shortcuts SET learned = ? WHERE id = ?",
                params![learned, shortcut_id],
            )?;
            if changed == 0 {
                return Err(ClientError::backend(format!(
                    "no shortcut with id {shortcut_id}"
                )));
            }
            Ok(())
        }
    }
}
