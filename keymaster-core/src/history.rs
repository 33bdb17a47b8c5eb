use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Maximum number of persisted queries, most-recent-first.
pub const HISTORY_LIMIT: usize = 5;

/// Namespace key under which the history is stored.
const HISTORY_KEY: &str = "search-history";

/// Durable key-value storage for recent search queries. The history list
/// is the only state this engine persists on its own behalf.
pub trait HistoryStore {
    fn load(&self) -> anyhow::Result<Vec<String>>;
    fn save(&self, entries: &[String]) -> anyhow::Result<()>;
}

/// History persisted as a single JSON array in a file named after the
/// `search-history` key.
pub struct JsonHistoryStore {
    path: PathBuf,
}

impl JsonHistoryStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            path: dir.as_ref().join(format!("{HISTORY_KEY}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryStore for JsonHistoryStore {
    fn load(&self) -> anyhow::Result<Vec<String>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        let mut entries: Vec<String> = serde_json::from_str(&raw)?;
        entries.truncate(HISTORY_LIMIT);
        Ok(entries)
    }

    fn save(&self, entries: &[String]) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string(entries)?)?;
        Ok(())
    }
}

/// In-memory history for tests and callers that opt out of persistence.
#[derive(Default)]
pub struct MemHistory {
    entries: RwLock<Vec<String>>,
}

impl MemHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<String>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.read().expect("poisoned").clone()
    }
}

impl HistoryStore for MemHistory {
    fn load(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.entries())
    }

    fn save(&self, entries: &[String]) -> anyhow::Result<()> {
        *self.entries.write().expect("poisoned") = entries.to_vec();
        Ok(())
    }
}
