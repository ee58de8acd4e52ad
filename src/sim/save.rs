/// Discovery log persistence.
///
/// The only state that outlives a process: the set of catalog ids the
/// player has ever found. Stored as a JSON array of integers.
///
/// ## Store lookup
///   1. An absolute configured path is used as-is.
///   2. Otherwise the file lives in the save directory: the exe dir if
///      writable, then `~/.local/share/digquest`, then the CWD.
///
/// A missing file is an empty log. A malformed file is logged and
/// treated as empty; the next discovery overwrites it.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::domain::treasure::{self, CatalogEntry, Rarity};
use crate::error::GameResult;

// ══════════════════════════════════════════════════════════════
// Stores
// ══════════════════════════════════════════════════════════════

pub trait DiscoveryStore {
    fn load(&self) -> GameResult<BTreeSet<u32>>;
    fn save(&mut self, ids: &BTreeSet<u32>) -> GameResult<()>;
}

pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStore { path: path.into() }
    }

    /// Resolve a configured file name against the save directory.
    pub fn in_save_dir(configured: &Path) -> Self {
        JsonFileStore::new(resolve_in_save_dir(configured))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DiscoveryStore for JsonFileStore {
    fn load(&self) -> GameResult<BTreeSet<u32>> {
        if !self.path.exists() {
            return Ok(BTreeSet::new());
        }
        let text = std::fs::read_to_string(&self.path)?;
        let ids: Vec<u32> = serde_json::from_str(&text)?;
        Ok(ids.into_iter().collect())
    }

    fn save(&mut self, ids: &BTreeSet<u32>) -> GameResult<()> {
        let ids: Vec<u32> = ids.iter().copied().collect();
        std::fs::write(&self.path, serde_json::to_string(&ids)?)?;
        Ok(())
    }
}

/// In-memory store for simulation tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    pub ids: BTreeSet<u32>,
}

#[cfg(test)]
impl DiscoveryStore for MemoryStore {
    fn load(&self) -> GameResult<BTreeSet<u32>> {
        Ok(self.ids.clone())
    }

    fn save(&mut self, ids: &BTreeSet<u32>) -> GameResult<()> {
        self.ids = ids.clone();
        Ok(())
    }
}

/// Absolute paths are kept; relative ones land in `save_dir()`.
pub fn resolve_in_save_dir(configured: &Path) -> PathBuf {
    if configured.is_absolute() {
        configured.to_path_buf()
    } else {
        save_dir().join(configured)
    }
}

fn save_dir() -> PathBuf {
    // 1. Exe directory, if writable (portable installs)
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            let test_path = parent.join(".write_test_digquest");
            if std::fs::write(&test_path, "").is_ok() {
                let _ = std::fs::remove_file(&test_path);
                return parent.to_path_buf();
            }
        }
    }

    // 2. XDG data home for system installs
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/digquest");
        if std::fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    // 3. CWD
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

// ══════════════════════════════════════════════════════════════
// Discovery log
// ══════════════════════════════════════════════════════════════

pub struct DiscoveryLog {
    ids: BTreeSet<u32>,
    store: Box<dyn DiscoveryStore>,
}

impl DiscoveryLog {
    pub fn open(store: Box<dyn DiscoveryStore>) -> Self {
        let ids = match store.load() {
            Ok(ids) => ids,
            Err(e) => {
                warn!("discovery log unreadable, starting empty: {e}");
                BTreeSet::new()
            }
        };
        debug!("discovery log: {} entries", ids.len());
        DiscoveryLog { ids, store }
    }

    pub fn contains(&self, catalog_id: u32) -> bool {
        self.ids.contains(&catalog_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Add a catalog id. Returns true if it was new; only then is the
    /// store written. A failed write is logged, the in-memory set kept.
    pub fn record(&mut self, catalog_id: u32) -> bool {
        if !self.ids.insert(catalog_id) {
            return false;
        }
        if let Err(e) = self.store.save(&self.ids) {
            warn!("could not save discovery log: {e}");
        }
        true
    }

    pub fn book(&self) -> TreasureBook {
        let entries: Vec<BookEntry> = treasure::registry()
            .into_iter()
            .map(|entry| BookEntry {
                discovered: self.contains(entry.catalog_id),
                rarity: Rarity::from_value(entry.value),
                entry,
            })
            .collect();
        let discovered = entries.iter().filter(|e| e.discovered).count();
        TreasureBook { total: entries.len(), discovered, entries }
    }
}

// ══════════════════════════════════════════════════════════════
// Treasure book view
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct BookEntry {
    pub entry: CatalogEntry,
    pub rarity: Rarity,
    pub discovered: bool,
}

#[derive(Clone, Debug)]
pub struct TreasureBook {
    pub entries: Vec<BookEntry>,
    pub discovered: usize,
    pub total: usize,
}

impl TreasureBook {
    /// Whole-number completion percentage.
    pub fn percent(&self) -> u32 {
        if self.total == 0 { return 0; }
        (self.discovered * 100 / self.total) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = DiscoveryLog::open(Box::new(JsonFileStore::new(dir.path().join("none.json"))));
        assert_eq!(log.len(), 0);
    }

    #[test]
    fn record_is_a_set_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("discoveries.json");

        let mut log = DiscoveryLog::open(Box::new(JsonFileStore::new(&path)));
        assert!(log.record(5));
        assert!(log.record(2));
        assert!(!log.record(5));
        assert_eq!(log.len(), 2);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[2,5]");

        let reopened = DiscoveryLog::open(Box::new(JsonFileStore::new(&path)));
        assert!(reopened.contains(2) && reopened.contains(5));
        assert_eq!(reopened.len(), 2);
    }

    #[test]
    fn malformed_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("discoveries.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = JsonFileStore::new(&path);
        assert!(store.load().is_err());
        let mut log = DiscoveryLog::open(Box::new(store));
        assert_eq!(log.len(), 0);
        assert!(log.record(1));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[1]");
    }

    #[test]
    fn absolute_path_bypasses_save_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.json");
        assert_eq!(JsonFileStore::in_save_dir(&path).path(), path.as_path());
    }

    #[test]
    fn book_counts_discoveries() {
        let mut log = DiscoveryLog::open(Box::new(MemoryStore::default()));
        log.record(1);
        log.record(2);
        let book = log.book();
        assert_eq!(book.total, treasure::registry_len());
        assert_eq!(book.discovered, 2);
        assert_eq!(book.percent(), (200 / treasure::registry_len()) as u32);
        assert!(book.entries[0].discovered);
        assert!(!book.entries[2].discovered);
    }
}
