//! Client-local bookmarks.
//!
//! The set of saved application ids lives on the user's machine only and is
//! never sent to the server. It is stored as a JSON array under a fixed key
//! in a small key/value [`BookmarkStorage`]. Any storage failure downgrades
//! the set to memory-only for the rest of the process; callers never see an
//! error.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Key the id list is stored under.
pub const BOOKMARKS_KEY: &str = "capupdate-saved-apps";

/// Minimal string key/value storage, shaped like browser local storage.
pub trait BookmarkStorage {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be written.
    fn set_item(&mut self, key: &str, value: &str) -> Result<()>;
}

impl<T: BookmarkStorage + ?Sized> BookmarkStorage for Box<T> {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set_item(key, value)
    }
}

/// Storage backed by one JSON object file mapping keys to string values.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse {}", self.path.display()))
    }
}

impl BookmarkStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        let mut items = self.read_all()?;
        items.insert(key.to_owned(), value.to_owned());

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }
        let json = serde_json::to_string_pretty(&items).context("failed to encode bookmarks")?;
        fs::write(&self.path, json)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}

/// Storage that lives only as long as the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: BTreeMap<String, String>,
}

impl BookmarkStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.items.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// The user's saved application ids, in the order they were saved.
#[derive(Debug)]
pub struct Bookmarks<S> {
    storage: S,
    ids: Vec<String>,
    persistent: bool,
}

impl<S: BookmarkStorage> Bookmarks<S> {
    /// Load saved ids from `storage`.
    ///
    /// Unreadable or malformed data yields an empty, memory-only set.
    pub fn load(storage: S) -> Self {
        let loaded = storage.get_item(BOOKMARKS_KEY).and_then(|raw| match raw {
            Some(raw) => serde_json::from_str::<Vec<String>>(&raw)
                .context("saved bookmarks are not a JSON array of ids"),
            None => Ok(Vec::new()),
        });

        let (ids, persistent) = match loaded {
            Ok(ids) => (dedup(ids), true),
            Err(_) => (Vec::new(), false),
        };
        Self {
            storage,
            ids,
            persistent,
        }
    }

    /// Saved ids in insertion order.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|saved| saved == id)
    }

    /// Whether changes are still being written to storage.
    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    /// Add `id` if absent, remove it if present. Returns `true` when the id
    /// is saved after the call.
    pub fn toggle(&mut self, id: &str) -> bool {
        let saved = if let Some(pos) = self.ids.iter().position(|saved| saved == id) {
            self.ids.remove(pos);
            false
        } else {
            self.ids.push(id.to_owned());
            true
        };
        self.persist();
        saved
    }

    fn persist(&mut self) {
        if !self.persistent {
            return;
        }
        let written = serde_json::to_string(&self.ids)
            .map_err(anyhow::Error::from)
            .and_then(|json| self.storage.set_item(BOOKMARKS_KEY, &json));
        if written.is_err() {
            self.persistent = false;
        }
    }
}

fn dedup(ids: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(&id) {
            unique.push(id);
        }
    }
    unique
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Storage that fails every call.
    struct BrokenStorage;

    impl BookmarkStorage for BrokenStorage {
        fn get_item(&self, _: &str) -> Result<Option<String>> {
            anyhow::bail!("storage disabled")
        }
        fn set_item(&mut self, _: &str, _: &str) -> Result<()> {
            anyhow::bail!("storage disabled")
        }
    }

    /// Storage that reads fine but rejects writes.
    #[derive(Default)]
    struct ReadOnlyStorage;

    impl BookmarkStorage for ReadOnlyStorage {
        fn get_item(&self, _: &str) -> Result<Option<String>> {
            Ok(Some(r#"["a1"]"#.to_owned()))
        }
        fn set_item(&mut self, _: &str, _: &str) -> Result<()> {
            anyhow::bail!("quota exceeded")
        }
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut bookmarks = Bookmarks::load(MemoryStorage::default());
        assert!(bookmarks.ids().is_empty());

        assert!(bookmarks.toggle("abc"));
        assert!(bookmarks.contains("abc"));
        assert!(!bookmarks.toggle("abc"));
        assert!(!bookmarks.contains("abc"));
        assert!(bookmarks.is_persistent());
    }

    #[test]
    fn insertion_order_is_kept() {
        let mut bookmarks = Bookmarks::load(MemoryStorage::default());
        for id in ["c", "a", "b"] {
            bookmarks.toggle(id);
        }
        bookmarks.toggle("a");
        bookmarks.toggle("a");
        assert_eq!(bookmarks.ids(), ["c", "b", "a"]);
    }

    #[test]
    fn toggles_are_written_under_the_fixed_key() {
        let mut bookmarks = Bookmarks::load(MemoryStorage::default());
        bookmarks.toggle("x1");
        bookmarks.toggle("y2");
        let raw = bookmarks.storage.get_item(BOOKMARKS_KEY).unwrap().unwrap();
        assert_eq!(raw, r#"["x1","y2"]"#);
    }

    #[test]
    fn file_storage_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("saved.json");

        let mut first = Bookmarks::load(FileStorage::new(&path));
        first.toggle("app-1");
        first.toggle("app-2");
        assert!(first.is_persistent());

        let second = Bookmarks::load(FileStorage::new(&path));
        assert_eq!(second.ids(), ["app-1", "app-2"]);
    }

    #[test]
    fn file_storage_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let mut storage = FileStorage::new(&path);
        storage.set_item("theme", "dark").unwrap();

        let mut bookmarks = Bookmarks::load(storage.clone());
        bookmarks.toggle("z");

        assert_eq!(storage.get_item("theme").unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn unreadable_storage_degrades_to_memory() {
        let mut bookmarks = Bookmarks::load(BrokenStorage);
        assert!(!bookmarks.is_persistent());
        assert!(bookmarks.toggle("abc"));
        assert_eq!(bookmarks.ids(), ["abc"]);
    }

    #[test]
    fn malformed_data_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.json");
        fs::write(&path, "{ not json").unwrap();

        let bookmarks = Bookmarks::load(FileStorage::new(&path));
        assert!(bookmarks.ids().is_empty());
        assert!(!bookmarks.is_persistent());
    }

    #[test]
    fn failed_write_keeps_change_in_memory() {
        let mut bookmarks = Bookmarks::load(ReadOnlyStorage);
        assert!(bookmarks.is_persistent());
        assert!(bookmarks.toggle("b2"));
        assert!(!bookmarks.is_persistent());
        assert_eq!(bookmarks.ids(), ["a1", "b2"]);
    }

    #[test]
    fn duplicate_ids_in_storage_are_collapsed() {
        let mut storage = MemoryStorage::default();
        storage.set_item(BOOKMARKS_KEY, r#"["a","b","a"]"#).unwrap();
        let bookmarks = Bookmarks::load(storage);
        assert_eq!(bookmarks.ids(), ["a", "b"]);
    }
}
