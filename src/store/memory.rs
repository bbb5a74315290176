// src/store/memory.rs

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::errors::{Result, RolegraphError};
use crate::store::{check_key, VersionStore};

/// In-memory store. Clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    files: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All keys currently stored, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.files().keys().cloned().collect()
    }

    fn files(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl VersionStore for MemoryStore {
    fn write(&self, path: &str, content: &str) -> Result<()> {
        check_key(path)?;
        self.files().insert(path.to_string(), content.to_string());
        Ok(())
    }

    fn read(&self, path: &str) -> Result<String> {
        self.files()
            .get(path)
            .cloned()
            .ok_or_else(|| RolegraphError::NotFound(path.to_string()))
    }

    fn append(&self, path: &str, content: &str) -> Result<()> {
        check_key(path)?;
        self.files()
            .entry(path.to_string())
            .or_default()
            .push_str(content);
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        self.files().contains_key(path)
    }

    fn sibling_keys(&self, path: &str) -> Result<Vec<String>> {
        let dir = path.rsplit_once('/').map(|(parent, _)| parent);
        Ok(self
            .files()
            .keys()
            .filter(|k| k.rsplit_once('/').map(|(parent, _)| parent) == dir)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_creates_then_extends() {
        let store = MemoryStore::new();
        store.append("log.txt", "a").unwrap();
        store.append("log.txt", "b").unwrap();
        assert_eq!(store.read("log.txt").unwrap(), "ab");
    }

    #[test]
    fn versions_only_include_same_directory() {
        let store = MemoryStore::new();
        store.write("x/state.json", "{}").unwrap();
        store.write("y/state.json", "{}").unwrap();
        let v = store.save_version("x/state.json", None).unwrap();
        store.save_version("y/state.json", None).unwrap();

        assert_eq!(store.list_versions("x/state.json").unwrap(), vec![v.clone()]);
        assert!(store.keys().contains(&format!("{v}.meta.json")));
        assert_eq!(store.keys().len(), 6);
    }

    #[test]
    fn rapid_versions_do_not_overwrite_each_other() {
        let store = MemoryStore::new();
        store.write("f", "1").unwrap();
        let a = store.save_version("f", None).unwrap();
        store.write("f", "2").unwrap();
        let b = store.save_version("f", None).unwrap();
        store.write("f", "3").unwrap();
        let c = store.save_version("f", None).unwrap();

        let versions = store.list_versions("f").unwrap();
        assert_eq!(versions, vec![a.clone(), b.clone(), c.clone()]);
        assert_eq!(store.read(&a).unwrap(), "1");
        assert_eq!(store.read(&c).unwrap(), "3");
    }
}
