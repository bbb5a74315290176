// src/store/mod.rs

//! Key-value file store with version snapshots.
//!
//! Executors may use a store to persist their own state; the scheduler never
//! does. Keys are relative, `/`-separated paths such as
//! `states/architect_state.json`.
//!
//! - [`local`] is the on-disk implementation rooted at a directory.
//! - [`memory`] is an in-memory implementation for tests and embedding.
//! - [`role_memory`] layers per-role JSON state on top of any store.

use std::fmt::Debug;

use chrono::{DateTime, Utc};
use globset::{Glob, GlobBuilder, GlobMatcher};
use serde_json::{json, Value};

use crate::errors::{Result, RolegraphError};

pub mod local;
pub mod memory;
pub mod role_memory;

pub use local::LocalStore;
pub use memory::MemoryStore;
pub use role_memory::RoleMemory;

/// Suffix of the sidecar written next to each version.
pub const META_SUFFIX: &str = ".meta.json";

/// Abstract file/version store.
pub trait VersionStore: Send + Sync + Debug {
    /// Create or replace `path` with `content`.
    fn write(&self, path: &str, content: &str) -> Result<()>;

    /// Read `path`. Fails with [`RolegraphError::NotFound`] if it is absent.
    fn read(&self, path: &str) -> Result<String>;

    /// Append `content` to `path`, creating it if needed.
    fn append(&self, path: &str, content: &str) -> Result<()>;

    fn exists(&self, path: &str) -> bool;

    /// All keys in the store directory that holds `path`'s siblings.
    fn sibling_keys(&self, path: &str) -> Result<Vec<String>>;

    /// Copy the current content of `path` to a new timestamped version and
    /// write a `<version>.meta.json` sidecar. Returns the version key.
    fn save_version(&self, path: &str, metadata: Option<&Value>) -> Result<String> {
        let content = self.read(path)?;
        let now = Utc::now();
        let version = free_version_key(self, path, now);

        self.write(&version, &content)?;

        let meta = json!({
            "source": path,
            "created_at": now.to_rfc3339(),
            "blake3": blake3::hash(content.as_bytes()).to_hex().to_string(),
            "metadata": metadata.cloned().unwrap_or(Value::Null),
        });
        self.write(&format!("{version}{META_SUFFIX}"), &serde_json::to_string(&meta)?)?;

        Ok(version)
    }

    /// Version keys of `path`, oldest first.
    fn list_versions(&self, path: &str) -> Result<Vec<String>> {
        let matcher = version_matcher(path)?;
        let mut versions: Vec<String> = self
            .sibling_keys(path)?
            .into_iter()
            .filter(|k| matcher.is_match(k) && !k.ends_with(META_SUFFIX))
            .collect();
        versions.sort();
        Ok(versions)
    }

    fn latest_version(&self, path: &str) -> Result<Option<String>> {
        Ok(self.list_versions(path)?.pop())
    }
}

/// `<path>.<UTC timestamp>`; the timestamp format sorts chronologically.
fn version_key(path: &str, at: DateTime<Utc>) -> String {
    format!("{path}.{}", at.format("%Y%m%dT%H%M%S%.6fZ"))
}

/// First unused version key for `at`. Collisions within the same
/// microsecond get a zero-padded `-NNNN` suffix so keys still sort in
/// creation order.
fn free_version_key<S: VersionStore + ?Sized>(store: &S, path: &str, at: DateTime<Utc>) -> String {
    let base = version_key(path, at);
    let mut version = base.clone();
    let mut n = 1;
    while store.exists(&version) {
        version = format!("{base}-{n:04}");
        n += 1;
    }
    version
}

/// Matches `<path>.<YYYYMMDD>T*` without crossing a `/`.
fn version_matcher(path: &str) -> Result<GlobMatcher> {
    let pattern = format!("{}.{}T*", escape_glob(path), "[0-9]".repeat(8));
    let glob: Glob = GlobBuilder::new(&pattern)
        .literal_separator(true)
        .build()
        .map_err(|e| RolegraphError::Other(e.into()))?;
    Ok(glob.compile_matcher())
}

fn escape_glob(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '*' | '?' | '[' | ']' | '{' | '}' => {
                out.push('[');
                out.push(c);
                out.push(']');
            }
            _ => out.push(c),
        }
    }
    out
}

/// Reject keys that are empty, absolute, or climb out of the store root.
pub(crate) fn check_key(path: &str) -> Result<()> {
    let bad = path.is_empty()
        || path.starts_with('/')
        || path.starts_with('\\')
        || path.split(['/', '\\']).any(|part| part == "..");
    if bad {
        return Err(RolegraphError::ConfigError(format!(
            "invalid store path '{path}'"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn version_keys_sort_chronologically() {
        let early = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let later = early + chrono::Duration::milliseconds(1);
        assert!(version_key("a.txt", early) < version_key("a.txt", later));
        assert_eq!(version_key("a.txt", early), "a.txt.20260102T030405.000000Z");
    }

    #[test]
    fn matcher_is_literal_and_stays_in_directory() {
        let m = version_matcher("notes[1].md").unwrap();
        assert!(m.is_match("notes[1].md.20260101T000000.000000Z"));
        assert!(!m.is_match("notes1.md.20260101T000000.000000Z"));

        let m = version_matcher("dir/a").unwrap();
        assert!(m.is_match("dir/a.20260101T000000.000000Z-0001"));
        assert!(!m.is_match("dir/a.20260101T000000.000000Z/nested"));
        assert!(!m.is_match("dir/a.notes"));
    }

    #[test]
    fn colliding_versions_sort_in_creation_order() {
        let store = MemoryStore::new();
        let at = Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();

        let mut created = Vec::new();
        for i in 0..12 {
            let key = free_version_key(&store, "f", at);
            store.write(&key, &i.to_string()).unwrap();
            created.push(key);
        }

        assert_eq!(created[0], "f.20260304T050607.000000Z");
        assert_eq!(created[11], "f.20260304T050607.000000Z-0011");
        assert_eq!(store.list_versions("f").unwrap(), created);
        assert_eq!(store.latest_version("f").unwrap(), Some(created[11].clone()));
        assert_eq!(store.keys().len(), 12);
    }

    #[test]
    fn keys_outside_root_are_rejected() {
        assert!(check_key("ok/file.txt").is_ok());
        assert!(check_key("").is_err());
        assert!(check_key("/etc/passwd").is_err());
        assert!(check_key("a/../../b").is_err());
    }
}
