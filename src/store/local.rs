// src/store/local.rs

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::errors::{Result, RolegraphError};
use crate::store::{check_key, VersionStore};

/// Store backed by a directory on disk, using `std::fs`.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .with_context(|| format!("creating store root {:?}", root))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        check_key(path)?;
        Ok(self.root.join(path))
    }

    fn ensure_parent(full: &Path) -> Result<()> {
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating dir {:?}", parent))?;
        }
        Ok(())
    }
}

impl VersionStore for LocalStore {
    fn write(&self, path: &str, content: &str) -> Result<()> {
        let full = self.resolve(path)?;
        Self::ensure_parent(&full)?;
        fs::write(&full, content).with_context(|| format!("writing file {:?}", full))?;
        Ok(())
    }

    fn read(&self, path: &str) -> Result<String> {
        let full = self.resolve(path)?;
        match fs::read_to_string(&full) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(RolegraphError::NotFound(path.to_string()))
            }
            Err(e) => Err(RolegraphError::IoError(e)),
        }
    }

    fn append(&self, path: &str, content: &str) -> Result<()> {
        let full = self.resolve(path)?;
        Self::ensure_parent(&full)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&full)
            .with_context(|| format!("opening file {:?} for append", full))?;
        file.write_all(content.as_bytes())
            .with_context(|| format!("appending to file {:?}", full))?;
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).map(|p| p.exists()).unwrap_or(false)
    }

    fn sibling_keys(&self, path: &str) -> Result<Vec<String>> {
        let full = self.resolve(path)?;
        let dir = full.parent().unwrap_or(self.root.as_path());
        let prefix = match path.rsplit_once('/') {
            Some((parent, _)) => format!("{parent}/"),
            None => String::new(),
        };

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(RolegraphError::IoError(e)),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                keys.push(format!("{prefix}{name}"));
            }
        }
        Ok(keys)
    }
}
