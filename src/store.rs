//! Whole-document JSON persistence shared by the registry and the log.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::StoreError;

/// A single JSON document on disk that is always read and written in full.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the document.
    ///
    /// Returns `Ok(None)` when the file does not exist so callers can fall
    /// back to their built-in defaults.
    pub fn load<T: DeserializeOwned>(&self) -> Result<Option<T>, StoreError> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("{} not found, using defaults", self.path.display());
                return Ok(None);
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        serde_json::from_str(&data)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                path: self.path.clone(),
                source,
            })
    }

    /// Overwrite the document with `value`.
    ///
    /// The data goes to a sibling `.tmp` file first and is renamed over the
    /// target, so a failed write leaves the previous snapshot intact.
    pub fn save<T: Serialize + ?Sized>(&self, value: &T) -> Result<(), StoreError> {
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(write_err)?;
            }
        }
        let data = serde_json::to_string_pretty(value).map_err(|e| write_err(io::Error::other(e)))?;
        let tmp = self.tmp_path();
        if let Err(e) = std::fs::write(&tmp, data).and_then(|_| std::fs::rename(&tmp, &self.path)) {
            let _ = std::fs::remove_file(&tmp);
            return Err(write_err(e));
        }
        log::debug!("Saved {}", self.path.display());
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("absent.json"));
        let loaded: Option<Vec<String>> = store.load().unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("nested").join("doc.json"));
        let mut doc = BTreeMap::new();
        doc.insert("a".to_string(), "1".to_string());
        store.save(&doc).unwrap();

        let loaded: BTreeMap<String, String> = store.load().unwrap().unwrap();
        assert_eq!(loaded, doc);
        assert!(!dir.path().join("nested").join("doc.json.tmp").exists());
    }

    #[test]
    fn unparseable_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = JsonStore::new(&path);
        let err = store.load::<Vec<String>>().unwrap_err();
        match err {
            StoreError::Corrupt { path: p, .. } => assert_eq!(p, path),
            e => panic!("unexpected error: {e:?}"),
        }
    }

    #[test]
    fn write_into_missing_parent_that_is_a_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let store = JsonStore::new(blocker.join("doc.json"));
        let err = store.save(&vec!["x"]).unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
    }
}
