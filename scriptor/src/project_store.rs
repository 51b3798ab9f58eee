//! Local persistence of the project record
//!
//! One record, one file: `<store_dir>/craftedScriptorProject.json`. Saves go
//! through a temporary file in the same directory followed by a rename, so a
//! crash mid-write leaves the previous save intact. The last save wins.

use crate::document_model::Document;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Key under which the project record is stored
pub const PROJECT_KEY: &str = "craftedScriptorProject";

/// Errors that can occur while reading or writing the project record
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error on {path}: {source}", path = .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Project record at {path} is not valid JSON: {source}", path = .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize project: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// File-backed store for the project record
#[derive(Debug, Clone)]
pub struct ProjectStore {
    dir: PathBuf,
}

impl ProjectStore {
    /// Store rooted at `dir` (created on first save)
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the record file
    pub fn record_path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", PROJECT_KEY))
    }

    /// Load the saved project
    ///
    /// # Returns
    /// * `Ok(Some(Document))` - The saved project, with load defaults applied
    /// * `Ok(None)` - Nothing has been saved yet
    /// * `Err(StoreError)` - The record could not be read or parsed
    pub fn load(&self) -> Result<Option<Document>, StoreError> {
        let path = self.record_path();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        let record: Document = serde_json::from_str(&content)
            .map_err(|source| StoreError::Corrupt {
                path: path.clone(),
                source,
            })?;
        log::info!("Loaded project from {}", path.display());
        Ok(Some(Document::from_record(record)))
    }

    /// Load the saved project, or a fresh default project if there is none
    pub fn load_or_default(&self) -> Result<Document, StoreError> {
        Ok(self.load()?.unwrap_or_default())
    }

    /// Save the project, replacing any previous save
    pub fn save(&self, document: &Document) -> Result<(), StoreError> {
        let path = self.record_path();
        let content = serde_json::to_string_pretty(document)?;

        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let mut temp = tempfile::NamedTempFile::new_in(&self.dir).map_err(|source| {
            StoreError::Io {
                path: self.dir.clone(),
                source,
            }
        })?;
        temp.write_all(content.as_bytes())
            .map_err(|source| StoreError::Io {
                path: temp.path().to_path_buf(),
                source,
            })?;
        temp.persist(&path).map_err(|e| StoreError::Io {
            path: path.clone(),
            source: e.error,
        })?;

        log::info!("Saved project to {}", path.display());
        Ok(())
    }

    /// Delete the saved project
    ///
    /// A missing record is not an error.
    ///
    /// # Returns
    /// * `Ok(true)` if a record was removed
    pub fn delete(&self) -> Result<bool, StoreError> {
        let path = self.record_path();
        match fs::remove_file(&path) {
            Ok(()) => {
                log::info!("Deleted project record {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_record_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::new(dir.path().join("store"));
        assert!(store.load().unwrap().is_none());
        assert_eq!(store.load_or_default().unwrap(), Document::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::new(dir.path().join("store"));

        let mut document = Document::new("My Book", "A subtitle");
        document.set_content("Chapter 1", "<p>Once</p>".to_string());
        store.save(&document).unwrap();

        assert!(store.record_path().ends_with("craftedScriptorProject.json"));
        assert_eq!(store.load().unwrap(), Some(document));
    }

    #[test]
    fn test_last_save_wins() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::new(dir.path());
        store.save(&Document::new("First", "")).unwrap();
        store.save(&Document::new("Second", "")).unwrap();
        assert_eq!(store.load().unwrap().unwrap().title, "Second");
    }

    #[test]
    fn test_record_uses_persisted_shape() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::new(dir.path());
        store.save(&Document::new("T", "S")).unwrap();

        let raw = fs::read_to_string(store.record_path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["title"], "T");
        assert_eq!(value["subtitle"], "S");
        assert!(value["structure"].is_array());
        assert!(value["contents"].is_object());
    }

    #[test]
    fn test_partial_record_gets_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::new(dir.path());
        fs::write(store.record_path(), r#"{"title":"Only title"}"#).unwrap();

        let document = store.load().unwrap().unwrap();
        assert_eq!(document.title, "Only title");
        assert_eq!(document.subtitle, "");
        assert_eq!(document.structure[0], "Title Page");
    }

    #[test]
    fn test_corrupt_record_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::new(dir.path());
        fs::write(store.record_path(), "not json").unwrap();
        assert!(matches!(store.load(), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn test_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::new(dir.path());
        assert!(!store.delete().unwrap());
        store.save(&Document::default()).unwrap();
        assert!(store.delete().unwrap());
        assert!(store.load().unwrap().is_none());
    }
}
