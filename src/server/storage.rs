//! Server-side document storage.
//!
//! Each collection is one JSON object keyed by document id:
//! ```text
//! <DATA_DIR>/
//!   productions.json
//!   sales.json
//!   settings.json
//! ```
//!
//! Writes go through a temp file and a rename. Callers serialize access
//! (the router keeps the storage behind a `RwLock`).

use oxytrack_core::{Collection, RemoteDocument};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::PathBuf;

pub type Fields = Map<String, Value>;
type Documents = BTreeMap<String, Fields>;

/// Errors that can occur during storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// I/O error reading or writing a file.
    IoError(PathBuf, io::Error),
    /// A collection file that is not a JSON object of documents.
    ParseError(PathBuf, serde_json::Error),
    /// Empty or otherwise unusable document id.
    InvalidId(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::IoError(path, e) => {
                write!(f, "I/O error for {}: {}", path.display(), e)
            }
            StorageError::ParseError(path, e) => {
                write!(f, "Failed to parse collection {}: {}", path.display(), e)
            }
            StorageError::InvalidId(id) => write!(f, "Invalid document id: '{}'", id),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::IoError(_, e) => Some(e),
            StorageError::ParseError(_, e) => Some(e),
            StorageError::InvalidId(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DocumentStorage {
    data_dir: PathBuf,
}

impl DocumentStorage {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn validate_id(id: &str) -> Result<(), StorageError> {
        if id.trim().is_empty() || id.chars().any(char::is_control) {
            return Err(StorageError::InvalidId(id.to_string()));
        }
        Ok(())
    }

    fn path(&self, collection: Collection) -> PathBuf {
        self.data_dir.join(format!("{}.json", collection.name()))
    }

    fn load(&self, collection: Collection) -> Result<Documents, StorageError> {
        let path = self.path(collection);
        match fs::read(&path) {
            Ok(bytes) => {
                serde_json::from_slice(&bytes).map_err(|e| StorageError::ParseError(path, e))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Documents::new()),
            Err(e) => Err(StorageError::IoError(path, e)),
        }
    }

    fn save(&self, collection: Collection, documents: &Documents) -> Result<(), StorageError> {
        let path = self.path(collection);

        fs::create_dir_all(&self.data_dir)
            .map_err(|e| StorageError::IoError(self.data_dir.clone(), e))?;

        let bytes =
            serde_json::to_vec_pretty(documents).map_err(|e| StorageError::ParseError(path.clone(), e))?;

        let temp_path = path.with_extension("json.tmp");
        let mut file =
            File::create(&temp_path).map_err(|e| StorageError::IoError(temp_path.clone(), e))?;
        file.write_all(&bytes)
            .map_err(|e| StorageError::IoError(temp_path.clone(), e))?;
        file.sync_all()
            .map_err(|e| StorageError::IoError(temp_path.clone(), e))?;

        fs::rename(&temp_path, &path).map_err(|e| StorageError::IoError(path, e))?;
        Ok(())
    }

    /// All documents of a collection, ordered by id.
    pub fn list(&self, collection: Collection) -> Result<Vec<RemoteDocument>, StorageError> {
        Ok(self
            .load(collection)?
            .into_iter()
            .map(|(id, data)| RemoteDocument { id, data })
            .collect())
    }

    pub fn get(&self, collection: Collection, id: &str) -> Result<Option<Fields>, StorageError> {
        Ok(self.load(collection)?.remove(id))
    }

    /// Overwrites a document.
    pub fn set(&self, collection: Collection, id: &str, data: Fields) -> Result<(), StorageError> {
        Self::validate_id(id)?;
        let mut documents = self.load(collection)?;
        documents.insert(id.to_string(), data);
        self.save(collection, &documents)
    }

    /// Merges top-level fields into a document, creating it if needed.
    pub fn merge(&self, collection: Collection, id: &str, data: Fields) -> Result<(), StorageError> {
        Self::validate_id(id)?;
        let mut documents = self.load(collection)?;
        documents.entry(id.to_string()).or_default().extend(data);
        self.save(collection, &documents)
    }

    /// Removes a document. Returns false if it did not exist.
    pub fn delete(&self, collection: Collection, id: &str) -> Result<bool, StorageError> {
        let mut documents = self.load(collection)?;
        if documents.remove(id).is_none() {
            return Ok(false);
        }
        self.save(collection, &documents)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn setup() -> (DocumentStorage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = DocumentStorage::new(temp_dir.path());
        (storage, temp_dir)
    }

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_empty_collection() {
        let (storage, _temp) = setup();
        assert!(storage.list(Collection::Sales).unwrap().is_empty());
        assert!(storage.get(Collection::Sales, "s1").unwrap().is_none());
    }

    #[test]
    fn test_set_overwrites() {
        let (storage, temp) = setup();
        storage
            .set(Collection::Sales, "s1", fields(json!({"clientName": "A", "status": "pending"})))
            .unwrap();
        storage
            .set(Collection::Sales, "s1", fields(json!({"clientName": "B"})))
            .unwrap();

        let doc = storage.get(Collection::Sales, "s1").unwrap().unwrap();
        assert_eq!(doc["clientName"], "B");
        assert!(!doc.contains_key("status"));
        assert!(temp.path().join("sales.json").exists());
        assert!(!temp.path().join("sales.json.tmp").exists());
    }

    #[test]
    fn test_merge_keeps_fields() {
        let (storage, _temp) = setup();
        storage
            .merge(
                Collection::Settings,
                "global",
                fields(json!({"companyName": "OxyTrack", "defaultProducer": "A"})),
            )
            .unwrap();
        storage
            .merge(Collection::Settings, "global", fields(json!({"defaultProducer": "B"})))
            .unwrap();

        let doc = storage.get(Collection::Settings, "global").unwrap().unwrap();
        assert_eq!(doc["companyName"], "OxyTrack");
        assert_eq!(doc["defaultProducer"], "B");
    }

    #[test]
    fn test_delete() {
        let (storage, _temp) = setup();
        storage
            .set(Collection::Productions, "p1", fields(json!({"producer": "A"})))
            .unwrap();

        assert!(storage.delete(Collection::Productions, "p1").unwrap());
        assert!(!storage.delete(Collection::Productions, "p1").unwrap());
        assert!(storage.list(Collection::Productions).unwrap().is_empty());
    }

    #[test]
    fn test_collections_are_separate() {
        let (storage, _temp) = setup();
        storage
            .set(Collection::Productions, "x", fields(json!({})))
            .unwrap();
        assert!(storage.list(Collection::Sales).unwrap().is_empty());
        assert_eq!(storage.list(Collection::Productions).unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_id() {
        let (storage, _temp) = setup();
        let result = storage.set(Collection::Sales, " ", fields(json!({})));
        assert!(matches!(result, Err(StorageError::InvalidId(_))));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let (storage, temp) = setup();
        fs::write(temp.path().join("sales.json"), "not json").unwrap();
        assert!(matches!(
            storage.list(Collection::Sales),
            Err(StorageError::ParseError(_, _))
        ));
    }
}
