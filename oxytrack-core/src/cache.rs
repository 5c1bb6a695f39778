//! Local durable cache: one JSON file per key in the data directory.
//!
//! ```text
//! <DATA_DIR>/
//!   oxytrack-entries.json
//!   oxytrack-sales.json
//!   oxytrack-settings.json
//!   oxytrack-pending.json
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

pub const PRODUCTIONS_KEY: &str = "oxytrack-entries";
pub const SALES_KEY: &str = "oxytrack-sales";
pub const SETTINGS_KEY: &str = "oxytrack-settings";
/// Local writes the remote has not acknowledged yet.
pub const PENDING_KEY: &str = "oxytrack-pending";

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("I/O error for {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] io::Error),

    #[error("Invalid JSON in {}: {}", .0.display(), .1)]
    Json(PathBuf, #[source] serde_json::Error),
}

/// Key → JSON value persistence.
#[derive(Debug, Clone)]
pub struct LocalCache {
    data_dir: PathBuf,
}

impl LocalCache {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    /// Returns the file backing a key.
    pub fn path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", key))
    }

    pub fn exists(&self, key: &str) -> bool {
        self.path(key).exists()
    }

    /// Loads a value.
    ///
    /// Returns `Ok(None)` if nothing has been stored under `key` yet.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let path = self.path(key);

        match fs::read(&path) {
            Ok(bytes) => {
                let value =
                    serde_json::from_slice(&bytes).map_err(|e| CacheError::Json(path, e))?;
                Ok(Some(value))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::Io(path, e)),
        }
    }

    /// Loads a value, falling back to `T::default()` when the key is missing
    /// or its file cannot be read.
    pub fn load_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match self.load(key) {
            Ok(Some(value)) => value,
            Ok(None) => T::default(),
            Err(e) => {
                tracing::warn!("Falling back to default for {}: {}", key, e);
                T::default()
            }
        }
    }

    /// Stores a value, replacing the previous one atomically.
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        fs::create_dir_all(&self.data_dir)
            .map_err(|e| CacheError::Io(self.data_dir.clone(), e))?;

        let path = self.path(key);
        let bytes = serde_json::to_vec_pretty(value).map_err(|e| CacheError::Json(path.clone(), e))?;

        let temp_path = path.with_extension("json.tmp");
        let mut file =
            File::create(&temp_path).map_err(|e| CacheError::Io(temp_path.clone(), e))?;
        file.write_all(&bytes)
            .map_err(|e| CacheError::Io(temp_path.clone(), e))?;
        file.sync_all()
            .map_err(|e| CacheError::Io(temp_path.clone(), e))?;

        fs::rename(&temp_path, &path).map_err(|e| CacheError::Io(path, e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AppSettings, ClientType, ProductionEntry, SaleEntry};
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn test_cache() -> (LocalCache, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let cache = LocalCache::new(temp_dir.path());
        (cache, temp_dir)
    }

    #[test]
    fn test_cache_path() {
        let (cache, _temp) = test_cache();
        assert!(cache.path(PRODUCTIONS_KEY).ends_with("oxytrack-entries.json"));
    }

    #[test]
    fn test_load_missing_returns_none() {
        let (cache, _temp) = test_cache();
        let loaded: Option<Vec<SaleEntry>> = cache.load(SALES_KEY).unwrap();
        assert!(loaded.is_none());
        assert!(!cache.exists(SALES_KEY));
    }

    #[test]
    fn test_save_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("nested").join("data");
        let cache = LocalCache::new(nested.clone());

        cache.save(SETTINGS_KEY, &AppSettings::default()).unwrap();

        assert!(nested.exists());
        assert!(cache.exists(SETTINGS_KEY));
    }

    #[test]
    fn test_roundtrip_preserves_dates() {
        let (cache, _temp) = test_cache();

        let start = Utc.with_ymd_and_hms(2025, 6, 2, 8, 0, 0).unwrap();
        let mut entry = ProductionEntry::start(start, start, "snel", "A");
        entry.set_end_time(Some(Utc.with_ymd_and_hms(2025, 6, 2, 16, 30, 0).unwrap()));
        let sale = SaleEntry::new(start, ClientType::Company, "Mining", 3);

        cache.save(PRODUCTIONS_KEY, &vec![entry.clone()]).unwrap();
        cache.save(SALES_KEY, &vec![sale.clone()]).unwrap();

        let entries: Vec<ProductionEntry> = cache.load(PRODUCTIONS_KEY).unwrap().unwrap();
        let sales: Vec<SaleEntry> = cache.load(SALES_KEY).unwrap().unwrap();
        assert_eq!(entries, vec![entry]);
        assert_eq!(sales, vec![sale]);

        let raw = std::fs::read_to_string(cache.path(PRODUCTIONS_KEY)).unwrap();
        assert!(raw.contains("2025-06-02T16:30:00.000Z"));
    }

    #[test]
    fn test_corrupt_file_falls_back_to_default() {
        let (cache, _temp) = test_cache();
        std::fs::write(cache.path(SETTINGS_KEY), b"{not json").unwrap();

        assert!(matches!(
            cache.load::<AppSettings>(SETTINGS_KEY),
            Err(CacheError::Json(_, _))
        ));
        let settings: AppSettings = cache.load_or_default(SETTINGS_KEY);
        assert_eq!(settings, AppSettings::default());
    }

    #[test]
    fn test_overwrite_existing() {
        let (cache, _temp) = test_cache();
        cache.save(SALES_KEY, &Vec::<SaleEntry>::new()).unwrap();

        let date = Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap();
        let sale = SaleEntry::new(date, ClientType::Company, "Mining", 3);
        cache.save(SALES_KEY, &vec![sale.clone()]).unwrap();

        let loaded: Vec<SaleEntry> = cache.load_or_default(SALES_KEY);
        assert_eq!(loaded, vec![sale]);
        assert!(!cache.path(SALES_KEY).with_extension("json.tmp").exists());
    }
}
