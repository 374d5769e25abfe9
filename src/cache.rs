//! Key-value cache used for small persisted values
//!
//! Values are stored as JSON. `FileCache` keeps one file per key under the
//! user's cache directory; `MemoryCache` is process-local.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache io error: {0}")]
    Io(#[from] io::Error),
    #[error("cache serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub trait KeyValueCache: Send + Sync {
    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError>;
    fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), CacheError>;
}

pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Cache under `<cache_dir>/boxcast`.
    pub fn in_user_cache_dir() -> Self {
        let mut dir = dirs::cache_dir().unwrap_or_else(|| PathBuf::from("."));
        dir.push("boxcast");
        Self::new(dir)
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", file_name))
    }
}

impl KeyValueCache for FileCache {
    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read(&path)?;
        Ok(Some(serde_json::from_slice(&content)?))
    }

    fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir)?;
        let content = serde_json::to_vec(value)?;
        fs::write(self.path_for(key), content)?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryCache {
    values: Mutex<HashMap<String, Value>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueCache for MemoryCache {
    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        match values.get(key) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let value = serde_json::to_value(value)?;
        self.values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value);
        Ok(())
    }
}

const VIEWER_ID_KEY: &str = "viewerId";

/// The persisted viewer id, generated and stored on first use.
///
/// Falls back to a fresh id for this session when the cache is unusable.
pub fn viewer_id<C: KeyValueCache>(cache: &C) -> String {
    match cache.get::<String>(VIEWER_ID_KEY) {
        Ok(Some(id)) => return id,
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "unable to read viewer id"),
    }

    let id = Uuid::new_v4().to_string();
    if let Err(e) = cache.set(VIEWER_ID_KEY, &id) {
        tracing::warn!(error = %e, "unable to persist viewer id");
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_cache_round_trip() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get::<Vec<u32>>("numbers").unwrap(), None);
        cache.set("numbers", &vec![1, 2, 3]).unwrap();
        assert_eq!(cache.get::<Vec<u32>>("numbers").unwrap(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_file_cache_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        FileCache::new(dir.path().to_path_buf())
            .set("channel-1", &"hello".to_string())
            .unwrap();

        let reopened = FileCache::new(dir.path().to_path_buf());
        assert_eq!(reopened.get::<String>("channel-1").unwrap(), Some("hello".to_string()));
        assert_eq!(reopened.get::<String>("channel-2").unwrap(), None);
    }

    #[test]
    fn test_file_cache_key_is_sanitized() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path().to_path_buf());
        cache.set("../escape", &1u8).unwrap();
        assert!(dir.path().join("___escape.json").exists());
        assert_eq!(cache.get::<u8>("../escape").unwrap(), Some(1));
    }

    #[test]
    fn test_file_cache_corrupt_entry_is_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.json"), "{").unwrap();
        let cache = FileCache::new(dir.path().to_path_buf());
        assert!(matches!(cache.get::<String>("broken"), Err(CacheError::Json(_))));
    }

    #[test]
    fn test_viewer_id_is_stable() {
        let cache = MemoryCache::new();
        let first = viewer_id(&cache);
        let second = viewer_id(&cache);
        assert_eq!(first, second);
        assert!(Uuid::parse_str(&first).is_ok());
    }

    #[test]
    fn test_viewer_id_regenerates_when_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("viewerId.json"), "not json").unwrap();
        let cache = FileCache::new(dir.path().to_path_buf());

        let id = viewer_id(&cache);
        assert_eq!(cache.get::<String>("viewerId").unwrap(), Some(id));
    }
}
