use std::collections::BTreeMap;

use parking_lot::Mutex;

use super::{Storage, StorageError, validate_key};

const SCHEME: &str = "memory://";

/// In-memory storage for tests; URLs are `memory://{key}`.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    objects: Mutex<BTreeMap<String, (Vec<u8>, String)>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object, returning its URL.
    pub fn insert(&self, key: &str, bytes: Vec<u8>) -> String {
        self.objects
            .lock()
            .insert(key.to_string(), (bytes, "application/octet-stream".to_string()));
        format!("{SCHEME}{key}")
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().get(key).map(|(bytes, _)| bytes.clone())
    }

    pub fn content_type(&self, key: &str) -> Option<String> {
        self.objects.lock().get(key).map(|(_, ty)| ty.clone())
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().keys().cloned().collect()
    }
}

impl Storage for MemoryStorage {
    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String, StorageError> {
        validate_key(key)?;
        self.objects
            .lock()
            .insert(key.to_string(), (bytes.to_vec(), content_type.to_string()));
        Ok(format!("{SCHEME}{key}"))
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>, StorageError> {
        let key = url
            .strip_prefix(SCHEME)
            .ok_or_else(|| StorageError::UnsupportedUrl(url.to_string()))?;
        self.get(key)
            .ok_or_else(|| StorageError::NotFound(url.to_string()))
    }
}
