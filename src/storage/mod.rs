//! Binary object storage.
//!
//! Opaque key → bytes store with overwrite-by-key semantics. Keys are
//! `/`-separated relative paths such as `assets/svg/{id}.svg`.

mod fs;
#[cfg(test)]
mod memory;

use std::path::PathBuf;

use thiserror::Error;

pub use fs::FsStorage;
#[cfg(test)]
pub use memory::MemoryStorage;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid storage key `{0}`")]
    InvalidKey(String),

    #[error("cannot resolve `{0}` to a stored object")]
    UnsupportedUrl(String),

    #[error("object `{0}` not found")]
    NotFound(String),

    #[error("{action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Storage seam used by the orchestrator.
pub trait Storage: Sync {
    /// Store `bytes` under `key`, replacing any previous object, and return
    /// the public URL of the object.
    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String, StorageError>;

    /// Load the object behind `url`.
    fn fetch(&self, url: &str) -> Result<Vec<u8>, StorageError>;
}

/// Reject keys that could escape the storage root.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..");
    if bad {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key("assets/svg/a.svg").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("/etc/passwd").is_err());
        assert!(validate_key("assets/../x").is_err());
        assert!(validate_key("assets//x").is_err());
        assert!(validate_key("a\\b").is_err());
    }
}
