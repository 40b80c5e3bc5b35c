//! Filesystem-backed storage.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use super::{Storage, StorageError, validate_key};
use crate::config::StorageConfig;

/// Characters left readable in key segments.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Objects live at `{root}/{key}`.
///
/// URLs are `{base_url}/{key}` when a base URL is configured, `file://`
/// URLs otherwise.
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
    base_url: Option<String>,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>, base_url: Option<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.map(|url| url.trim_end_matches('/').to_string()),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.root.clone(), config.base_url.clone())
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(key.split('/').fold(self.root.clone(), |path, segment| path.join(segment)))
    }

    fn public_url(&self, key: &str, path: &Path) -> Result<String, StorageError> {
        if let Some(base) = &self.base_url {
            let encoded = key
                .split('/')
                .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
                .collect::<Vec<_>>()
                .join("/");
            return Ok(format!("{base}/{encoded}"));
        }

        let absolute = std::path::absolute(path).map_err(|source| StorageError::Io {
            action: "resolve",
            path: path.to_path_buf(),
            source,
        })?;
        url::Url::from_file_path(&absolute)
            .map(|url| url.to_string())
            .map_err(|()| StorageError::UnsupportedUrl(absolute.display().to_string()))
    }

    /// Map a URL produced by [`Storage::put`], a `file://` URL or a plain
    /// path (relative to the root) to a file.
    fn resolve(&self, url: &str) -> Result<PathBuf, StorageError> {
        if let Some(rest) = self
            .base_url
            .as_deref()
            .and_then(|base| url.strip_prefix(base))
            .and_then(|rest| rest.strip_prefix('/'))
        {
            let key = percent_decode_str(rest)
                .decode_utf8()
                .map_err(|_| StorageError::UnsupportedUrl(url.to_string()))?;
            return self.path_for(&key);
        }

        if url.starts_with("file:") {
            return url::Url::parse(url)
                .ok()
                .and_then(|parsed| parsed.to_file_path().ok())
                .ok_or_else(|| StorageError::UnsupportedUrl(url.to_string()));
        }

        if url.contains("://") {
            return Err(StorageError::UnsupportedUrl(url.to_string()));
        }

        let path = Path::new(url);
        Ok(if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        })
    }
}

impl Storage for FsStorage {
    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String, StorageError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| StorageError::Io {
                action: "create directory",
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&path, bytes).map_err(|source| StorageError::Io {
            action: "write",
            path: path.clone(),
            source,
        })?;

        crate::debug!("storage"; "put {} ({}, {} bytes)", key, content_type, bytes.len());
        self.public_url(key, &path)
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(url)?;
        fs::read(&path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => StorageError::NotFound(url.to_string()),
            _ => StorageError::Io {
                action: "read",
                path,
                source,
            },
        })
    }
}
