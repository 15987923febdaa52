//! Product image storage
//!
//! Uploaded images are written under a generated key `<uuid>.<ext>`; the
//! client's filename never reaches the filesystem. Files are created with
//! create-new semantics so an existing file is never overwritten.

use crate::error::AppError;
use shop_core::{ShopError, UploadConfig};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Accepted image extensions
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("File exceeds the {limit} byte upload limit")]
    TooLarge { limit: usize },

    #[error("Unsupported image type: {0}")]
    UnsupportedType(String),

    #[error("Invalid media key: {0}")]
    InvalidKey(String),

    #[error("Media I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<MediaError> for AppError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::TooLarge { .. } | MediaError::UnsupportedType(_) => {
                AppError(ShopError::ValidationError(err.to_string()))
            }
            MediaError::InvalidKey(_) | MediaError::Io(_) => {
                AppError(ShopError::StorageFailure(err.to_string()))
            }
        }
    }
}

/// An image that has been written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMedia {
    /// Generated file name inside the upload directory
    pub key: String,
    /// Public URL the file is served under
    pub url: String,
}

/// Filesystem-backed image store
#[derive(Debug, Clone)]
pub struct MediaStore {
    dir: PathBuf,
    public_prefix: String,
    max_bytes: usize,
}

impl MediaStore {
    pub fn new(dir: impl Into<PathBuf>, public_prefix: impl Into<String>, max_bytes: usize) -> Self {
        let public_prefix = public_prefix.into();
        Self {
            dir: dir.into(),
            public_prefix: public_prefix.trim_end_matches('/').to_string(),
            max_bytes,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn public_prefix(&self) -> &str {
        &self.public_prefix
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Write an uploaded image and return its generated key and URL
    pub async fn save(
        &self,
        file_name: Option<&str>,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<StoredMedia, MediaError> {
        if bytes.len() > self.max_bytes {
            return Err(MediaError::TooLarge {
                limit: self.max_bytes,
            });
        }

        let ext = image_extension(file_name, content_type)?;
        let key = format!("{}.{ext}", Uuid::new_v4());

        fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(&key);
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        file.write_all(bytes).await?;
        file.flush().await?;

        tracing::debug!(
            key = %key,
            original_name = file_name.unwrap_or(""),
            size = bytes.len(),
            "Stored product image"
        );

        Ok(StoredMedia {
            url: format!("{}/{key}", self.public_prefix),
            key,
        })
    }

    /// Key of a URL produced by [`MediaStore::save`], if it is one
    pub fn key_for_url<'a>(&self, url: &'a str) -> Option<&'a str> {
        url.strip_prefix(self.public_prefix.as_str())?
            .strip_prefix('/')
            .filter(|key| is_safe_key(key))
    }

    /// Delete a stored image by key; a missing file is not an error
    pub async fn remove(&self, key: &str) -> Result<(), MediaError> {
        if !is_safe_key(key) {
            return Err(MediaError::InvalidKey(key.to_string()));
        }

        match fs::remove_file(self.dir.join(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Best-effort removal of the image behind `url`, logging failures
    pub async fn discard_url(&self, url: &str) {
        let Some(key) = self.key_for_url(url) else {
            tracing::debug!(url = %url, "Image URL not managed by media store, skipping removal");
            return;
        };

        if let Err(e) = self.remove(key).await {
            tracing::warn!(key = %key, error = %e, "Failed to remove stored image");
        }
    }
}

impl From<&UploadConfig> for MediaStore {
    fn from(config: &UploadConfig) -> Self {
        Self::new(
            config.dir.clone(),
            config.public_prefix.clone(),
            config.max_bytes,
        )
    }
}

fn is_safe_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
}

/// Pick a whitelisted extension from the filename, falling back to the MIME type
fn image_extension(file_name: Option<&str>, content_type: Option<&str>) -> Result<&'static str, MediaError> {
    let from_name = file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    if let Some(ext) = &from_name {
        if let Some(allowed) = ALLOWED_EXTENSIONS.iter().find(|a| **a == ext.as_str()) {
            return Ok(*allowed);
        }
    }

    match content_type {
        Some("image/jpeg") => Ok("jpg"),
        Some("image/png") => Ok("png"),
        Some("image/gif") => Ok("gif"),
        Some("image/webp") => Ok("webp"),
        other => Err(MediaError::UnsupportedType(
            from_name
                .or_else(|| other.map(str::to_string))
                .unwrap_or_else(|| "unknown".to_string()),
        )),
    }
}
