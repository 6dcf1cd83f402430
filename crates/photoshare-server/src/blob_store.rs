use std::path::{Component, Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::ServerError;

/// Verify that a resolved path stays within the expected base directory.
/// Prevents path traversal attacks.
fn ensure_within(base: &Path, target: &Path) -> Result<PathBuf, ServerError> {
    // Canonicalize base; target may not exist yet so normalize manually
    let canonical_base = base.canonicalize().unwrap_or_else(|_| base.to_path_buf());
    let mut resolved = canonical_base.clone();
    for component in target
        .strip_prefix(base)
        .unwrap_or(target)
        .components()
    {
        match component {
            Component::Normal(c) => resolved.push(c),
            Component::ParentDir => {
                return Err(ServerError::BadRequest("Path traversal detected".to_string()));
            }
            _ => {}
        }
    }
    if !resolved.starts_with(&canonical_base) {
        return Err(ServerError::BadRequest("Path traversal detected".to_string()));
    }
    Ok(resolved)
}

/// Name under which an upload is stored: `U{unix_millis}-{unique}-{original}`,
/// with anything outside `[A-Za-z0-9._-]` in the original name replaced.
/// `unique` keeps same-named uploads in the same millisecond apart.
pub fn stored_file_name(original: &str, unix_millis: i64, unique: &str) -> String {
    let base = original.rsplit(['/', '\\']).next().unwrap_or(original);
    let sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let sanitized = sanitized.trim_start_matches('.');
    let sanitized = if sanitized.is_empty() { "upload" } else { sanitized };
    format!("U{unix_millis}-{unique}-{sanitized}")
}

/// Flat directory of uploaded image files, addressed by stored file name.
#[derive(Debug, Clone)]
pub struct BlobStore {
    base_path: PathBuf,
    max_size: usize,
}

impl BlobStore {
    pub async fn new(base_path: PathBuf, max_size: usize) -> Result<Self, ServerError> {
        fs::create_dir_all(&base_path).await.map_err(|e| {
            ServerError::BlobStorage(format!(
                "Failed to create image directory '{}': {}",
                base_path.display(),
                e
            ))
        })?;

        info!(path = %base_path.display(), "Image store initialized");

        Ok(Self {
            base_path,
            max_size,
        })
    }

    /// Store a new file. An existing file under `name` is never replaced.
    pub async fn write(&self, name: &str, data: &[u8]) -> Result<(), ServerError> {
        if data.is_empty() {
            return Err(ServerError::BadRequest("No file uploaded".to_string()));
        }
        if data.len() > self.max_size {
            return Err(ServerError::PayloadTooLarge(format!(
                "{} bytes (max {})",
                data.len(),
                self.max_size
            )));
        }

        let path = self.safe_path(name)?;
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| ServerError::BlobStorage(format!("Failed to create {name}: {e}")))?;
        file.write_all(data)
            .await
            .map_err(|e| ServerError::BlobStorage(format!("Failed to write {name}: {e}")))?;
        file.flush()
            .await
            .map_err(|e| ServerError::BlobStorage(format!("Failed to write {name}: {e}")))?;

        debug!(name, size = data.len(), "Stored image");
        Ok(())
    }

    pub async fn read(&self, name: &str) -> Result<Vec<u8>, ServerError> {
        let path = self.safe_path(name)?;

        if !path.exists() {
            return Err(ServerError::NotFound(format!("Image not found: {name}")));
        }

        let data = fs::read(&path)
            .await
            .map_err(|e| ServerError::BlobStorage(format!("Failed to read {name}: {e}")))?;

        debug!(name, size = data.len(), "Read image");
        Ok(data)
    }

    /// Remove a stored file. Returns `false` if there was nothing to remove.
    pub async fn delete(&self, name: &str) -> Result<bool, ServerError> {
        let path = self.safe_path(name)?;

        if !path.exists() {
            return Ok(false);
        }

        fs::remove_file(&path)
            .await
            .map_err(|e| ServerError::BlobStorage(format!("Failed to delete {name}: {e}")))?;

        debug!(name, "Deleted image");
        Ok(true)
    }

    /// Safe path for a stored name; names carrying separators or `..` are
    /// rejected outright.
    fn safe_path(&self, name: &str) -> Result<PathBuf, ServerError> {
        if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
            return Err(ServerError::BadRequest("Path traversal detected".to_string()));
        }
        ensure_within(&self.base_path, &self.base_path.join(name))
    }
}
