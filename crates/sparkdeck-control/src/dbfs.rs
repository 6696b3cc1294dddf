//! File-store helpers.
//!
//! Uploads stream through a handle in [`BLOCK_SIZE`] blocks; downloads read
//! [`BLOCK_SIZE`] windows until a short read. Paths may carry the `dbfs:`
//! scheme or not.

use std::path::Path;
use std::sync::Arc;

use sparkdeck_api::types::FileInfo;
use sparkdeck_api::DbfsApi;

use crate::error::Result;

/// Largest block the platform accepts in one add-block call.
pub const BLOCK_SIZE: usize = 1024 * 1024;

/// Strip the `dbfs:` scheme. Returns `None` for any other scheme.
#[must_use]
pub fn strip_scheme(uri: &str) -> Option<&str> {
    uri.strip_prefix("dbfs:")
}

fn file_path(path: &str) -> &str {
    strip_scheme(path).unwrap_or(path)
}

/// File-store operations bound to a session's client.
#[derive(Clone)]
pub struct Dbfs {
    api: Arc<dyn DbfsApi>,
}

impl std::fmt::Debug for Dbfs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dbfs").finish_non_exhaustive()
    }
}

impl Dbfs {
    pub(crate) fn new(api: Arc<dyn DbfsApi>) -> Self {
        Self { api }
    }

    /// Write `data` to `path`.
    ///
    /// # Errors
    ///
    /// Returns a transport error if any call fails. The handle is closed on
    /// a best-effort basis when a block fails.
    pub async fn put(&self, path: &str, data: &[u8], overwrite: bool) -> Result<()> {
        let path = file_path(path);
        let handle = self.api.create(path, overwrite).await?;

        for block in data.chunks(BLOCK_SIZE) {
            if let Err(e) = self.api.add_block(handle, block).await {
                if let Err(close) = self.api.close(handle).await {
                    tracing::warn!(path, handle, error = %close, "Failed to close upload handle");
                }
                return Err(e.into());
            }
        }
        self.api.close(handle).await?;

        tracing::info!(path, bytes = data.len(), "Uploaded file");
        Ok(())
    }

    /// Upload a local file to `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the local file cannot be read, or a transport
    /// error if the upload fails.
    pub async fn put_file(&self, local: &Path, path: &str, overwrite: bool) -> Result<()> {
        let data = tokio::fs::read(local).await?;
        tracing::debug!(local = %local.display(), path, "Uploading local file");
        self.put(path, &data, overwrite).await
    }

    /// Read the whole file at `path`.
    ///
    /// # Errors
    ///
    /// Returns a transport error if any read fails.
    pub async fn get(&self, path: &str) -> Result<Vec<u8>> {
        let path = file_path(path);
        let mut content = Vec::new();
        loop {
            let chunk = self
                .api
                .read(path, content.len() as u64, BLOCK_SIZE as u64)
                .await?;
            let done = chunk.len() < BLOCK_SIZE;
            content.extend_from_slice(&chunk);
            if done {
                return Ok(content);
            }
        }
    }

    /// Status of a file or directory.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the path does not exist.
    pub async fn status(&self, path: &str) -> Result<FileInfo> {
        Ok(self.api.get_status(file_path(path)).await?)
    }

    /// Whether a file or directory exists at `path`.
    ///
    /// # Errors
    ///
    /// Returns a transport error for any failure other than not-found.
    pub async fn exists(&self, path: &str) -> Result<bool> {
        match self.api.get_status(file_path(path)).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a file, or a directory with `recursive`.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the call fails.
    pub async fn delete(&self, path: &str, recursive: bool) -> Result<()> {
        self.api.delete(file_path(path), recursive).await?;
        tracing::info!(path, recursive, "Deleted file-store path");
        Ok(())
    }

    /// Move a file.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the call fails.
    pub async fn move_path(&self, source: &str, destination: &str) -> Result<()> {
        Ok(self
            .api
            .move_path(file_path(source), file_path(destination))
            .await?)
    }

    /// Create a directory and its parents.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the call fails.
    pub async fn mkdirs(&self, path: &str) -> Result<()> {
        Ok(self.api.mkdirs(file_path(path)).await?)
    }

    /// Entries directly under a directory.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the call fails.
    pub async fn list(&self, path: &str) -> Result<Vec<FileInfo>> {
        Ok(self.api.list(file_path(path)).await?)
    }
}
