//! On-disk layout for asset files.
//!
//! Every asset is one file directly under the storage root, named
//! `{id}_{role}.{ext}`. The storage key persisted on the record is that file
//! name, relative to the root.

use std::path::{Path, PathBuf};

use cf_core::{AssetId, AssetRole, Error, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio_util::sync::CancellationToken;

/// Handle on the configured storage root.
#[derive(Debug, Clone)]
pub struct AssetStorage {
    root: PathBuf,
}

impl AssetStorage {
    /// Use `root`, creating it if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| {
            Error::Storage(format!("cannot create storage root {}: {e}", root.display()))
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Deterministic file name for an asset.
    pub fn storage_key(id: AssetId, role: AssetRole, ext: &str) -> String {
        format!("{}_{}.{}", id.simple(), role, ext)
    }

    /// Absolute location of a stored key.
    pub fn path_for(&self, storage_key: &str) -> PathBuf {
        self.root.join(storage_key)
    }

    /// Create `path` exclusively. Fails rather than reuse an existing file.
    pub async fn create_new(&self, path: &Path) -> Result<tokio::fs::File> {
        tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await
            .map_err(|e| Error::Storage(format!("cannot create {}: {e}", path.display())))
    }

    /// Stream `body` into `file`, returning the number of bytes written.
    ///
    /// More than `limit` bytes is a [`Error::Validation`]. The caller owns
    /// removal of the file on any error.
    pub async fn write_stream<R>(
        &self,
        file: tokio::fs::File,
        body: R,
        limit: u64,
        cancel: &CancellationToken,
    ) -> Result<u64>
    where
        R: AsyncRead + Unpin + Send,
    {
        let mut limited = body.take(limit.saturating_add(1));
        let mut writer = BufWriter::new(file);

        let written = tokio::select! {
            r = tokio::io::copy(&mut limited, &mut writer) => {
                r.map_err(|e| Error::Storage(format!("failed to write upload: {e}")))?
            }
            () = cancel.cancelled() => return Err(Error::Cancelled),
        };

        if written > limit {
            return Err(Error::Validation(format!(
                "upload exceeds the maximum size of {limit} bytes"
            )));
        }

        writer
            .flush()
            .await
            .map_err(|e| Error::Storage(format!("failed to flush upload: {e}")))?;
        writer
            .into_inner()
            .sync_all()
            .await
            .map_err(|e| Error::Storage(format!("failed to sync upload: {e}")))?;

        Ok(written)
    }
}

/// Lowercased extension of a storage key, defaulting to `mp4`.
pub(crate) fn key_extension(storage_key: &str) -> String {
    Path::new(storage_key)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "mp4".to_string())
}
