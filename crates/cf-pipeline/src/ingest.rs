//! Upload ingestion.
//!
//! validate -> persist bytes -> probe -> duration policy -> commit record.
//! A record is only ever committed for a file that passed every earlier
//! step, and a file only survives if its record was committed.

use std::path::Path;
use std::sync::Arc;

use cf_av::MediaProbe;
use cf_core::config::PolicyConfig;
use cf_core::{
    allowed_extension, allowed_extensions_display, is_allowed_content_type, AssetId, AssetRole,
    AssetStatus, Error, Result,
};
use cf_db::{Asset, AssetStore, NewAsset};
use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;

use crate::rollback::Rollback;
use crate::storage::AssetStorage;
use crate::{blocking, invalid_media};

/// An incoming upload.
pub struct Upload<R> {
    /// Client-supplied file name; only its extension is used.
    pub filename: String,
    pub content_type: Option<String>,
    pub body: R,
}

impl<R> Upload<R> {
    pub fn new(filename: impl Into<String>, body: R) -> Self {
        Self {
            filename: filename.into(),
            content_type: None,
            body,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Turns uploads into completed assets.
pub struct IngestionPipeline {
    assets: AssetStore,
    storage: AssetStorage,
    prober: Arc<dyn MediaProbe>,
    policy: PolicyConfig,
}

impl IngestionPipeline {
    pub fn new(
        assets: AssetStore,
        storage: AssetStorage,
        prober: Arc<dyn MediaProbe>,
        policy: PolicyConfig,
    ) -> Self {
        Self {
            assets,
            storage,
            prober,
            policy,
        }
    }

    /// Ingest one upload.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] for a disallowed container or an oversized
    ///   body. Nothing is left on disk.
    /// - [`Error::Storage`] if the bytes cannot be written.
    /// - [`Error::InvalidMedia`] if the written file does not probe.
    /// - [`Error::Policy`] if the probed duration is out of bounds.
    /// - [`Error::Database`] if the record cannot be committed.
    /// - [`Error::Cancelled`] if `cancel` fires mid-way.
    ///
    /// Every error after the file was created removes it before returning.
    #[tracing::instrument(skip_all, fields(filename = %upload.filename, asset_id = tracing::field::Empty))]
    pub async fn ingest<R>(&self, upload: Upload<R>, cancel: &CancellationToken) -> Result<Asset>
    where
        R: AsyncRead + Unpin + Send,
    {
        let ext = validate_upload(&upload.filename, upload.content_type.as_deref())?;

        let id = AssetId::new();
        tracing::Span::current().record("asset_id", tracing::field::display(id));
        let storage_key = AssetStorage::storage_key(id, AssetRole::Original, &ext);
        let path = self.storage.path_for(&storage_key);

        let mut rollback = Rollback::new();
        let file = self.storage.create_new(&path).await?;
        rollback.remove_file(path.clone());

        let written = self
            .storage
            .write_stream(file, upload.body, self.policy.max_upload_bytes, cancel)
            .await?;
        tracing::debug!(bytes = written, path = %path.display(), "upload persisted");

        let info = self
            .prober
            .probe(&path, cancel)
            .await
            .map_err(invalid_media)?;
        tracing::debug!(tool = self.prober.name(), duration = info.duration_seconds, size = info.size_bytes, "upload probed");

        if !self.policy.accepts_duration(info.duration_seconds) {
            return Err(Error::Policy(format!(
                "duration {:.2}s is outside the allowed range of {}..={} seconds",
                info.duration_seconds, self.policy.min_duration_secs, self.policy.max_duration_secs
            )));
        }

        if info.size_bytes != written {
            tracing::warn!(
                probed = info.size_bytes,
                written,
                "probed size differs from bytes written; storing probed size"
            );
        }

        let new = NewAsset {
            id,
            storage_key,
            role: AssetRole::Original,
            size_bytes: to_i64(info.size_bytes)?,
            duration_seconds: whole_seconds(info.duration_seconds),
            status: AssetStatus::Completed,
        };
        let store = self.assets.clone();
        let asset = blocking(move || store.create(&new)).await?;

        rollback.commit();
        tracing::info!(
            duration = asset.duration_seconds,
            size = asset.size_bytes,
            "asset ingested"
        );
        Ok(asset)
    }
}

/// Check the name and declared type against the container allow-list and
/// return the normalized extension.
pub fn validate_upload(filename: &str, content_type: Option<&str>) -> Result<String> {
    let ext = allowed_extension(Path::new(filename)).ok_or_else(|| {
        Error::Validation(format!(
            "unsupported file type {filename:?}; allowed: {}",
            allowed_extensions_display()
        ))
    })?;
    if !is_allowed_content_type(content_type) {
        return Err(Error::Validation(format!(
            "unsupported content type {:?}",
            content_type.unwrap_or_default()
        )));
    }
    Ok(ext)
}

/// Probed durations are stored as whole seconds, rounded to nearest.
pub(crate) fn whole_seconds(duration: f64) -> i64 {
    duration.round() as i64
}

pub(crate) fn to_i64(size: u64) -> Result<i64> {
    i64::try_from(size).map_err(|_| Error::Internal(format!("size {size} does not fit in i64")))
}
