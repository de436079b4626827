//! Trim and merge existing assets into new ones.
//!
//! Both operations are single-pass: resolve sources, run the editor into a
//! fresh output path, probe the result, commit a new record. The output file
//! is registered for removal before the editor runs, so a failed or
//! cancelled edit never leaves a partial file behind. Sources are never
//! modified.

use std::path::PathBuf;
use std::sync::Arc;

use cf_av::{MediaEditor, MediaProbe};
use cf_core::{AssetId, AssetRole, AssetStatus, Error, Result};
use cf_db::{Asset, AssetStore, NewAsset};
use tokio_util::sync::CancellationToken;

use crate::ingest::{to_i64, whole_seconds};
use crate::rollback::Rollback;
use crate::storage::{key_extension, AssetStorage};
use crate::{blocking, invalid_media};

/// Container used for merge output.
const MERGE_EXTENSION: &str = "mp4";

pub struct EditPipeline {
    assets: AssetStore,
    storage: AssetStorage,
    prober: Arc<dyn MediaProbe>,
    editor: Arc<dyn MediaEditor>,
}

impl EditPipeline {
    pub fn new(
        assets: AssetStore,
        storage: AssetStorage,
        prober: Arc<dyn MediaProbe>,
        editor: Arc<dyn MediaEditor>,
    ) -> Self {
        Self {
            assets,
            storage,
            prober,
            editor,
        }
    }

    /// Cut `[start, end)` seconds out of `asset_id` into a new asset.
    ///
    /// Fails with [`Error::NotFound`] for an unknown source and
    /// [`Error::Validation`] unless `0 <= start < end <= source duration`.
    pub async fn trim(
        &self,
        asset_id: AssetId,
        start: f64,
        end: f64,
        cancel: &CancellationToken,
    ) -> Result<Asset> {
        let source = self.fetch(asset_id).await?;

        let duration = source.duration_seconds as f64;
        if !start.is_finite() || !end.is_finite() || start < 0.0 || end > duration || start >= end
        {
            return Err(Error::Validation(format!(
                "invalid trim range {start}..{end} for asset {asset_id} of {} seconds",
                source.duration_seconds
            )));
        }
        ensure_completed(&source)?;

        let input = self.storage.path_for(&source.storage_key);
        let ext = key_extension(&source.storage_key);
        let id = AssetId::new();
        let storage_key = AssetStorage::storage_key(id, AssetRole::Trimmed, &ext);
        let output = self.storage.path_for(&storage_key);

        let mut rollback = Rollback::new();
        rollback.remove_file(output.clone());

        tracing::info!(source = %asset_id, asset_id = %id, start, end, tool = self.editor.name(), "trim started");
        self.editor
            .trim(&input, &output, start, end, cancel)
            .await?;

        let asset = self
            .commit(id, storage_key, AssetRole::Trimmed, output, cancel)
            .await?;
        rollback.commit();
        tracing::info!(source = %asset_id, asset_id = %asset.id, duration = asset.duration_seconds, "trim committed");
        Ok(asset)
    }

    /// Concatenate `asset_ids` in the given order into a new asset.
    ///
    /// Fails with [`Error::Validation`] for fewer than two ids and with
    /// [`Error::NotFound`] naming the first id that does not resolve. All
    /// ids are resolved before anything is written.
    pub async fn merge(&self, asset_ids: &[AssetId], cancel: &CancellationToken) -> Result<Asset> {
        if asset_ids.len() < 2 {
            return Err(Error::Validation(format!(
                "merge needs at least 2 assets, got {}",
                asset_ids.len()
            )));
        }

        let mut inputs = Vec::with_capacity(asset_ids.len());
        for &asset_id in asset_ids {
            let source = self.fetch(asset_id).await?;
            ensure_completed(&source)?;
            inputs.push(self.storage.path_for(&source.storage_key));
        }

        let id = AssetId::new();
        let storage_key = AssetStorage::storage_key(id, AssetRole::Merged, MERGE_EXTENSION);
        let output = self.storage.path_for(&storage_key);

        let mut rollback = Rollback::new();
        rollback.remove_file(output.clone());

        tracing::info!(asset_id = %id, inputs = inputs.len(), tool = self.editor.name(), "merge started");
        self.editor.merge(&inputs, &output, cancel).await?;

        let asset = self
            .commit(id, storage_key, AssetRole::Merged, output, cancel)
            .await?;
        rollback.commit();
        tracing::info!(asset_id = %asset.id, duration = asset.duration_seconds, "merge committed");
        Ok(asset)
    }

    async fn fetch(&self, asset_id: AssetId) -> Result<Asset> {
        let store = self.assets.clone();
        blocking(move || store.get(asset_id))
            .await?
            .ok_or_else(|| Error::not_found("asset", asset_id))
    }

    /// Probe the produced file and persist its record.
    async fn commit(
        &self,
        id: AssetId,
        storage_key: String,
        role: AssetRole,
        output: PathBuf,
        cancel: &CancellationToken,
    ) -> Result<Asset> {
        let info = self
            .prober
            .probe(&output, cancel)
            .await
            .map_err(invalid_media)?;
        tracing::debug!(tool = self.prober.name(), asset_id = %id, duration = info.duration_seconds, "edit output probed");

        let new = NewAsset {
            id,
            storage_key,
            role,
            size_bytes: to_i64(info.size_bytes)?,
            duration_seconds: whole_seconds(info.duration_seconds),
            status: AssetStatus::Completed,
        };
        let store = self.assets.clone();
        blocking(move || store.create(&new)).await
    }
}

/// Only completed assets are backed by a validated file.
fn ensure_completed(asset: &Asset) -> Result<()> {
    if asset.status != AssetStatus::Completed {
        return Err(Error::Validation(format!(
            "asset {} is {}, not completed",
            asset.id, asset.status
        )));
    }
    Ok(())
}
