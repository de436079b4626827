//! Pool-owning store handles.
//!
//! Components are constructed with these instead of reaching for a global
//! connection. Each method checks out the single pooled connection for the
//! duration of one statement and returns it before yielding.

use cf_core::{AssetId, AssetStatus, Result, ShareLinkId};
use chrono::{DateTime, Utc};

use crate::models::{Asset, NewAsset, ShareLink};
use crate::pool::{get_conn, DbPool};
use crate::queries::{assets, share_links};

/// Durable asset metadata.
#[derive(Clone)]
pub struct AssetStore {
    pool: DbPool,
}

impl AssetStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn create(&self, new: &NewAsset) -> Result<Asset> {
        let conn = get_conn(&self.pool)?;
        assets::create_asset(&conn, new)
    }

    pub fn get(&self, id: AssetId) -> Result<Option<Asset>> {
        let conn = get_conn(&self.pool)?;
        assets::get_asset(&conn, id)
    }

    pub fn list(&self) -> Result<Vec<Asset>> {
        let conn = get_conn(&self.pool)?;
        assets::list_assets(&conn)
    }

    pub fn update_status(
        &self,
        id: AssetId,
        status: AssetStatus,
        error_detail: Option<&str>,
    ) -> Result<bool> {
        let conn = get_conn(&self.pool)?;
        assets::update_asset_status(&conn, id, status, error_detail)
    }
}

/// Durable share link records.
#[derive(Clone)]
pub struct ShareLinkStore {
    pool: DbPool,
}

impl ShareLinkStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn create(
        &self,
        id: ShareLinkId,
        asset_id: AssetId,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<ShareLink> {
        let conn = get_conn(&self.pool)?;
        share_links::create_share_link(&conn, id, asset_id, created_at, expires_at)
    }

    pub fn get(&self, id: ShareLinkId) -> Result<Option<ShareLink>> {
        let conn = get_conn(&self.pool)?;
        share_links::get_share_link(&conn, id)
    }

    pub fn list_all(&self) -> Result<Vec<ShareLink>> {
        let conn = get_conn(&self.pool)?;
        share_links::list_share_links(&conn)
    }

    pub fn list_by_asset(&self, asset_id: AssetId) -> Result<Vec<ShareLink>> {
        let conn = get_conn(&self.pool)?;
        share_links::list_share_links_for_asset(&conn, asset_id)
    }

    pub fn list_expiring_between(
        &self,
        after: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<ShareLink>> {
        let conn = get_conn(&self.pool)?;
        share_links::list_expiring_between(&conn, after, until)
    }

    pub fn delete(&self, id: ShareLinkId) -> Result<bool> {
        let conn = get_conn(&self.pool)?;
        share_links::delete_share_link(&conn, id)
    }
}
