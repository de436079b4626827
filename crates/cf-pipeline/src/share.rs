//! Share link lifecycle.
//!
//! Expiry is never stored as a flag and never triggers deletion. A link is
//! live while `now < expires_at`, evaluated against the injected [`Clock`]
//! on every read.

use std::sync::Arc;

use cf_core::config::ShareConfig;
use cf_core::{AssetId, Clock, Error, Result, ShareLinkId};
use cf_db::{Asset, AssetStore, ShareLink, ShareLinkStore};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::blocking;

/// A live link together with the asset it points at.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedShare {
    pub link: ShareLink,
    pub asset: Asset,
}

pub struct ShareLifecycle {
    assets: AssetStore,
    links: ShareLinkStore,
    clock: Arc<dyn Clock>,
    config: ShareConfig,
}

impl ShareLifecycle {
    pub fn new(
        assets: AssetStore,
        links: ShareLinkStore,
        clock: Arc<dyn Clock>,
        config: ShareConfig,
    ) -> Self {
        Self {
            assets,
            links,
            clock,
            config,
        }
    }

    /// Issue a link to `asset_id` valid for `ttl_hours` from now.
    pub async fn create(&self, asset_id: AssetId, ttl_hours: i64) -> Result<ShareLink> {
        if self.fetch_asset(asset_id).await?.is_none() {
            return Err(Error::not_found("asset", asset_id));
        }

        let (min, max) = (
            i64::from(self.config.min_ttl_hours),
            i64::from(self.config.max_ttl_hours),
        );
        if !(min..=max).contains(&ttl_hours) {
            return Err(Error::Validation(format!(
                "ttl_hours must be between {min} and {max}, got {ttl_hours}"
            )));
        }

        let now = self.clock.now();
        let expires_at = hours_after(now, ttl_hours)?;
        let links = self.links.clone();
        let link = blocking(move || links.create(ShareLinkId::new(), asset_id, now, expires_at))
            .await?;
        tracing::info!(share_id = %link.id, asset_id = %asset_id, expires_at = %link.expires_at, "share link created");
        Ok(link)
    }

    /// Look up a link and its asset.
    ///
    /// A link past its expiry is [`Error::Expired`], not
    /// [`Error::NotFound`], so callers can tell "never existed" from
    /// "lapsed".
    pub async fn resolve(&self, share_id: ShareLinkId) -> Result<ResolvedShare> {
        let links = self.links.clone();
        let link = blocking(move || links.get(share_id))
            .await?
            .ok_or_else(|| Error::not_found("share link", share_id))?;

        if !link.is_live(self.clock.now()) {
            return Err(Error::expired("share link", share_id));
        }

        let asset = self
            .fetch_asset(link.asset_id)
            .await?
            .ok_or_else(|| Error::not_found("asset", link.asset_id))?;

        Ok(ResolvedShare { link, asset })
    }

    /// Live links, newest first, optionally restricted to one asset.
    pub async fn list(&self, asset_id: Option<AssetId>) -> Result<Vec<ShareLink>> {
        let links = self.links.clone();
        let all = blocking(move || match asset_id {
            Some(id) => links.list_by_asset(id),
            None => links.list_all(),
        })
        .await?;
        let now = self.clock.now();
        Ok(all.into_iter().filter(|l| l.is_live(now)).collect())
    }

    /// Live links that lapse within the next `hours`, soonest first.
    pub async fn expiring_within(&self, hours: i64) -> Result<Vec<ShareLink>> {
        if hours <= 0 {
            return Err(Error::Validation(format!(
                "window must be a positive number of hours, got {hours}"
            )));
        }
        let now = self.clock.now();
        let until = hours_after(now, hours)?;
        let links = self.links.clone();
        blocking(move || links.list_expiring_between(now, until)).await
    }

    /// Remove a link. Unknown or expired ids are not an error; the return
    /// value says whether anything was removed.
    pub async fn delete(&self, share_id: ShareLinkId) -> Result<bool> {
        let links = self.links.clone();
        let removed = blocking(move || links.delete(share_id)).await?;
        tracing::info!(share_id = %share_id, removed, "share link deleted");
        Ok(removed)
    }

    async fn fetch_asset(&self, asset_id: AssetId) -> Result<Option<Asset>> {
        let assets = self.assets.clone();
        blocking(move || assets.get(asset_id)).await
    }
}

/// `now + hours`, or [`Error::Validation`] when the instant is not representable.
fn hours_after(now: DateTime<Utc>, hours: i64) -> Result<DateTime<Utc>> {
    Duration::try_hours(hours)
        .and_then(|span| now.checked_add_signed(span))
        .ok_or_else(|| Error::Validation(format!("{hours} hours from now is out of range")))
}
