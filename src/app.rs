//! Wiring from a [`Config`] to the stores and pipelines.

use std::sync::Arc;

use anyhow::{Context, Result};
use cf_av::ToolRegistry;
use cf_core::{Clock, SystemClock};
use cf_db::{init_pool, AssetStore, DbPool, ShareLinkStore};
use cf_pipeline::{AssetStorage, EditPipeline, IngestionPipeline, ShareLifecycle};

use crate::config::Config;

/// Opened stores plus discovered tools.
///
/// Pipelines that shell out are built on demand so commands that never
/// touch ffmpeg keep working on hosts without it.
pub struct App {
    pub config: Config,
    pub pool: DbPool,
    pub assets: AssetStore,
    pub links: ShareLinkStore,
    pub storage: AssetStorage,
    pub tools: ToolRegistry,
    clock: Arc<dyn Clock>,
}

impl App {
    /// Open the database (running migrations) and the storage root.
    pub fn open(config: Config) -> Result<Self> {
        let pool = init_pool(&config.database).with_context(|| {
            format!("Failed to open database: {:?}", config.database.path)
        })?;
        let storage = AssetStorage::open(&config.storage.root).with_context(|| {
            format!("Failed to open storage root: {:?}", config.storage.root)
        })?;
        let tools = ToolRegistry::discover(&config.tools);

        Ok(Self {
            assets: AssetStore::new(pool.clone()),
            links: ShareLinkStore::new(pool.clone()),
            pool,
            storage,
            tools,
            clock: Arc::new(SystemClock),
            config,
        })
    }

    pub fn ingestion(&self) -> Result<IngestionPipeline> {
        let prober = self.tools.prober()?;
        Ok(IngestionPipeline::new(
            self.assets.clone(),
            self.storage.clone(),
            Arc::new(prober),
            self.config.policy.clone(),
        ))
    }

    pub fn edits(&self) -> Result<EditPipeline> {
        let prober = self.tools.prober()?;
        let editor = self.tools.editor(&self.config.encode)?;
        Ok(EditPipeline::new(
            self.assets.clone(),
            self.storage.clone(),
            Arc::new(prober),
            Arc::new(editor),
        ))
    }

    pub fn shares(&self) -> ShareLifecycle {
        ShareLifecycle::new(
            self.assets.clone(),
            self.links.clone(),
            self.clock.clone(),
            self.config.share.clone(),
        )
    }
}
