//! Shared test harness for pipeline integration tests.
//!
//! Provides tool doubles that understand a tiny fake container format
//! (`FAKEVIDEO duration=<secs>`), plus [`TestHarness`] wiring them to an
//! in-memory store, a temp storage root and a manual clock.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use cf_av::{validate_merge_inputs, validate_trim_range, MediaEditor, MediaProbe, ProbeInfo};
use cf_core::config::{PolicyConfig, ShareConfig};
use cf_core::{Error, ManualClock, Result};
use cf_db::pool::{init_memory_pool, DbPool};
use cf_db::{Asset, AssetStore, ShareLinkStore};
use cf_pipeline::{AssetStorage, EditPipeline, IngestionPipeline, ShareLifecycle, Upload};
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const MAGIC: &str = "FAKEVIDEO duration=";

/// Bytes of a fake video lasting `duration` seconds.
pub fn fake_video(duration: f64) -> Vec<u8> {
    format!("{MAGIC}{duration}\n").into_bytes()
}

async fn read_duration(path: &Path) -> Result<f64> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::Probe(format!("cannot read {}: {e}", path.display())))?;
    text.trim()
        .strip_prefix(MAGIC)
        .and_then(|d| d.parse().ok())
        .ok_or_else(|| Error::Probe(format!("{} is not a video", path.display())))
}

// ---------------------------------------------------------------------------
// FakeProbe
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeProbe {
    pub calls: AtomicUsize,
}

#[async_trait]
impl MediaProbe for FakeProbe {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn probe(&self, path: &Path, cancel: &CancellationToken) -> Result<ProbeInfo> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let duration_seconds = read_duration(path).await?;
        let size_bytes = tokio::fs::metadata(path)
            .await
            .map_err(|e| Error::Probe(e.to_string()))?
            .len();
        Ok(ProbeInfo {
            duration_seconds,
            size_bytes,
            format: "fake".into(),
        })
    }
}

// ---------------------------------------------------------------------------
// FakeEditor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    /// Produce correct output.
    Normal,
    /// Write a partial output, then fail.
    Fail,
    /// Write a partial output, then wait for cancellation.
    Hang,
    /// Succeed but write something that does not probe.
    Garbage,
}

pub struct FakeEditor {
    pub mode: Mutex<EditorMode>,
    pub merges: Mutex<Vec<Vec<PathBuf>>>,
    pub calls: AtomicUsize,
}

impl Default for FakeEditor {
    fn default() -> Self {
        Self {
            mode: Mutex::new(EditorMode::Normal),
            merges: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }
}

impl FakeEditor {
    pub fn set_mode(&self, mode: EditorMode) {
        *self.mode.lock() = mode;
    }

    async fn finish(&self, output: &Path, duration: f64, cancel: &CancellationToken) -> Result<()> {
        let mode = *self.mode.lock();
        match mode {
            EditorMode::Normal => tokio::fs::write(output, fake_video(duration))
                .await
                .map_err(|e| Error::Edit(e.to_string())),
            EditorMode::Garbage => tokio::fs::write(output, b"not a video")
                .await
                .map_err(|e| Error::Edit(e.to_string())),
            EditorMode::Fail => {
                tokio::fs::write(output, b"FAKEVID").await.ok();
                Err(Error::Edit("encoder exploded".into()))
            }
            EditorMode::Hang => {
                tokio::fs::write(output, b"FAKEVID").await.ok();
                cancel.cancelled().await;
                Err(Error::Cancelled)
            }
        }
    }
}

#[async_trait]
impl MediaEditor for FakeEditor {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn trim(
        &self,
        input: &Path,
        output: &Path,
        start: f64,
        end: f64,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        validate_trim_range(start, end)?;
        let source = read_duration(input).await.map_err(Error::into_edit)?;
        self.finish(output, end.min(source) - start, cancel).await
    }

    async fn merge(
        &self,
        inputs: &[PathBuf],
        output: &Path,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        validate_merge_inputs(inputs)?;
        self.merges.lock().push(inputs.to_vec());
        let mut total = 0.0;
        for input in inputs {
            total += read_duration(input).await.map_err(Error::into_edit)?;
        }
        self.finish(output, total, cancel).await
    }
}

// ---------------------------------------------------------------------------
// TestHarness
// ---------------------------------------------------------------------------

pub struct TestHarness {
    pub dir: TempDir,
    pub db: DbPool,
    pub storage: AssetStorage,
    pub assets: AssetStore,
    pub links: ShareLinkStore,
    pub prober: Arc<FakeProbe>,
    pub editor: Arc<FakeEditor>,
    pub clock: Arc<ManualClock>,
    pub policy: PolicyConfig,
}

impl TestHarness {
    /// Default upload policy (5..=25 seconds).
    pub fn new() -> Self {
        Self::with_policy(PolicyConfig::default())
    }

    /// A permissive policy, handy for edit tests that need short sources.
    pub fn permissive() -> Self {
        Self::with_policy(PolicyConfig {
            min_duration_secs: 1,
            max_duration_secs: 600,
            ..PolicyConfig::default()
        })
    }

    pub fn with_policy(policy: PolicyConfig) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = init_memory_pool().expect("failed to create in-memory pool");
        let storage = AssetStorage::open(dir.path().join("videos")).expect("storage root");
        let start = Utc
            .with_ymd_and_hms(2026, 10, 18, 9, 0, 0)
            .single()
            .expect("valid start instant");

        Self {
            dir,
            assets: AssetStore::new(db.clone()),
            links: ShareLinkStore::new(db.clone()),
            db,
            storage,
            prober: Arc::new(FakeProbe::default()),
            editor: Arc::new(FakeEditor::default()),
            clock: Arc::new(ManualClock::new(start)),
            policy,
        }
    }

    pub fn ingestion(&self) -> IngestionPipeline {
        IngestionPipeline::new(
            self.assets.clone(),
            self.storage.clone(),
            self.prober.clone(),
            self.policy.clone(),
        )
    }

    pub fn edits(&self) -> EditPipeline {
        EditPipeline::new(
            self.assets.clone(),
            self.storage.clone(),
            self.prober.clone(),
            self.editor.clone(),
        )
    }

    pub fn shares(&self) -> ShareLifecycle {
        self.shares_with(ShareConfig::default())
    }

    pub fn shares_with(&self, config: ShareConfig) -> ShareLifecycle {
        ShareLifecycle::new(
            self.assets.clone(),
            self.links.clone(),
            self.clock.clone(),
            config,
        )
    }

    /// Ingest a fake video of `duration` seconds.
    pub async fn seed(&self, duration: f64) -> Asset {
        self.ingestion()
            .ingest(
                Upload::new("seed.mp4", &fake_video(duration)[..]),
                &CancellationToken::new(),
            )
            .await
            .expect("seed ingest")
    }

    /// File names currently under the storage root, sorted.
    pub fn files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.storage.root())
            .expect("read storage root")
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Make every later asset insert fail while reads keep working.
    pub fn reject_new_assets(&self) {
        let conn = self.db.get().expect("connection");
        conn.execute_batch(
            "CREATE TRIGGER reject_asset_inserts BEFORE INSERT ON assets
             BEGIN SELECT RAISE(ABORT, 'asset inserts disabled'); END;",
        )
        .expect("install trigger");
    }

    pub fn asset_count(&self) -> usize {
        self.assets.list().expect("list assets").len()
    }
}
