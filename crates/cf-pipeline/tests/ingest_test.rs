//! Integration tests for upload ingestion.

mod common;

use std::sync::atomic::Ordering;

use cf_core::{AssetRole, AssetStatus, Error};
use cf_pipeline::Upload;
use common::{fake_video, TestHarness};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn valid_upload_becomes_completed_asset() {
    let h = TestHarness::new();
    let body = fake_video(12.4);

    let asset = h
        .ingestion()
        .ingest(
            Upload::new("holiday.MP4", &body[..]).with_content_type("video/mp4"),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(asset.status, AssetStatus::Completed);
    assert_eq!(asset.role, AssetRole::Original);
    assert_eq!(asset.duration_seconds, 12);
    assert_eq!(asset.size_bytes, body.len() as i64);
    assert!(asset.error_detail.is_none());
    assert!(asset.storage_key.ends_with("_original.mp4"));

    let path = h.storage.path_for(&asset.storage_key);
    assert!(path.is_file());
    assert!(std::fs::metadata(&path).unwrap().len() > 0);

    let stored = h.assets.get(asset.id).unwrap().unwrap();
    assert_eq!(stored, asset);
}

#[tokio::test]
async fn disallowed_extension_writes_nothing() {
    let h = TestHarness::new();
    let err = h
        .ingestion()
        .ingest(
            Upload::new("clip.exe", &fake_video(10.0)[..]),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Validation(_)), "{err}");
    assert!(h.files().is_empty());
    assert_eq!(h.asset_count(), 0);
    assert_eq!(h.prober.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn disallowed_content_type_writes_nothing() {
    let h = TestHarness::new();
    let err = h
        .ingestion()
        .ingest(
            Upload::new("clip.mp4", &fake_video(10.0)[..]).with_content_type("text/html"),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Validation(_)));
    assert!(h.files().is_empty());
}

#[tokio::test]
async fn unprobeable_upload_is_invalid_media_and_removed() {
    let h = TestHarness::new();
    let err = h
        .ingestion()
        .ingest(
            Upload::new("clip.mkv", &b"definitely not a video"[..]),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidMedia(_)), "{err}");
    assert!(h.files().is_empty());
    assert_eq!(h.asset_count(), 0);
}

#[tokio::test]
async fn durations_outside_policy_leave_no_trace() {
    let h = TestHarness::new();
    for duration in [0.5, 4.9, 25.1, 300.0] {
        let err = h
            .ingestion()
            .ingest(
                Upload::new("clip.webm", &fake_video(duration)[..]),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Policy(_)), "{duration}: {err}");
    }
    assert!(h.files().is_empty());
    assert_eq!(h.asset_count(), 0);
}

#[tokio::test]
async fn policy_bounds_are_inclusive() {
    let h = TestHarness::new();
    for duration in [5.0, 25.0] {
        h.ingestion()
            .ingest(
                Upload::new("edge.mov", &fake_video(duration)[..]),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
    }
    assert_eq!(h.asset_count(), 2);
    assert_eq!(h.files().len(), 2);
}

#[tokio::test]
async fn oversized_upload_is_rejected_and_removed() {
    let mut policy = cf_core::config::PolicyConfig::default();
    policy.max_upload_bytes = 8;
    let h = TestHarness::with_policy(policy);

    let err = h
        .ingestion()
        .ingest(
            Upload::new("big.mp4", &fake_video(10.0)[..]),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Validation(ref m) if m.contains("maximum size")), "{err}");
    assert!(h.files().is_empty());
}

#[tokio::test]
async fn failed_commit_removes_file() {
    let h = TestHarness::new();
    {
        let conn = h.db.get().unwrap();
        conn.execute_batch("DROP TABLE share_links; DROP TABLE assets;")
            .unwrap();
    }

    let err = h
        .ingestion()
        .ingest(
            Upload::new("clip.mp4", &fake_video(10.0)[..]),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(err.is_storage(), "{err}");
    assert!(h.files().is_empty());
}

#[tokio::test]
async fn cancelled_ingest_leaves_nothing() {
    let h = TestHarness::new();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = h
        .ingestion()
        .ingest(Upload::new("clip.mp4", &fake_video(10.0)[..]), &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Cancelled), "{err}");
    assert!(h.files().is_empty());
    assert_eq!(h.asset_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_ingests_all_commit() {
    let h = std::sync::Arc::new(TestHarness::new());

    let mut tasks = Vec::new();
    for i in 0..8 {
        let h = std::sync::Arc::clone(&h);
        tasks.push(tokio::spawn(async move {
            let body = fake_video(6.0 + f64::from(i));
            h.ingestion()
                .ingest(Upload::new("clip.mp4", &body[..]), &CancellationToken::new())
                .await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(h.asset_count(), 8);
    assert_eq!(h.files().len(), 8);
}
