//! cf-pipeline: the consistency layer between files on disk and their
//! metadata records.
//!
//! - [`IngestionPipeline`] turns an upload into a probed, policy-checked,
//!   persisted [`Asset`](cf_db::Asset).
//! - [`EditPipeline`] produces new assets by trimming or merging existing ones.
//! - [`ShareLifecycle`] issues and resolves time-limited share links.
//!
//! Every step that leaves something on disk registers a compensating action
//! on a [`Rollback`] guard; an early return runs them in reverse order.

pub mod edit;
pub mod ingest;
pub mod rollback;
pub mod share;
pub mod storage;

pub use edit::EditPipeline;
pub use ingest::{IngestionPipeline, Upload};
pub use rollback::Rollback;
pub use share::{ResolvedShare, ShareLifecycle};
pub use storage::AssetStorage;

use cf_core::{Error, Result};

/// Run a blocking store call off the async worker threads.
///
/// The store hands out a single connection; waiting for it must not stall
/// the runtime.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Internal(format!("store task failed: {e}")))?
}

/// A probe failure on a file the pipeline just produced means the file is
/// not usable media.
pub(crate) fn invalid_media(err: Error) -> Error {
    match err {
        Error::Cancelled => Error::Cancelled,
        other => Error::InvalidMedia(other.to_string()),
    }
}
