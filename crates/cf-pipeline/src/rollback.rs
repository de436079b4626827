//! Scope guard for compensating actions.

use std::path::PathBuf;

type Compensation = Box<dyn FnOnce() + Send>;

/// Collects compensating actions while a multi-step operation runs.
///
/// Dropping the guard without calling [`Rollback::commit`] runs every
/// registered action, most recent first. Early returns via `?` and
/// cancelled futures both unwind through `Drop`, so cleanup never depends
/// on a later step running.
#[derive(Default)]
pub struct Rollback {
    actions: Vec<(String, Compensation)>,
}

impl Rollback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an arbitrary compensating action.
    pub fn push(&mut self, label: impl Into<String>, action: impl FnOnce() + Send + 'static) {
        self.actions.push((label.into(), Box::new(action)));
    }

    /// Remove `path` if the operation does not commit. A file that is
    /// already gone is not an error.
    pub fn remove_file(&mut self, path: PathBuf) {
        let label = format!("remove {}", path.display());
        self.push(label, move || match std::fs::remove_file(&path) {
            Ok(()) => tracing::debug!(path = %path.display(), "rolled back file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %path.display(), "rollback could not remove file: {e}"),
        });
    }

    /// Number of pending actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Keep every side effect; nothing runs on drop.
    pub fn commit(mut self) {
        self.actions.clear();
    }
}

impl Drop for Rollback {
    fn drop(&mut self) {
        while let Some((label, action)) = self.actions.pop() {
            tracing::debug!(%label, "rolling back");
            action();
        }
    }
}
