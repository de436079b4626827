//! Concat-demuxer manifest files.
//!
//! ffmpeg's concat demuxer reads a list of `file '<path>'` lines. The
//! manifest lives in a named temp file that is removed when
//! [`ConcatManifest`] is dropped, whether or not the merge succeeded.

use std::io::Write;
use std::path::{Path, PathBuf};

use cf_core::{Error, Result};
use tempfile::NamedTempFile;

/// A manifest file on disk, deleted on drop.
#[derive(Debug)]
pub struct ConcatManifest {
    file: NamedTempFile,
}

impl ConcatManifest {
    /// Write a manifest for `inputs` (in order) into `dir`.
    pub fn write_in(dir: &Path, inputs: &[PathBuf]) -> Result<Self> {
        let body = render_manifest(inputs)?;
        let mut file = tempfile::Builder::new()
            .prefix(".concat-")
            .suffix(".txt")
            .tempfile_in(dir)
            .map_err(|e| Error::Edit(format!("failed to create concat manifest: {e}")))?;
        file.write_all(body.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|e| Error::Edit(format!("failed to write concat manifest: {e}")))?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Render manifest text, one absolute path per line.
///
/// Single quotes are closed, escaped and reopened (`'\''`). Line breaks
/// cannot be expressed and are rejected.
pub fn render_manifest(inputs: &[PathBuf]) -> Result<String> {
    let mut body = String::new();
    for input in inputs {
        let absolute = std::path::absolute(input)
            .map_err(|e| Error::Edit(format!("cannot resolve {}: {e}", input.display())))?;
        let text = absolute
            .to_str()
            .ok_or_else(|| Error::Edit(format!("path is not UTF-8: {}", absolute.display())))?;
        if text.contains(['\n', '\r']) {
            return Err(Error::Edit(format!(
                "path contains a line break: {text:?}"
            )));
        }
        body.push_str("file '");
        body.push_str(&text.replace('\'', r"'\''"));
        body.push_str("'\n");
    }
    Ok(body)
}
