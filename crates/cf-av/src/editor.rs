//! Non-destructive edits through an external transcoder.
//!
//! Both operations write a new file at the requested output path and never
//! touch their inputs. Cleaning up a partially written output after a
//! failure is the caller's job.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use cf_core::config::EncodeConfig;
use cf_core::{Error, Result};
use tokio_util::sync::CancellationToken;

use crate::command::ToolCommand;
use crate::manifest::ConcatManifest;

/// Trim and concatenate media files.
#[async_trait]
pub trait MediaEditor: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Write the `[start, end)` range of `input` (seconds, fractional allowed)
    /// to `output`. The result is approximately `end - start` long.
    async fn trim(
        &self,
        input: &Path,
        output: &Path,
        start: f64,
        end: f64,
        cancel: &CancellationToken,
    ) -> Result<()>;

    /// Concatenate `inputs` in the given order into `output`.
    async fn merge(
        &self,
        inputs: &[PathBuf],
        output: &Path,
        cancel: &CancellationToken,
    ) -> Result<()>;
}

/// Reject structurally invalid ranges: negative start, or end not after start.
pub fn validate_trim_range(start: f64, end: f64) -> Result<()> {
    if !(start.is_finite() && end.is_finite()) {
        return Err(Error::Edit(format!(
            "trim range must be finite, got {start}..{end}"
        )));
    }
    if start < 0.0 {
        return Err(Error::Edit(format!("trim start {start} is negative")));
    }
    if end <= start {
        return Err(Error::Edit(format!(
            "trim end {end} must be after start {start}"
        )));
    }
    Ok(())
}

/// Require at least two inputs, all of which exist.
pub fn validate_merge_inputs(inputs: &[PathBuf]) -> Result<()> {
    if inputs.len() < 2 {
        return Err(Error::Edit(format!(
            "merge needs at least 2 inputs, got {}",
            inputs.len()
        )));
    }
    if let Some(missing) = inputs.iter().find(|p| !p.is_file()) {
        return Err(Error::Edit(format!(
            "merge input does not exist: {}",
            missing.display()
        )));
    }
    Ok(())
}

/// An editor backed by the `ffmpeg` CLI.
#[derive(Debug, Clone)]
pub struct FfmpegEditor {
    ffmpeg_path: PathBuf,
    timeout: Duration,
    encode: EncodeConfig,
}

impl FfmpegEditor {
    pub fn new(ffmpeg_path: PathBuf, timeout: Duration, encode: EncodeConfig) -> Self {
        Self {
            ffmpeg_path,
            timeout,
            encode,
        }
    }

    fn command(&self, cancel: &CancellationToken) -> ToolCommand {
        let mut cmd = ToolCommand::new(self.ffmpeg_path.clone());
        cmd.args(["-hide_banner", "-nostdin", "-v", "error", "-y"])
            .timeout(self.timeout)
            .cancel_on(cancel.clone());
        cmd
    }

    fn encode_args(&self, cmd: &mut ToolCommand) {
        cmd.args([
            "-c:v",
            self.encode.video_codec.as_str(),
            "-c:a",
            self.encode.audio_codec.as_str(),
        ]);
    }
}

#[async_trait]
impl MediaEditor for FfmpegEditor {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn trim(
        &self,
        input: &Path,
        output: &Path,
        start: f64,
        end: f64,
        cancel: &CancellationToken,
    ) -> Result<()> {
        validate_trim_range(start, end)?;
        if !input.is_file() {
            return Err(Error::Edit(format!(
                "trim input does not exist: {}",
                input.display()
            )));
        }

        // -ss after -i decodes from the start and cuts accurately.
        let mut cmd = self.command(cancel);
        cmd.arg("-i")
            .arg(input)
            .arg("-ss")
            .arg(format!("{start:.3}"))
            .arg("-t")
            .arg(format!("{:.3}", end - start));
        self.encode_args(&mut cmd);
        cmd.arg(output);

        tracing::info!(
            input = %input.display(),
            output = %output.display(),
            start,
            end,
            "trimming"
        );
        cmd.execute().await.map_err(Error::into_edit)?;
        Ok(())
    }

    async fn merge(
        &self,
        inputs: &[PathBuf],
        output: &Path,
        cancel: &CancellationToken,
    ) -> Result<()> {
        validate_merge_inputs(inputs)?;

        let manifest_dir = output
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(std::env::temp_dir);
        let manifest = ConcatManifest::write_in(&manifest_dir, inputs)?;

        let mut cmd = self.command(cancel);
        cmd.args(["-f", "concat", "-safe", "0", "-i"])
            .arg(manifest.path());
        self.encode_args(&mut cmd);
        cmd.arg(output);

        tracing::info!(
            inputs = inputs.len(),
            output = %output.display(),
            "merging"
        );
        let result = cmd.execute().await.map_err(Error::into_edit);
        drop(manifest);
        result.map(|_| ())
    }
}
