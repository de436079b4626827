//! Read-only media inspection.
//!
//! [`MediaProbe`] is the seam the pipelines depend on; [`FfprobeProber`] is
//! the production implementation, shelling out to
//! `ffprobe -v quiet -print_format json -show_format`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use cf_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::command::ToolCommand;

/// What a probe reports about a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeInfo {
    /// Container duration in seconds, possibly fractional.
    pub duration_seconds: f64,
    /// File size in bytes as reported by the tool.
    pub size_bytes: u64,
    /// Container format name, e.g. `mov,mp4,m4a,3gp,3g2,mj2`.
    pub format: String,
}

/// Inspect a media file without modifying it.
#[async_trait]
pub trait MediaProbe: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Probe `path`.
    ///
    /// Fails with [`Error::Probe`] when the tool fails or its output is not
    /// usable, and with [`Error::Cancelled`] when `cancel` fires first.
    async fn probe(&self, path: &Path, cancel: &CancellationToken) -> Result<ProbeInfo>;
}

/// A prober backed by the `ffprobe` CLI.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    ffprobe_path: PathBuf,
    timeout: Duration,
}

impl FfprobeProber {
    pub fn new(ffprobe_path: PathBuf, timeout: Duration) -> Self {
        Self {
            ffprobe_path,
            timeout,
        }
    }
}

#[async_trait]
impl MediaProbe for FfprobeProber {
    fn name(&self) -> &'static str {
        "ffprobe"
    }

    async fn probe(&self, path: &Path, cancel: &CancellationToken) -> Result<ProbeInfo> {
        let output = ToolCommand::new(self.ffprobe_path.clone())
            .args(["-v", "quiet", "-print_format", "json", "-show_format"])
            .arg(path)
            .timeout(self.timeout)
            .cancel_on(cancel.clone())
            .execute()
            .await
            .map_err(Error::into_probe)?;

        let info = parse_ffprobe_output(&output.stdout)?;
        tracing::debug!(
            path = %path.display(),
            duration = info.duration_seconds,
            size = info.size_bytes,
            format = %info.format,
            "probed"
        );
        Ok(info)
    }
}

// ---------------------------------------------------------------------------
// JSON structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
}

/// ffprobe encodes numbers in the format section as strings.
#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    format_name: Option<String>,
    duration: Option<String>,
    size: Option<String>,
}

/// Parse the JSON document printed by `ffprobe -show_format`.
pub fn parse_ffprobe_output(stdout: &str) -> Result<ProbeInfo> {
    let ff: FfprobeOutput = serde_json::from_str(stdout)
        .map_err(|e| Error::Probe(format!("ffprobe JSON parse error: {e}")))?;
    let format = ff
        .format
        .ok_or_else(|| Error::Probe("ffprobe output has no format section".into()))?;

    let raw_duration = format
        .duration
        .ok_or_else(|| Error::Probe("ffprobe output has no duration".into()))?;
    let duration_seconds: f64 = raw_duration
        .trim()
        .parse()
        .map_err(|_| Error::Probe(format!("duration is not numeric: {raw_duration:?}")))?;
    if !duration_seconds.is_finite() || duration_seconds < 0.0 {
        return Err(Error::Probe(format!(
            "duration out of range: {raw_duration:?}"
        )));
    }

    let raw_size = format
        .size
        .ok_or_else(|| Error::Probe("ffprobe output has no size".into()))?;
    let size_bytes: u64 = raw_size
        .trim()
        .parse()
        .map_err(|_| Error::Probe(format!("size is not numeric: {raw_size:?}")))?;

    let format_name = format
        .format_name
        .filter(|f| !f.trim().is_empty())
        .ok_or_else(|| Error::Probe("ffprobe output has no format_name".into()))?;

    Ok(ProbeInfo {
        duration_seconds,
        size_bytes,
        format: format_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "format": {
            "filename": "/videos/clip.mp4",
            "nb_streams": 2,
            "format_name": "mov,mp4,m4a,3gp,3g2,mj2",
            "duration": "10.010000",
            "size": "1048576",
            "bit_rate": "838026"
        }
    }"#;

    #[test]
    fn parses_format_section() {
        let info = parse_ffprobe_output(SAMPLE).unwrap();
        assert!((info.duration_seconds - 10.01).abs() < 1e-9);
        assert_eq!(info.size_bytes, 1_048_576);
        assert_eq!(info.format, "mov,mp4,m4a,3gp,3g2,mj2");
    }

    #[test]
    fn empty_output_is_probe_error() {
        // `-v quiet` on an unreadable file prints "{}" or nothing at all.
        assert!(matches!(parse_ffprobe_output(""), Err(Error::Probe(_))));
        assert!(matches!(parse_ffprobe_output("{}"), Err(Error::Probe(_))));
    }

    #[test]
    fn non_numeric_duration_rejected() {
        let json = r#"{"format": {"format_name": "mp4", "duration": "N/A", "size": "10"}}"#;
        let err = parse_ffprobe_output(json).unwrap_err();
        assert!(err.to_string().contains("duration"), "{err}");
    }

    #[test]
    fn nan_and_negative_duration_rejected() {
        for d in ["nan", "inf", "-1.0"] {
            let json = format!(
                r#"{{"format": {{"format_name": "mp4", "duration": "{d}", "size": "10"}}}}"#
            );
            assert!(parse_ffprobe_output(&json).is_err(), "accepted {d}");
        }
    }

    #[test]
    fn non_numeric_size_rejected() {
        let json = r#"{"format": {"format_name": "mp4", "duration": "3.0", "size": "big"}}"#;
        let err = parse_ffprobe_output(json).unwrap_err();
        assert!(err.to_string().contains("size"), "{err}");
    }

    #[test]
    fn missing_format_name_rejected() {
        let json = r#"{"format": {"duration": "3.0", "size": "10"}}"#;
        assert!(parse_ffprobe_output(json).is_err());
    }

    #[tokio::test]
    async fn missing_binary_is_probe_error() {
        let prober = FfprobeProber::new(
            PathBuf::from("nonexistent_ffprobe_xyz"),
            Duration::from_secs(5),
        );
        let err = prober
            .probe(Path::new("/tmp/none.mp4"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Probe(_)), "{err}");
    }
}
