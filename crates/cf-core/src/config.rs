//! Application configuration types.
//!
//! Every section defaults sensibly so an empty document is a valid config.
//! Parsing lives with the binary; this module only defines the shape and the
//! non-fatal sanity checks.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub database: DatabaseConfig,
    pub tools: ToolsConfig,
    pub encode: EncodeConfig,
    pub policy: PolicyConfig,
    pub share: ShareConfig,
}

impl Config {
    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.policy.min_duration_secs > self.policy.max_duration_secs {
            warnings.push(format!(
                "policy.min_duration_secs ({}) is greater than policy.max_duration_secs ({}); every upload will be rejected",
                self.policy.min_duration_secs, self.policy.max_duration_secs
            ));
        }
        if self.policy.max_upload_bytes == 0 {
            warnings.push("policy.max_upload_bytes is 0; every upload will be rejected".into());
        }
        if self.share.min_ttl_hours == 0 {
            warnings.push("share.min_ttl_hours is 0; links may expire on creation".into());
        }
        if self.share.min_ttl_hours > self.share.max_ttl_hours {
            warnings.push(format!(
                "share.min_ttl_hours ({}) is greater than share.max_ttl_hours ({})",
                self.share.min_ttl_hours, self.share.max_ttl_hours
            ));
        }
        if self.tools.probe_timeout_secs == 0 || self.tools.edit_timeout_secs == 0 {
            warnings.push("tools timeouts of 0 seconds will fail every invocation".into());
        }
        if self.encode.video_codec.trim().is_empty() || self.encode.audio_codec.trim().is_empty() {
            warnings.push("encode codecs must not be empty".into());
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Where asset files live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data/videos"),
        }
    }
}

/// SQLite metadata store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    /// SQLite busy handler timeout.
    pub busy_timeout_ms: u64,
    /// How long a caller waits for the single pooled connection.
    pub connection_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/clipforge.db"),
            busy_timeout_ms: 5_000,
            connection_timeout_secs: 30,
        }
    }
}

impl DatabaseConfig {
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }
}

/// External tool locations and time limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Explicit ffmpeg binary; `PATH` lookup when unset.
    pub ffmpeg_path: Option<PathBuf>,
    /// Explicit ffprobe binary; `PATH` lookup when unset.
    pub ffprobe_path: Option<PathBuf>,
    pub probe_timeout_secs: u64,
    pub edit_timeout_secs: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            ffprobe_path: None,
            probe_timeout_secs: 30,
            edit_timeout_secs: 600,
        }
    }
}

impl ToolsConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn edit_timeout(&self) -> Duration {
        Duration::from_secs(self.edit_timeout_secs)
    }
}

/// Codec pairing used when trim/merge re-encode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeConfig {
    pub video_codec: String,
    pub audio_codec: String,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            video_codec: "libx264".into(),
            audio_codec: "aac".into(),
        }
    }
}

/// Upload acceptance bounds. Duration bounds are inclusive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub min_duration_secs: u64,
    pub max_duration_secs: u64,
    pub max_upload_bytes: u64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            min_duration_secs: 5,
            max_duration_secs: 25,
            max_upload_bytes: 25 * 1024 * 1024,
        }
    }
}

impl PolicyConfig {
    /// True when `duration_secs` lies within `[min, max]`.
    pub fn accepts_duration(&self, duration_secs: f64) -> bool {
        duration_secs >= self.min_duration_secs as f64
            && duration_secs <= self.max_duration_secs as f64
    }
}

/// Share-link TTL bounds, in hours, inclusive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareConfig {
    pub min_ttl_hours: u32,
    pub max_ttl_hours: u32,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            min_ttl_hours: 1,
            max_ttl_hours: 168,
        }
    }
}
