//! External tool discovery.
//!
//! The [`ToolRegistry`] resolves ffmpeg and ffprobe from configured paths or
//! `PATH`, and builds the tool-backed probe and editor from them.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use cf_core::config::{EncodeConfig, ToolsConfig};
use cf_core::{Error, Result};
use serde::Serialize;

use crate::command::ToolCommand;
use crate::editor::FfmpegEditor;
use crate::probe::FfprobeProber;

/// Tools the registry manages.
const KNOWN_TOOLS: &[&str] = &["ffmpeg", "ffprobe"];

/// Version checks should be near-instant.
const VERSION_TIMEOUT: Duration = Duration::from_secs(10);

/// Availability information for a tool, returned by [`ToolRegistry::check_all`].
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub available: bool,
    /// First line of `-version` output.
    pub version: Option<String>,
    pub path: Option<PathBuf>,
}

/// Registry holding discovered tool paths.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<&'static str, PathBuf>,
    config: ToolsConfig,
}

impl ToolRegistry {
    /// Resolve each known tool.
    ///
    /// A configured path is used when it exists; otherwise (or when it is
    /// missing on disk) `which` searches `PATH`. Tools that cannot be found
    /// are left out and reported by [`ToolRegistry::require`].
    pub fn discover(config: &ToolsConfig) -> Self {
        let mut tools = BTreeMap::new();

        for &name in KNOWN_TOOLS {
            let custom = match name {
                "ffmpeg" => config.ffmpeg_path.as_deref(),
                "ffprobe" => config.ffprobe_path.as_deref(),
                _ => None,
            };

            let resolved = match custom {
                Some(p) if p.exists() => Some(p.to_path_buf()),
                Some(p) => {
                    tracing::warn!(tool = name, path = %p.display(), "configured path missing; searching PATH");
                    which::which(name).ok()
                }
                None => which::which(name).ok(),
            };

            match resolved {
                Some(path) => {
                    tracing::debug!(tool = name, path = %path.display(), "tool found");
                    tools.insert(name, path);
                }
                None => tracing::debug!(tool = name, "tool not found"),
            }
        }

        Self {
            tools,
            config: config.clone(),
        }
    }

    /// Path for `name`, or [`Error::Tool`] if it was not found.
    pub fn require(&self, name: &str) -> Result<&Path> {
        self.tools
            .get(name)
            .map(PathBuf::as_path)
            .ok_or_else(|| Error::tool(name, format!("{name} not found; is it installed and in PATH?")))
    }

    /// An ffprobe-backed prober using the configured timeout.
    pub fn prober(&self) -> Result<FfprobeProber> {
        Ok(FfprobeProber::new(
            self.require("ffprobe")?.to_path_buf(),
            self.config.probe_timeout(),
        ))
    }

    /// An ffmpeg-backed editor using the configured timeout and codecs.
    pub fn editor(&self, encode: &EncodeConfig) -> Result<FfmpegEditor> {
        Ok(FfmpegEditor::new(
            self.require("ffmpeg")?.to_path_buf(),
            self.config.edit_timeout(),
            encode.clone(),
        ))
    }

    /// Report every known tool with its version when available.
    pub async fn check_all(&self) -> Vec<ToolInfo> {
        let mut infos = Vec::with_capacity(KNOWN_TOOLS.len());
        for &name in KNOWN_TOOLS {
            let info = match self.tools.get(name) {
                Some(path) => ToolInfo {
                    name: name.to_string(),
                    available: true,
                    version: detect_version(path).await,
                    path: Some(path.clone()),
                },
                None => ToolInfo {
                    name: name.to_string(),
                    available: false,
                    version: None,
                    path: None,
                },
            };
            infos.push(info);
        }
        infos
    }
}

async fn detect_version(path: &Path) -> Option<String> {
    let output = ToolCommand::new(path.to_path_buf())
        .arg("-version")
        .timeout(VERSION_TIMEOUT)
        .execute()
        .await
        .ok()?;
    output.stdout.lines().next().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_missing_tool_returns_error() {
        let registry = ToolRegistry::discover(&ToolsConfig::default());
        let err = registry.require("nonexistent_tool_xyz").unwrap_err();
        assert!(matches!(err, Error::Tool { .. }));
    }

    #[test]
    fn configured_path_wins_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("my-ffprobe");
        std::fs::write(&fake, b"#!/bin/sh\n").unwrap();

        let config = ToolsConfig {
            ffprobe_path: Some(fake.clone()),
            ..ToolsConfig::default()
        };
        let registry = ToolRegistry::discover(&config);
        assert_eq!(registry.require("ffprobe").unwrap(), fake.as_path());
        assert!(registry.prober().is_ok());
    }

    #[tokio::test]
    async fn check_all_lists_known_tools() {
        let registry = ToolRegistry::discover(&ToolsConfig::default());
        let infos = registry.check_all().await;
        let names: Vec<&str> = infos.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["ffmpeg", "ffprobe"]);
        for info in infos {
            assert_eq!(info.available, info.path.is_some());
        }
    }
}
