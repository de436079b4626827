//! Asset lifecycle enums and the accepted container allow-list.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

// ---------------------------------------------------------------------------
// AssetStatus
// ---------------------------------------------------------------------------

/// Processing state of an asset record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl AssetStatus {
    /// The lowercase form stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AssetStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid asset status: {}", s)),
        }
    }
}

// ---------------------------------------------------------------------------
// AssetRole
// ---------------------------------------------------------------------------

/// How an asset came to exist. Doubles as the storage-key suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetRole {
    /// Uploaded by a client.
    Original,
    /// Sub-range cut from another asset.
    Trimmed,
    /// Concatenation of several assets.
    Merged,
}

impl AssetRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Trimmed => "trimmed",
            Self::Merged => "merged",
        }
    }
}

impl fmt::Display for AssetRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AssetRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "original" => Ok(Self::Original),
            "trimmed" => Ok(Self::Trimmed),
            "merged" => Ok(Self::Merged),
            _ => Err(format!("Invalid asset role: {}", s)),
        }
    }
}

// ---------------------------------------------------------------------------
// Container allow-list
// ---------------------------------------------------------------------------

/// Accepted upload containers as (extension, MIME type) pairs.
const ALLOWED_CONTAINERS: &[(&str, &str)] = &[
    ("mp4", "video/mp4"),
    ("mov", "video/quicktime"),
    ("avi", "video/x-msvideo"),
    ("mkv", "video/x-matroska"),
    ("webm", "video/webm"),
];

/// Content type sent by clients that do not know better.
const GENERIC_CONTENT_TYPE: &str = "application/octet-stream";

/// Return the lowercased extension of `path` if it is an accepted container.
///
/// ```
/// use std::path::Path;
/// use cf_core::allowed_extension;
///
/// assert_eq!(allowed_extension(Path::new("clip.MP4")).as_deref(), Some("mp4"));
/// assert_eq!(allowed_extension(Path::new("notes.txt")), None);
/// ```
pub fn allowed_extension(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    ALLOWED_CONTAINERS
        .iter()
        .any(|(allowed, _)| *allowed == ext)
        .then_some(ext)
}

/// Check a declared content type against the allow-list.
///
/// A missing or generic content type is accepted and leaves the decision to
/// the extension check. Parameters such as `; codecs=...` are ignored.
pub fn is_allowed_content_type(content_type: Option<&str>) -> bool {
    let Some(raw) = content_type else {
        return true;
    };
    let essence = raw
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if essence.is_empty() || essence == GENERIC_CONTENT_TYPE {
        return true;
    }
    ALLOWED_CONTAINERS.iter().any(|(_, mime)| *mime == essence)
}

/// Comma-separated list of accepted extensions, for error messages.
pub fn allowed_extensions_display() -> String {
    ALLOWED_CONTAINERS
        .iter()
        .map(|(ext, _)| format!(".{ext}"))
        .collect::<Vec<_>>()
        .join(", ")
}
