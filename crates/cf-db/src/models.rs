//! Rust structs mapping to database tables.
//!
//! Each model implements `from_row` for constructing itself from a
//! `rusqlite::Row` selected with the matching `COLS` list in `queries`.

use cf_core::{AssetId, AssetRole, AssetStatus, ShareLinkId};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// helpers
// ---------------------------------------------------------------------------

fn conversion_err(
    idx: usize,
    e: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into())
}

/// Parse a UUID-based ID from a text column.
fn parse_id<T: From<Uuid>>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T> {
    let s: String = row.get(idx)?;
    let uuid = Uuid::parse_str(&s).map_err(|e| conversion_err(idx, e))?;
    Ok(T::from(uuid))
}

/// Parse a `FromStr` enum stored as text.
fn parse_text<T>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    let s: String = row.get(idx)?;
    s.parse().map_err(|e: String| conversion_err(idx, e))
}

fn parse_timestamp(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let s: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_err(idx, e))
}

/// Fixed-width RFC 3339 form used for every stored timestamp.
///
/// Microsecond precision and a literal `Z` keep the text sortable, so SQL
/// range comparisons on these columns agree with chronological order.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

// ---------------------------------------------------------------------------
// Asset
// ---------------------------------------------------------------------------

/// A stored video file plus its metadata record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    /// File name relative to the storage root.
    pub storage_key: String,
    pub role: AssetRole,
    pub size_bytes: i64,
    pub duration_seconds: i64,
    pub status: AssetStatus,
    pub error_detail: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Asset {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            storage_key: row.get(1)?,
            role: parse_text(row, 2)?,
            size_bytes: row.get(3)?,
            duration_seconds: row.get(4)?,
            status: parse_text(row, 5)?,
            error_detail: row.get(6)?,
            created_at: parse_timestamp(row, 7)?,
        })
    }
}

/// Fields supplied by the caller when committing a new asset.
///
/// The id is chosen before the record exists because the storage key is
/// derived from it.
#[derive(Debug, Clone)]
pub struct NewAsset {
    pub id: AssetId,
    pub storage_key: String,
    pub role: AssetRole,
    pub size_bytes: i64,
    pub duration_seconds: i64,
    pub status: AssetStatus,
}

// ---------------------------------------------------------------------------
// ShareLink
// ---------------------------------------------------------------------------

/// A time-bounded reference to one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareLink {
    pub id: ShareLinkId,
    pub asset_id: AssetId,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl ShareLink {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            asset_id: parse_id(row, 1)?,
            expires_at: parse_timestamp(row, 2)?,
            created_at: parse_timestamp(row, 3)?,
        })
    }

    /// A link is live strictly before its expiry instant.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}
