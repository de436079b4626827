//! Asset record operations.

use cf_core::{AssetId, AssetStatus, Error, Result};
use chrono::{SubsecRound, Utc};
use rusqlite::Connection;

use crate::models::{format_timestamp, Asset, NewAsset};

const COLS: &str =
    "id, storage_key, role, size_bytes, duration_seconds, status, error_detail, created_at";

/// Insert a new asset record. `created_at` is stamped here and never changes.
pub fn create_asset(conn: &Connection, new: &NewAsset) -> Result<Asset> {
    if new.size_bytes < 0 || new.duration_seconds < 0 {
        return Err(Error::Validation(format!(
            "asset {} has negative size or duration",
            new.id
        )));
    }
    // Stored with microsecond precision; truncate so the returned record equals a re-read.
    let created_at = Utc::now().trunc_subsecs(6);

    conn.execute(
        "INSERT INTO assets (id, storage_key, role, size_bytes, duration_seconds, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            new.id.to_string(),
            new.storage_key,
            new.role.as_str(),
            new.size_bytes,
            new.duration_seconds,
            new.status.as_str(),
            format_timestamp(created_at),
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(Asset {
        id: new.id,
        storage_key: new.storage_key.clone(),
        role: new.role,
        size_bytes: new.size_bytes,
        duration_seconds: new.duration_seconds,
        status: new.status,
        error_detail: None,
        created_at,
    })
}

/// Get an asset by ID.
pub fn get_asset(conn: &Connection, id: AssetId) -> Result<Option<Asset>> {
    let q = format!("SELECT {COLS} FROM assets WHERE id = ?1");
    match conn.query_row(&q, [id.to_string()], Asset::from_row) {
        Ok(a) => Ok(Some(a)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// List every asset, newest first.
pub fn list_assets(conn: &Connection) -> Result<Vec<Asset>> {
    let q = format!("SELECT {COLS} FROM assets ORDER BY created_at DESC, id");
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], Asset::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Move an asset to `status`.
///
/// `error_detail` is only kept for [`AssetStatus::Failed`]; any other status
/// clears it. Returns whether a row was updated.
pub fn update_asset_status(
    conn: &Connection,
    id: AssetId,
    status: AssetStatus,
    error_detail: Option<&str>,
) -> Result<bool> {
    let detail = match status {
        AssetStatus::Failed => error_detail,
        _ => None,
    };
    let n = conn
        .execute(
            "UPDATE assets SET status = ?1, error_detail = ?2 WHERE id = ?3",
            rusqlite::params![status.as_str(), detail, id.to_string()],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}
