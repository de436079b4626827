//! Share link record operations.
//!
//! Rows are never removed because they expired; liveness is decided by the
//! caller against its own clock.

use cf_core::{AssetId, Error, Result, ShareLinkId};
use chrono::{DateTime, SubsecRound, Utc};
use rusqlite::Connection;

use crate::models::{format_timestamp, ShareLink};

const COLS: &str = "id, asset_id, expires_at, created_at";

/// Insert a share link with caller-supplied timestamps.
pub fn create_share_link(
    conn: &Connection,
    id: ShareLinkId,
    asset_id: AssetId,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> Result<ShareLink> {
    let created_at = created_at.trunc_subsecs(6);
    let expires_at = expires_at.trunc_subsecs(6);

    conn.execute(
        "INSERT INTO share_links (id, asset_id, expires_at, created_at) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![
            id.to_string(),
            asset_id.to_string(),
            format_timestamp(expires_at),
            format_timestamp(created_at),
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(ShareLink {
        id,
        asset_id,
        expires_at,
        created_at,
    })
}

/// Get a share link by ID, expired or not.
pub fn get_share_link(conn: &Connection, id: ShareLinkId) -> Result<Option<ShareLink>> {
    let q = format!("SELECT {COLS} FROM share_links WHERE id = ?1");
    match conn.query_row(&q, [id.to_string()], ShareLink::from_row) {
        Ok(link) => Ok(Some(link)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Every share link, newest first.
pub fn list_share_links(conn: &Connection) -> Result<Vec<ShareLink>> {
    let q = format!("SELECT {COLS} FROM share_links ORDER BY created_at DESC, id");
    query_links(conn, &q, &[])
}

/// Share links for one asset, newest first.
pub fn list_share_links_for_asset(conn: &Connection, asset_id: AssetId) -> Result<Vec<ShareLink>> {
    let q = format!(
        "SELECT {COLS} FROM share_links WHERE asset_id = ?1 ORDER BY created_at DESC, id"
    );
    query_links(conn, &q, &[&asset_id.to_string()])
}

/// Links whose expiry falls in `(after, until]`, soonest first.
pub fn list_expiring_between(
    conn: &Connection,
    after: DateTime<Utc>,
    until: DateTime<Utc>,
) -> Result<Vec<ShareLink>> {
    let q = format!(
        "SELECT {COLS} FROM share_links
         WHERE expires_at > ?1 AND expires_at <= ?2
         ORDER BY expires_at ASC, id"
    );
    query_links(
        conn,
        &q,
        &[&format_timestamp(after), &format_timestamp(until)],
    )
}

/// Delete a share link. Returns whether a row was removed.
pub fn delete_share_link(conn: &Connection, id: ShareLinkId) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM share_links WHERE id = ?1", [id.to_string()])
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

fn query_links(
    conn: &Connection,
    q: &str,
    params: &[&dyn rusqlite::types::ToSql],
) -> Result<Vec<ShareLink>> {
    let mut stmt = conn.prepare(q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map(params, ShareLink::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewAsset;
    use crate::pool::{get_conn, init_memory_pool};
    use crate::queries::assets::create_asset;
    use cf_core::{AssetRole, AssetStatus};
    use chrono::{Duration, TimeZone};

    fn seed_asset(conn: &Connection) -> AssetId {
        let id = AssetId::new();
        create_asset(
            conn,
            &NewAsset {
                id,
                storage_key: format!("{}_original.mp4", id.simple()),
                role: AssetRole::Original,
                size_bytes: 100,
                duration_seconds: 10,
                status: AssetStatus::Completed,
            },
        )
        .unwrap();
        id
    }

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
    }

    #[test]
    fn create_and_get() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();
        let asset_id = seed_asset(&conn);

        let link = create_share_link(
            &conn,
            ShareLinkId::new(),
            asset_id,
            base(),
            base() + Duration::hours(24),
        )
        .unwrap();
        let fetched = get_share_link(&conn, link.id).unwrap().unwrap();
        assert_eq!(link, fetched);
        assert_eq!(fetched.expires_at - fetched.created_at, Duration::hours(24));
    }

    #[test]
    fn unknown_asset_violates_foreign_key() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();
        let err = create_share_link(
            &conn,
            ShareLinkId::new(),
            AssetId::new(),
            base(),
            base() + Duration::hours(1),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Database { .. }));
    }

    #[test]
    fn list_by_asset_filters() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();
        let a = seed_asset(&conn);
        let b = seed_asset(&conn);

        for asset in [a, a, b] {
            create_share_link(&conn, ShareLinkId::new(), asset, base(), base() + Duration::hours(2))
                .unwrap();
        }

        assert_eq!(list_share_links(&conn).unwrap().len(), 3);
        let for_a = list_share_links_for_asset(&conn, a).unwrap();
        assert_eq!(for_a.len(), 2);
        assert!(for_a.iter().all(|l| l.asset_id == a));
    }

    #[test]
    fn expiring_between_uses_half_open_window() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();
        let asset = seed_asset(&conn);

        let mut ids = Vec::new();
        for hours in [1, 5, 30] {
            let link = create_share_link(
                &conn,
                ShareLinkId::new(),
                asset,
                base(),
                base() + Duration::hours(hours),
            )
            .unwrap();
            ids.push(link.id);
        }

        let soon = list_expiring_between(&conn, base() + Duration::hours(1), base() + Duration::hours(24))
            .unwrap();
        assert_eq!(soon.len(), 1);
        assert_eq!(soon[0].id, ids[1]);
    }

    #[test]
    fn delete_reports_whether_removed() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();
        let asset = seed_asset(&conn);
        let link =
            create_share_link(&conn, ShareLinkId::new(), asset, base(), base() + Duration::hours(1))
                .unwrap();

        assert!(delete_share_link(&conn, link.id).unwrap());
        assert!(!delete_share_link(&conn, link.id).unwrap());
        assert!(get_share_link(&conn, link.id).unwrap().is_none());
    }

    #[test]
    fn links_cascade_with_asset() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();
        let asset = seed_asset(&conn);
        let link =
            create_share_link(&conn, ShareLinkId::new(), asset, base(), base() + Duration::hours(1))
                .unwrap();

        conn.execute("DELETE FROM assets WHERE id = ?1", [asset.to_string()])
            .unwrap();
        assert!(get_share_link(&conn, link.id).unwrap().is_none());
    }
}
