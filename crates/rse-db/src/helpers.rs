//! Row-to-entity parsing helpers.
//!
//! `SQLite` integers are signed, while system identities use the full unsigned
//! 64-bit range. Ids are stored bit-for-bit and converted at this boundary
//! only.

use chrono::{DateTime, Utc};
use rse_core::{CatalogEntry, SourceClaims};

use crate::error::DatabaseError;

/// Reinterpret an identity as the signed value stored in SQL.
#[must_use]
pub const fn id_to_sql(id: u64) -> i64 {
    i64::from_ne_bytes(id.to_ne_bytes())
}

/// Inverse of [`id_to_sql`].
#[must_use]
pub const fn id_from_sql(raw: i64) -> u64 {
    u64::from_ne_bytes(raw.to_ne_bytes())
}

/// Parse a TEXT column as `DateTime<Utc>`.
///
/// Handles both RFC 3339 (`"2026-02-09T14:30:00+00:00"`) and `SQLite`'s default
/// format (`"2026-02-09 14:30:00"`).
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string cannot be parsed as either format.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| DatabaseError::Query(format!("Failed to parse datetime '{s}': {e}")))
}

/// Parse a nullable TEXT column as `Option<DateTime<Utc>>`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if a non-empty string cannot be parsed.
pub fn parse_optional_datetime(s: Option<&str>) -> Result<Option<DateTime<Utc>>, DatabaseError> {
    match s {
        Some(s) if !s.is_empty() => Ok(Some(parse_datetime(s)?)),
        _ => Ok(None),
    }
}

/// Narrow a stored integer into a `u32` column value.
///
/// # Errors
///
/// Returns `DatabaseError::InvalidState` if the value is out of range.
pub fn column_u32(raw: i64, column: &str) -> Result<u32, DatabaseError> {
    u32::try_from(raw)
        .map_err(|_| DatabaseError::InvalidState(format!("{column} out of range: {raw}")))
}

/// Read a single `COUNT(*)` style result.
///
/// # Errors
///
/// Returns `DatabaseError` if the query fails or yields no row.
pub async fn query_count(
    conn: &libsql::Connection,
    sql: &str,
    params: impl libsql::params::IntoParams,
) -> Result<u64, DatabaseError> {
    let mut rows = conn.query(sql, params).await?;
    let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
    let count = row.get::<i64>(0)?;
    u64::try_from(count).map_err(|_| DatabaseError::InvalidState(format!("negative count {count}")))
}

/// Column order: id, name, x, y, z, uncertainty, action_flags, created_at,
/// updated_at, deleted_at.
pub(crate) fn row_to_entry(row: &libsql::Row) -> Result<CatalogEntry, DatabaseError> {
    let deleted_at = row.get::<Option<String>>(9)?;
    Ok(CatalogEntry {
        id: id_from_sql(row.get::<i64>(0)?),
        name: row.get::<String>(1)?,
        x: row.get::<f64>(2)?,
        y: row.get::<f64>(3)?,
        z: row.get::<f64>(4)?,
        uncertainty: column_u32(row.get::<i64>(5)?, "uncertainty")?,
        claims: SourceClaims::from_bits(column_u32(row.get::<i64>(6)?, "action_flags")?),
        created_at: parse_datetime(&row.get::<String>(7)?)?,
        updated_at: parse_datetime(&row.get::<String>(8)?)?,
        deleted_at: parse_optional_datetime(deleted_at.as_deref())?,
    })
}
