//! Ordered schema steps for the standup store.
//!
//! Step `n` moves `user_version` from `n - 1` to `n`. Pending steps run in a
//! single transaction, so a failed upgrade leaves the file untouched.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

/// `(version, sql)` pairs, strictly increasing.
const SCHEMA_STEPS: &[(u32, &str)] = &[
    (1, include_str!("0001_init.sql")),
    (2, include_str!("0002_standup_lines.sql")),
];

/// Highest schema version this build can write.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |&(version, _)| version)
}

/// Applies all pending migrations on the provided connection.
///
/// # Errors
/// - `DbError::UnsupportedSchemaVersion` when the file was written by a newer
///   binary. Nothing is changed in that case.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let on_disk = current_user_version(conn)?;
    let target = latest_version();
    if on_disk > target {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: on_disk,
            latest_supported: target,
        });
    }

    let pending: Vec<_> = SCHEMA_STEPS
        .iter()
        .filter(|&&(version, _)| version > on_disk)
        .collect();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for &&(version, sql) in &pending {
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", version)?;
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={} steps={}",
        on_disk,
        target,
        pending.len()
    );
    Ok(())
}

/// Reads the schema version recorded in `PRAGMA user_version`.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
