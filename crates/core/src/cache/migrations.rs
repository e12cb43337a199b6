//! Schema migrations for the cache store.
//!
//! The applied schema version lives in SQLite's `user_version` pragma. Each
//! pending step runs in its own transaction together with the version bump,
//! so a failed step leaves the database at the previous version.

use super::Error;
use tokio_rusqlite::Connection;

/// Ordered schema steps; step `i` upgrades the database to version `i + 1`.
const MIGRATIONS: &[&str] = &[
    include_str!("../../migrations/001_caches.sql"),
    include_str!("../../migrations/002_entries.sql"),
];

/// Bring the schema up to the latest version.
///
/// # Errors
///
/// Returns `Error::MigrationFailed` if the database was written by a newer
/// build, and a database error if a step fails to apply.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        let current: usize = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
        if current > MIGRATIONS.len() {
            return Err(Error::MigrationFailed(format!(
                "schema version {current} is newer than supported version {}",
                MIGRATIONS.len()
            )));
        }

        for (index, sql) in MIGRATIONS.iter().enumerate().skip(current) {
            let version = index + 1;
            let tx = conn.transaction()?;
            tx.execute_batch(sql)?;
            tx.pragma_update(None, "user_version", version)?;
            tx.commit()?;
            tracing::debug!(version, "applied cache schema migration");
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}
