//! Fixed `users` table definition.
//!
//! There is exactly one schema version. A fresh database is created at that
//! version; a database stamped with a newer version is refused.

use crate::db::{DbError, DbResult};
use rusqlite::Connection;

/// Version written to `PRAGMA user_version` once the table exists.
pub const SCHEMA_VERSION: u32 = 1;

const CREATE_USERS_SQL: &str = "CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    firstName TEXT NOT NULL,
    lastName TEXT NOT NULL,
    email TEXT NOT NULL
);";

/// Creates the `users` table when missing and stamps the schema version.
pub fn apply_schema(conn: &mut Connection) -> DbResult<()> {
    let current = schema_version(conn)?;

    if current > SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current,
            supported: SCHEMA_VERSION,
        });
    }
    if current == SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn.transaction()?;
    tx.execute_batch(CREATE_USERS_SQL)?;
    tx.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))?;
    tx.commit()?;

    Ok(())
}

/// Reads the schema version stamped on this connection's database.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
