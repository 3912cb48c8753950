//! Connection bootstrap utilities for SQLite.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON` and a busy timeout.
//! - Returned connections have the `users` schema applied.

use super::schema::apply_schema;
use super::DbResult;
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens a SQLite database file and prepares the `users` schema.
///
/// # Side effects
/// - Creates the file when it does not exist.
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_logged("file", || Connection::open(path))
}

/// Opens an in-memory SQLite database and prepares the `users` schema.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_logged("memory", Connection::open_in_memory)
}

/// Applies connection pragmas and schema to an already open connection.
///
/// Used when the caller owns connection construction (custom flags, shared
/// caches) but still wants the store invariants.
pub fn prepare_connection(conn: &mut Connection) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    apply_schema(conn)?;
    Ok(())
}

fn open_logged(
    mode: &'static str,
    connect: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let mut conn = connect().map_err(|err| {
        error!(
            "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={err}",
            started_at.elapsed().as_millis()
        );
        err
    })?;

    if let Err(err) = prepare_connection(&mut conn) {
        error!(
            "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={err}",
            started_at.elapsed().as_millis()
        );
        return Err(err);
    }

    info!(
        "event=db_open module=db status=ok mode={mode} duration_ms={}",
        started_at.elapsed().as_millis()
    );
    Ok(conn)
}
