//! SQLite storage bootstrap for the roster core.
//!
//! # Responsibility
//! - Open and configure SQLite connections.
//! - Create the single `users` table on first open.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - Callers never see a connection whose schema is not ready.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;
pub mod schema;

pub use open::{open_db, open_db_in_memory, prepare_connection};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion { db_version: u32, supported: u32 },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
