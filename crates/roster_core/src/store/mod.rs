//! Record store for users.
//!
//! # Responsibility
//! - Own the SQLite connection holding the `users` table.
//! - Publish a complete, id-ordered listing after every effective mutation.
//!
//! # Invariants
//! - Write paths call `User::validate()` before SQL mutations.
//! - Update/delete on an absent id is a silent no-op, not an error.
//! - Listings are published in commit order.

use crate::db::DbError;
use crate::model::user::{UserId, UserValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};

mod user_store;
mod user_table;

pub use user_store::UserStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Error for user persistence and query operations.
#[derive(Debug)]
pub enum StoreError {
    Validation(UserValidationError),
    Db(DbError),
    /// A row with this primary key already exists.
    ConstraintViolation(UserId),
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::ConstraintViolation(id) => write!(f, "user id {id} already exists"),
            Self::InvalidData(message) => write!(f, "invalid persisted user data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::ConstraintViolation(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<UserValidationError> for StoreError {
    fn from(value: UserValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
