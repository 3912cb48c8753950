//! SQL over the `users` table.
//!
//! Plain functions over a borrowed connection or transaction; locking and
//! publication live in `UserStore`.

use super::{StoreError, StoreResult};
use crate::model::user::{User, UserId};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};

const USER_SELECT_SQL: &str = "SELECT id, firstName, lastName, email FROM users";

pub(super) fn insert_user(conn: &Connection, user: &User) -> StoreResult<UserId> {
    user.validate()?;

    if !user.is_assigned() {
        conn.execute(
            "INSERT INTO users (firstName, lastName, email) VALUES (?1, ?2, ?3);",
            params![user.first_name, user.last_name, user.email],
        )?;
        return Ok(conn.last_insert_rowid());
    }

    let result = conn.execute(
        "INSERT INTO users (id, firstName, lastName, email) VALUES (?1, ?2, ?3, ?4);",
        params![user.id, user.first_name, user.last_name, user.email],
    );
    match result {
        Ok(_) => Ok(user.id),
        Err(err) if is_constraint_violation(&err) => Err(StoreError::ConstraintViolation(user.id)),
        Err(err) => Err(err.into()),
    }
}

/// Returns whether a row was overwritten.
pub(super) fn update_user(conn: &Connection, user: &User) -> StoreResult<bool> {
    user.validate()?;

    let changed = conn.execute(
        "UPDATE users
         SET
            firstName = ?1,
            lastName = ?2,
            email = ?3
         WHERE id = ?4;",
        params![user.first_name, user.last_name, user.email, user.id],
    )?;
    Ok(changed > 0)
}

/// Returns whether a row was removed.
pub(super) fn delete_user(conn: &Connection, id: UserId) -> StoreResult<bool> {
    let changed = conn.execute("DELETE FROM users WHERE id = ?1;", [id])?;
    Ok(changed > 0)
}

pub(super) fn get_user(conn: &Connection, id: UserId) -> StoreResult<Option<User>> {
    let mut stmt = conn.prepare_cached(&format!("{USER_SELECT_SQL} WHERE id = ?1;"))?;
    let user = stmt
        .query_row([id], |row| Ok(read_row(row)))
        .optional()?
        .transpose()?;
    Ok(user)
}

pub(super) fn list_users(conn: &Connection) -> StoreResult<Vec<User>> {
    let mut stmt = conn.prepare_cached(&format!("{USER_SELECT_SQL} ORDER BY id ASC;"))?;
    let mut rows = stmt.query([])?;
    let mut users = Vec::new();

    while let Some(row) = rows.next()? {
        users.push(read_row(row)?);
    }

    Ok(users)
}

fn read_row(row: &Row<'_>) -> StoreResult<User> {
    let user = User {
        id: row.get("id")?,
        first_name: row.get("firstName")?,
        last_name: row.get("lastName")?,
        email: row.get("email")?,
    };
    if user.id <= 0 {
        return Err(StoreError::InvalidData(format!(
            "invalid id value `{}` in users.id",
            user.id
        )));
    }
    Ok(user)
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _) if failure.code == ErrorCode::ConstraintViolation
    )
}
