//! User domain model.
//!
//! # Responsibility
//! - Define the single record kind managed by the roster.
//! - Provide the non-blank validation shared by the store and the form.
//!
//! # Invariants
//! - `id` is immutable once the store assigns it and is never reused.
//! - `UNASSIGNED_USER_ID` marks a user that has not been inserted yet.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned primary key.
pub type UserId = i64;

/// Placeholder id for users built before insertion; the store assigns a
/// fresh id when it sees this value.
pub const UNASSIGNED_USER_ID: UserId = 0;

/// One of the three editable text fields of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UserField {
    FirstName,
    LastName,
    Email,
}

impl UserField {
    pub const ALL: [UserField; 3] = [Self::FirstName, Self::LastName, Self::Email];

    /// Column / wire name of this field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FirstName => "firstName",
            Self::LastName => "lastName",
            Self::Email => "email",
        }
    }

    /// Parses a field name; accepts both camelCase and snake_case spellings.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "firstName" | "first_name" => Some(Self::FirstName),
            "lastName" | "last_name" => Some(Self::LastName),
            "email" => Some(Self::Email),
            _ => None,
        }
    }
}

impl Display for UserField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation failures for user records and form input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    /// Field is empty or whitespace-only.
    BlankField(UserField),
    /// Identifier is negative.
    InvalidId(UserId),
}

impl Display for UserValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "{field} must not be blank"),
            Self::InvalidId(id) => write!(f, "user id must not be negative, got {id}"),
        }
    }
}

impl Error for UserValidationError {}

/// A person in the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl User {
    /// Builds a user that the store will assign an id to on insert.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self::with_id(UNASSIGNED_USER_ID, first_name, last_name, email)
    }

    /// Builds a user with a caller-provided id.
    pub fn with_id(
        id: UserId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
        }
    }

    /// Whether the store has assigned this user an id.
    pub fn is_assigned(&self) -> bool {
        self.id != UNASSIGNED_USER_ID
    }

    pub fn field(&self, field: UserField) -> &str {
        match field {
            UserField::FirstName => &self.first_name,
            UserField::LastName => &self.last_name,
            UserField::Email => &self.email,
        }
    }

    /// Checks the record invariants enforced on every store write.
    ///
    /// Email format is deliberately not checked, only presence.
    pub fn validate(&self) -> Result<(), UserValidationError> {
        if self.id < 0 {
            return Err(UserValidationError::InvalidId(self.id));
        }
        for field in UserField::ALL {
            if is_blank(self.field(field)) {
                return Err(UserValidationError::BlankField(field));
            }
        }
        Ok(())
    }
}

/// True for empty or whitespace-only text.
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
