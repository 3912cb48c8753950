//! Form and view state owned by the controller.
//!
//! # Invariants
//! - `editing == None` is Create mode; `Some(user)` is Edit mode.
//! - Right after `begin_edit(user)` the three fields equal `user`'s fields.
//! - `ViewState` values are immutable once published; every change produces
//!   a new value with a higher `revision`.

use crate::model::user::{
    is_blank, User, UserField, UserId, UserValidationError, UNASSIGNED_USER_ID,
};

/// Editing mode derived from `FormState::editing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(UserId),
}

/// Text input mirrored against the user being created or edited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Snapshot of the user taken when editing began.
    pub editing: Option<User>,
}

impl FormState {
    pub fn mode(&self) -> FormMode {
        match &self.editing {
            Some(user) => FormMode::Edit(user.id),
            None => FormMode::Create,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn field(&self, field: UserField) -> &str {
        match field {
            UserField::FirstName => &self.first_name,
            UserField::LastName => &self.last_name,
            UserField::Email => &self.email,
        }
    }

    pub fn set_field(&mut self, field: UserField, value: String) {
        match field {
            UserField::FirstName => self.first_name = value,
            UserField::LastName => self.last_name = value,
            UserField::Email => self.email = value,
        }
    }

    /// Enters Edit mode for `user`, copying its current values.
    pub fn begin_edit(&mut self, user: &User) {
        self.first_name.clone_from(&user.first_name);
        self.last_name.clone_from(&user.last_name);
        self.email.clone_from(&user.email);
        self.editing = Some(user.clone());
    }

    /// Back to Create mode with empty fields.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Save precondition: every field is non-blank after trimming.
    pub fn validate(&self) -> Result<(), UserValidationError> {
        for field in UserField::ALL {
            if is_blank(self.field(field)) {
                return Err(UserValidationError::BlankField(field));
            }
        }
        Ok(())
    }

    /// Builds the record to persist: same id as the edited user in Edit
    /// mode, unassigned in Create mode. Values are kept as typed.
    pub fn to_user(&self) -> User {
        let id = self
            .editing
            .as_ref()
            .map_or(UNASSIGNED_USER_ID, |user| user.id);
        User::with_id(
            id,
            self.first_name.as_str(),
            self.last_name.as_str(),
            self.email.as_str(),
        )
    }
}

/// Everything the presentation layer renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    /// Monotonic per controller; lets observers drop out-of-order deliveries.
    pub revision: u64,
    /// All stored users, ascending by id.
    pub users: Vec<User>,
    pub form: FormState,
    /// Last user-visible notice (validation failure, failed store call).
    pub message: Option<String>,
}

impl ViewState {
    pub fn is_editing(&self) -> bool {
        self.form.is_editing()
    }
}
