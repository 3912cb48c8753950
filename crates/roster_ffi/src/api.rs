//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the user list state and its five intents to Dart via FRB.
//! - Own the process-wide controller behind those calls.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Intents return immediately; store writes finish on the core's worker.
//! - Return values carry human-readable messages, never raw error types.

use log::{error, info};
use once_cell::sync::OnceCell;
use roster_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    StoreUserRepository, User, UserController, UserField, UserId, UserStore, ViewState,
};
use std::path::PathBuf;

const DB_FILE_NAME: &str = "roster.sqlite3";
const DB_PATH_ENV: &str = "ROSTER_DB_PATH";

static CONTROLLER: OnceCell<UserController<StoreUserRepository>> = OnceCell::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and an error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// One row of the user list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserItem {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Everything the user screen renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsersStateResponse {
    /// Whether the controller is available.
    pub ok: bool,
    /// Increases with every state change; lets the UI skip stale frames.
    pub revision: u64,
    /// All users, ascending by id.
    pub users: Vec<UserItem>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// `true` in Edit mode; drives the save label and the cancel button.
    pub is_editing: bool,
    pub editing_user_id: Option<i64>,
    /// Notice to show (validation failure, failed store call), if any.
    pub message: Option<String>,
}

impl UsersStateResponse {
    fn unavailable(message: String) -> Self {
        Self {
            ok: false,
            revision: 0,
            users: Vec::new(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            is_editing: false,
            editing_user_id: None,
            message: Some(message),
        }
    }
}

/// Generic envelope returned by intents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserActionResponse {
    /// Whether the intent was accepted.
    pub ok: bool,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl UserActionResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Returns the current list and form state.
///
/// # FFI contract
/// - Sync call; opens the store on first use.
/// - Never panics; `ok = false` with a message when the store is unusable.
#[flutter_rust_bridge::frb(sync)]
pub fn users_state() -> UsersStateResponse {
    match controller() {
        Ok(controller) => to_state_response(&controller.state()),
        Err(message) => UsersStateResponse::unavailable(message),
    }
}

/// Updates one form field. `field` is `firstName|lastName|email`
/// (snake_case accepted).
#[flutter_rust_bridge::frb(sync)]
pub fn users_change_field(field: String, value: String) -> UserActionResponse {
    let Some(field) = UserField::parse(&field) else {
        return UserActionResponse::failure(format!("unknown field `{field}`"));
    };
    with_controller(|controller| {
        controller.on_field_change(field, value);
        UserActionResponse::success("Field updated.")
    })
}

/// Saves the form: inserts in Create mode, updates in Edit mode.
///
/// # FFI contract
/// - Returns `ok = false` without touching the store when a field is blank.
/// - Store failures after acceptance show up in `users_state().message`.
#[flutter_rust_bridge::frb(sync)]
pub fn users_save() -> UserActionResponse {
    with_controller(|controller| match controller.save_user() {
        Ok(()) => UserActionResponse::success("User saved."),
        Err(err) => UserActionResponse::failure(format!("All fields are required: {err}.")),
    })
}

/// Loads the user with `id` into the form for editing.
#[flutter_rust_bridge::frb(sync)]
pub fn users_start_edit(id: i64) -> UserActionResponse {
    with_controller(|controller| match controller.start_editing_by_id(id) {
        Ok(true) => UserActionResponse::success("Editing user."),
        Ok(false) => UserActionResponse::failure(format!("user {id} not found")),
        Err(err) => UserActionResponse::failure(format!("users_start_edit failed: {err}")),
    })
}

/// Leaves Edit mode without saving.
#[flutter_rust_bridge::frb(sync)]
pub fn users_cancel_edit() -> UserActionResponse {
    with_controller(|controller| {
        controller.cancel_editing();
        UserActionResponse::success("Editing cancelled.")
    })
}

/// Deletes the user with `id`. Unknown ids are accepted as a no-op.
#[flutter_rust_bridge::frb(sync)]
pub fn users_delete(id: i64) -> UserActionResponse {
    with_controller(|controller| {
        let state = controller.state();
        match find_user(&state, id) {
            Some(user) => {
                controller.delete_user(user);
                UserActionResponse::success("User deleted.")
            }
            None => UserActionResponse::success("Nothing to delete."),
        }
    })
}

fn find_user(state: &ViewState, id: UserId) -> Option<&User> {
    state.users.iter().find(|user| user.id == id)
}

fn with_controller(
    f: impl FnOnce(&UserController<StoreUserRepository>) -> UserActionResponse,
) -> UserActionResponse {
    match controller() {
        Ok(controller) => f(controller),
        Err(message) => UserActionResponse::failure(message),
    }
}

fn controller() -> Result<&'static UserController<StoreUserRepository>, String> {
    CONTROLLER.get_or_try_init(|| {
        let db_path = resolve_db_path();
        let store = UserStore::open(&db_path).map_err(|err| {
            error!("event=ffi_init module=ffi status=error error_code=db_open_failed error={err}");
            format!("user DB open failed: {err}")
        })?;
        let controller = UserController::new(StoreUserRepository::new(store))
            .map_err(|err| format!("user controller init failed: {err}"))?;
        info!("event=ffi_init module=ffi status=ok");
        Ok(controller)
    })
}

fn resolve_db_path() -> PathBuf {
    db_path_from(std::env::var(DB_PATH_ENV).ok())
}

fn db_path_from(raw: Option<String>) -> PathBuf {
    match raw.as_deref().map(str::trim) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => std::env::temp_dir().join(DB_FILE_NAME),
    }
}

fn to_state_response(state: &ViewState) -> UsersStateResponse {
    UsersStateResponse {
        ok: true,
        revision: state.revision,
        users: state.users.iter().map(to_user_item).collect(),
        first_name: state.form.first_name.clone(),
        last_name: state.form.last_name.clone(),
        email: state.form.email.clone(),
        is_editing: state.is_editing(),
        editing_user_id: state.form.editing.as_ref().map(|user| user.id),
        message: state.message.clone(),
    }
}

fn to_user_item(user: &User) -> UserItem {
    UserItem {
        id: user.id,
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        email: user.email.clone(),
    }
}
