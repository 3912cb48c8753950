//! Core domain logic for Roster.
//! This crate owns the user store, its live listing and the view state the
//! UI renders.

pub mod controller;
pub mod db;
pub mod logging;
pub mod model;
pub mod observe;
pub mod repo;
pub mod store;

pub use controller::form::{FormMode, FormState, ViewState};
pub use controller::{ControllerError, UserController};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::user::{User, UserField, UserId, UserValidationError, UNASSIGNED_USER_ID};
pub use observe::Subscription;
pub use repo::user_repo::{StoreUserRepository, UserRepository};
pub use store::{StoreError, StoreResult, UserStore};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
