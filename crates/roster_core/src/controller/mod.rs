//! Presentation-facing state and intents.
//!
//! # Responsibility
//! - Hold the list snapshot and form state the UI renders.
//! - Turn UI intents into repository calls without blocking the caller.

use crate::store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod form;
mod user_controller;
pub mod worker;

pub use user_controller::UserController;

/// Failure to construct a controller.
#[derive(Debug)]
pub enum ControllerError {
    /// The initial live-listing subscription failed.
    Store(StoreError),
    /// The background worker thread could not be spawned.
    Spawn(std::io::Error),
}

impl Display for ControllerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Spawn(err) => write!(f, "failed to start background worker: {err}"),
        }
    }
}

impl Error for ControllerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Spawn(err) => Some(err),
        }
    }
}

impl From<StoreError> for ControllerError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<std::io::Error> for ControllerError {
    fn from(value: std::io::Error) -> Self {
        Self::Spawn(value)
    }
}
