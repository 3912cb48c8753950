//! Domain model for the roster.
//!
//! # Invariants
//! - Every stored user is identified by a positive, store-assigned `UserId`.
//! - Deletion is permanent; there are no tombstones.

pub mod user;
