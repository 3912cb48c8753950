//! Repository seam between the controller and the record store.
//!
//! # Responsibility
//! - Define the data access contract the controller depends on.
//! - Forward to `UserStore` without transformation, batching or caching.

pub mod user_repo;
