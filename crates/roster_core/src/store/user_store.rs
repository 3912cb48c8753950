//! SQLite-backed user store with a live listing.
//!
//! # Invariants
//! - Every mutation runs in its own transaction.
//! - The listing produced by a mutation is read inside that transaction and
//!   queued before the connection lock is released, so the queue holds
//!   snapshots in commit order.
//! - Only the holder of the publish lock delivers queued snapshots; each
//!   snapshot reaches every subscriber exactly once, in order.
//! - Subscribers may read from the store inside a callback but must not
//!   mutate it synchronously from that callback.

use super::user_table;
use super::StoreResult;
use crate::db::{open_db, open_db_in_memory, prepare_connection};
use crate::model::user::{User, UserId};
use crate::observe::{Observers, Subscription};
use log::{debug, info, warn};
use parking_lot::Mutex;
use rusqlite::Connection;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

struct StoreInner {
    conn: Mutex<Connection>,
    pending: Mutex<VecDeque<Vec<User>>>,
    publish: Mutex<()>,
    listing: Observers<[User]>,
}

/// Shared handle to the persistent `users` table.
///
/// Cloning is cheap; all clones address the same connection and the same
/// set of live-listing subscribers.
#[derive(Clone)]
pub struct UserStore {
    inner: Arc<StoreInner>,
}

impl UserStore {
    /// Opens (or creates) the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self::wrap(open_db(path)?))
    }

    /// Opens a private in-memory store.
    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::wrap(open_db_in_memory()?))
    }

    /// Takes ownership of an existing connection and prepares its schema.
    pub fn from_connection(mut conn: Connection) -> StoreResult<Self> {
        prepare_connection(&mut conn)?;
        Ok(Self::wrap(conn))
    }

    fn wrap(conn: Connection) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                conn: Mutex::new(conn),
                pending: Mutex::new(VecDeque::new()),
                publish: Mutex::new(()),
                listing: Observers::new(),
            }),
        }
    }

    /// Inserts `user` and returns its id.
    ///
    /// An unassigned id is replaced by a fresh one; an explicit id that is
    /// already taken fails with `StoreError::ConstraintViolation` and leaves
    /// the table untouched.
    pub fn insert(&self, user: &User) -> StoreResult<UserId> {
        let started_at = Instant::now();
        match self.mutate(|conn| user_table::insert_user(conn, user).map(|id| (id, true))) {
            Ok(id) => {
                info!(
                    "event=user_insert module=store status=ok user_id={id} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(id)
            }
            Err(err) => {
                warn!(
                    "event=user_insert module=store status=error duration_ms={} error={err}",
                    started_at.elapsed().as_millis()
                );
                Err(err)
            }
        }
    }

    /// Overwrites the fields of the row matching `user.id`.
    ///
    /// Returns `false`, and publishes nothing, when no such row exists.
    pub fn update(&self, user: &User) -> StoreResult<bool> {
        let changed = self.mutate(|conn| {
            user_table::update_user(conn, user).map(|changed| (changed, changed))
        })?;
        log_change("user_update", user.id, changed);
        Ok(changed)
    }

    /// Removes the row matching `user.id`. Absent rows are a no-op.
    pub fn delete(&self, user: &User) -> StoreResult<bool> {
        let changed = self.mutate(|conn| {
            user_table::delete_user(conn, user.id).map(|changed| (changed, changed))
        })?;
        log_change("user_delete", user.id, changed);
        Ok(changed)
    }

    /// Point lookup by id.
    pub fn get_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        let conn = self.inner.conn.lock();
        user_table::get_user(&conn, id)
    }

    /// One-shot listing ordered by ascending id.
    pub fn list(&self) -> StoreResult<Vec<User>> {
        let conn = self.inner.conn.lock();
        user_table::list_users(&conn)
    }

    /// Subscribes to the live listing.
    ///
    /// `callback` receives the current listing before this returns, then the
    /// full listing after every insert, effective update and effective
    /// delete, until the returned `Subscription` is cancelled or dropped.
    pub fn subscribe_all(
        &self,
        callback: impl Fn(&[User]) + Send + Sync + 'static,
    ) -> StoreResult<Subscription> {
        let _publish = self.inner.publish.lock();
        let (users, backlog) = {
            let conn = self.inner.conn.lock();
            let users = user_table::list_users(&conn)?;
            let backlog = std::mem::take(&mut *self.inner.pending.lock());
            (users, backlog)
        };

        // Snapshots committed before our read belong to the existing
        // subscribers only.
        for snapshot in backlog {
            self.inner.listing.notify(snapshot.as_slice());
        }

        let subscription = self.inner.listing.subscribe_with(users.as_slice(), callback);
        debug!(
            "event=listing_subscribe module=store status=ok subscribers={} rows={}",
            self.inner.listing.len(),
            users.len()
        );
        Ok(subscription)
    }

    /// Number of live-listing subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.listing.len()
    }

    /// Runs `op` in a transaction; when it reports a change, queues the new
    /// listing and publishes it after commit.
    fn mutate<T>(&self, op: impl FnOnce(&Connection) -> StoreResult<(T, bool)>) -> StoreResult<T> {
        let value = {
            let mut conn = self.inner.conn.lock();
            let tx = conn.transaction()?;
            let (value, changed) = op(&tx)?;
            if !changed {
                return Ok(value);
            }
            let users = user_table::list_users(&tx)?;
            tx.commit()?;
            self.inner.pending.lock().push_back(users);
            value
        };

        self.flush_pending();
        Ok(value)
    }

    fn flush_pending(&self) {
        let _publish = self.inner.publish.lock();
        loop {
            let next = self.inner.pending.lock().pop_front();
            match next {
                Some(users) => self.inner.listing.notify(users.as_slice()),
                None => break,
            }
        }
    }
}

fn log_change(event: &str, id: UserId, changed: bool) {
    if changed {
        info!("event={event} module=store status=ok user_id={id}");
    } else {
        debug!("event={event} module=store status=noop user_id={id} reason=not_found");
    }
}
