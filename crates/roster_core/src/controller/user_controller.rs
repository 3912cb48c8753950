//! View-state controller for the user list and form.
//!
//! # Responsibility
//! - Keep the list snapshot in sync with the store's live listing.
//! - Turn presentation intents into repository calls on a background worker.
//! - Own the Create/Edit form state machine.
//!
//! # Invariants
//! - Readers only ever see whole `ViewState` values (replace-on-write).
//! - The live-listing subscription lives exactly as long as the controller.
//! - Deleting the user being edited, by any path, cancels editing.

use super::form::ViewState;
use super::worker::BackgroundWorker;
use super::ControllerError;
use crate::model::user::{User, UserField, UserId, UserValidationError};
use crate::observe::{Observers, Subscription};
use crate::repo::user_repo::UserRepository;
use crate::store::StoreResult;
use log::{debug, error, info, warn};
use parking_lot::RwLock;
use std::sync::Arc;

const WORKER_THREAD_NAME: &str = "roster-store-writer";

struct Shared {
    state: RwLock<Arc<ViewState>>,
    observers: Observers<ViewState>,
}

impl Shared {
    fn snapshot(&self) -> Arc<ViewState> {
        Arc::clone(&self.state.read())
    }

    /// Applies `change` to a copy of the current state, swaps the copy in and
    /// publishes it. Observers run after the write lock is released.
    fn update<T>(&self, change: impl FnOnce(&mut ViewState) -> T) -> T {
        let (output, next) = {
            let mut current = self.state.write();
            let mut next = ViewState::clone(&current);
            let output = change(&mut next);
            next.revision = current.revision + 1;
            let next = Arc::new(next);
            *current = Arc::clone(&next);
            (output, next)
        };
        self.observers.notify(&next);
        output
    }

    fn apply_listing(&self, users: &[User]) {
        self.update(|state| {
            state.users = users.to_vec();
            let vanished = state
                .form
                .editing
                .as_ref()
                .map(|editing| editing.id)
                .filter(|id| !users.iter().any(|user| user.id == *id));
            if let Some(id) = vanished {
                state.form.reset();
                state.message = Some(format!("User {id} was deleted; editing cancelled."));
                info!("event=edit_cancel module=controller status=ok user_id={id} reason=deleted");
            }
        });
        debug!(
            "event=listing_refresh module=controller status=ok rows={}",
            users.len()
        );
    }

    fn report(&self, message: String) {
        self.update(|state| state.message = Some(message));
    }
}

/// Mediates between presentation intents and the user repository.
pub struct UserController<R: UserRepository> {
    repo: Arc<R>,
    shared: Arc<Shared>,
    worker: BackgroundWorker,
    listing: Subscription,
}

impl<R: UserRepository> UserController<R> {
    /// Creates the controller and starts following the live listing.
    ///
    /// The initial listing is in `state()` by the time this returns.
    pub fn new(repo: R) -> Result<Self, ControllerError> {
        let repo = Arc::new(repo);
        let shared = Arc::new(Shared {
            state: RwLock::new(Arc::new(ViewState::default())),
            observers: Observers::new(),
        });
        let worker = BackgroundWorker::spawn(WORKER_THREAD_NAME)?;

        let listener = Arc::clone(&shared);
        let listing = repo.get_all_users(Box::new(move |users: &[User]| {
            listener.apply_listing(users);
        }))?;

        info!("event=controller_start module=controller status=ok");
        Ok(Self {
            repo,
            shared,
            worker,
            listing,
        })
    }

    /// Current view state.
    pub fn state(&self) -> Arc<ViewState> {
        self.shared.snapshot()
    }

    /// Subscribes to view-state changes; the current state is delivered
    /// immediately. Callbacks may run on the worker thread.
    pub fn subscribe(
        &self,
        callback: impl Fn(&ViewState) + Send + Sync + 'static,
    ) -> Subscription {
        self.shared
            .observers
            .subscribe_with_latest(|| self.shared.snapshot(), callback)
    }

    /// Updates one form field; the mode is unchanged.
    pub fn on_field_change(&self, field: UserField, value: impl Into<String>) {
        let value = value.into();
        self.shared.update(|state| state.form.set_field(field, value));
    }

    /// Enters Edit mode for `user`, loading its values into the form.
    pub fn start_editing_user(&self, user: &User) {
        self.shared.update(|state| {
            state.form.begin_edit(user);
            state.message = None;
        });
        debug!(
            "event=edit_start module=controller status=ok user_id={}",
            user.id
        );
    }

    /// Looks `id` up through the repository and starts editing it.
    ///
    /// Returns `Ok(false)` when no such user exists.
    pub fn start_editing_by_id(&self, id: UserId) -> StoreResult<bool> {
        match self.repo.get_user_by_id(id)? {
            Some(user) => {
                self.start_editing_user(&user);
                Ok(true)
            }
            None => {
                debug!("event=edit_start module=controller status=noop user_id={id} reason=not_found");
                Ok(false)
            }
        }
    }

    /// Leaves Edit mode and clears the form without persisting anything.
    pub fn cancel_editing(&self) {
        self.shared.update(|state| {
            state.form.reset();
            state.message = None;
        });
    }

    /// Persists the form.
    ///
    /// With a blank field nothing is persisted, the form is left as is and
    /// the failure is returned and shown through `message`. Otherwise the
    /// form is cleared, Edit mode ends, and the insert or update is queued on
    /// the worker; a store failure later shows up in `message`.
    pub fn save_user(&self) -> Result<(), UserValidationError> {
        let validated = self.shared.update(|state| {
            if let Err(err) = state.form.validate() {
                state.message = Some(format!("All fields are required: {err}."));
                return Err(err);
            }
            let user = state.form.to_user();
            let editing = state.form.is_editing();
            state.form.reset();
            state.message = None;
            Ok((user, editing))
        });
        let (user, editing) = match validated {
            Ok(validated) => validated,
            Err(err) => {
                info!("event=user_save module=controller status=rejected reason=validation error={err}");
                return Err(err);
            }
        };

        let repo = Arc::clone(&self.repo);
        let shared = Arc::clone(&self.shared);
        if editing {
            info!(
                "event=user_save module=controller status=queued mode=edit user_id={}",
                user.id
            );
            self.dispatch("user_save", move || match repo.update_user(&user) {
                Ok(true) => {}
                Ok(false) => {
                    shared.report(format!(
                        "User {} no longer exists; changes were not saved.",
                        user.id
                    ));
                }
                Err(err) => {
                    warn!(
                        "event=user_save module=controller status=error mode=edit user_id={} error={err}",
                        user.id
                    );
                    shared.report(format!("Could not save user {}: {err}", user.id));
                }
            });
        } else {
            info!("event=user_save module=controller status=queued mode=create");
            self.dispatch("user_save", move || {
                if let Err(err) = repo.insert_user(&user) {
                    warn!("event=user_save module=controller status=error mode=create error={err}");
                    shared.report(format!("Could not add user: {err}"));
                }
            });
        }
        Ok(())
    }

    /// Queues deletion of `user` (matched by id). Editing of the same user
    /// is cancelled right away.
    pub fn delete_user(&self, user: &User) {
        let id = user.id;
        self.shared.update(|state| {
            if state.form.editing.as_ref().is_some_and(|editing| editing.id == id) {
                state.form.reset();
            }
        });

        let repo = Arc::clone(&self.repo);
        let shared = Arc::clone(&self.shared);
        let user = user.clone();
        info!("event=user_delete module=controller status=queued user_id={id}");
        self.dispatch("user_delete", move || {
            if let Err(err) = repo.delete_user(&user) {
                warn!("event=user_delete module=controller status=error user_id={id} error={err}");
                shared.report(format!("Could not delete user {id}: {err}"));
            }
        });
    }

    /// Blocks until every queued store call has completed and its listing
    /// has been applied.
    pub fn wait_idle(&self) {
        self.worker.drain();
    }

    /// Finishes queued work, then stops following the listing.
    ///
    /// Same as dropping the controller.
    pub fn close(self) {
        drop(self);
    }

    fn dispatch(&self, event: &'static str, job: impl FnOnce() + Send + 'static) {
        if let Err(err) = self.worker.submit(job) {
            error!("event={event} module=controller status=error error_code=worker_closed error={err}");
            self.shared.report(format!("{event} could not be scheduled: {err}"));
        }
    }
}

impl<R: UserRepository> Drop for UserController<R> {
    fn drop(&mut self) {
        self.worker.shutdown();
        self.listing.cancel();
        info!("event=controller_stop module=controller status=ok");
    }
}
