//! User repository contract and store-backed implementation.

use crate::model::user::{User, UserId};
use crate::observe::Subscription;
use crate::store::{StoreResult, UserStore};

/// Data access contract used by `UserController`.
///
/// Implementations must be shareable across threads: the controller calls
/// mutations from its background worker.
pub trait UserRepository: Send + Sync + 'static {
    fn insert_user(&self, user: &User) -> StoreResult<UserId>;
    fn update_user(&self, user: &User) -> StoreResult<bool>;
    fn delete_user(&self, user: &User) -> StoreResult<bool>;
    fn get_user_by_id(&self, id: UserId) -> StoreResult<Option<User>>;
    /// Live listing; see `UserStore::subscribe_all`.
    fn get_all_users(
        &self,
        callback: Box<dyn Fn(&[User]) + Send + Sync>,
    ) -> StoreResult<Subscription>;
}

/// Pass-through repository over a `UserStore`.
#[derive(Clone)]
pub struct StoreUserRepository {
    store: UserStore,
}

impl StoreUserRepository {
    pub fn new(store: UserStore) -> Self {
        Self { store }
    }
}

impl UserRepository for StoreUserRepository {
    fn insert_user(&self, user: &User) -> StoreResult<UserId> {
        self.store.insert(user)
    }

    fn update_user(&self, user: &User) -> StoreResult<bool> {
        self.store.update(user)
    }

    fn delete_user(&self, user: &User) -> StoreResult<bool> {
        self.store.delete(user)
    }

    fn get_user_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        self.store.get_by_id(id)
    }

    fn get_all_users(
        &self,
        callback: Box<dyn Fn(&[User]) + Send + Sync>,
    ) -> StoreResult<Subscription> {
        self.store.subscribe_all(callback)
    }
}
