use parking_lot::Mutex;
use roster_core::{
    FormMode, StoreResult, StoreUserRepository, Subscription, User, UserController, UserField,
    UserId, UserRepository, UserStore, UserValidationError, ViewState,
};
use std::sync::Arc;

fn controller() -> (UserStore, UserController<StoreUserRepository>) {
    let store = UserStore::open_in_memory().unwrap();
    let controller = UserController::new(StoreUserRepository::new(store.clone())).unwrap();
    (store, controller)
}

fn fill_form(
    controller: &UserController<StoreUserRepository>,
    first: &str,
    last: &str,
    email: &str,
) {
    controller.on_field_change(UserField::FirstName, first);
    controller.on_field_change(UserField::LastName, last);
    controller.on_field_change(UserField::Email, email);
}

fn add_user(
    controller: &UserController<StoreUserRepository>,
    first: &str,
    last: &str,
    email: &str,
) {
    fill_form(controller, first, last, email);
    controller.save_user().unwrap();
    controller.wait_idle();
}

#[test]
fn initial_state_reflects_existing_rows() {
    let store = UserStore::open_in_memory().unwrap();
    store.insert(&User::new("Ana", "Gomez", "ana@x.com")).unwrap();

    let controller = UserController::new(StoreUserRepository::new(store)).unwrap();
    let state = controller.state();

    assert_eq!(state.users.len(), 1);
    assert_eq!(state.form.mode(), FormMode::Create);
    assert!(state.form.first_name.is_empty());
}

#[test]
fn juan_perez_walkthrough() {
    let (_store, controller) = controller();

    add_user(&controller, "Juan", "Perez", "juan@x.com");
    assert_eq!(
        controller.state().users,
        vec![User::with_id(1, "Juan", "Perez", "juan@x.com")]
    );

    let juan = controller.state().users[0].clone();
    controller.start_editing_user(&juan);
    controller.on_field_change(UserField::LastName, "Gomez");
    controller.save_user().unwrap();
    controller.wait_idle();
    assert_eq!(
        controller.state().users,
        vec![User::with_id(1, "Juan", "Gomez", "juan@x.com")]
    );

    let juan = controller.state().users[0].clone();
    controller.delete_user(&juan);
    controller.wait_idle();
    assert!(controller.state().users.is_empty());
}

#[test]
fn save_in_create_mode_inserts_and_clears_form() {
    let (store, controller) = controller();

    add_user(&controller, "Ana", "Gomez", "ana@x.com");

    let state = controller.state();
    assert_eq!(state.form.mode(), FormMode::Create);
    assert_eq!(
        (state.form.first_name.as_str(), state.form.last_name.as_str(), state.form.email.as_str()),
        ("", "", "")
    );
    assert_eq!(state.message, None);
    assert_eq!(store.list().unwrap().len(), 1);
    assert!(state.users[0].id > 0);
}

#[test]
fn save_with_blank_field_is_refused_and_changes_nothing() {
    let (store, controller) = controller();
    fill_form(&controller, "Ana", "   ", "ana@x.com");
    let before = controller.state();

    let err = controller.save_user().unwrap_err();
    controller.wait_idle();

    assert_eq!(err, UserValidationError::BlankField(UserField::LastName));
    let after = controller.state();
    assert_eq!(after.form, before.form);
    assert!(after.message.as_deref().unwrap().contains("lastName"));
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn save_with_blank_field_in_edit_mode_keeps_editing() {
    let (store, controller) = controller();
    add_user(&controller, "Ana", "Gomez", "ana@x.com");
    let ana = controller.state().users[0].clone();

    controller.start_editing_user(&ana);
    controller.on_field_change(UserField::Email, "");
    assert!(controller.save_user().is_err());
    controller.wait_idle();

    let state = controller.state();
    assert_eq!(state.form.mode(), FormMode::Edit(ana.id));
    assert_eq!(store.get_by_id(ana.id).unwrap().unwrap(), ana);
}

#[test]
fn start_editing_loads_user_values() {
    let (_store, controller) = controller();
    add_user(&controller, "Ana", "Gomez", "ana@x.com");
    let ana = controller.state().users[0].clone();

    controller.start_editing_user(&ana);

    let form = controller.state().form.clone();
    assert_eq!(form.mode(), FormMode::Edit(ana.id));
    assert_eq!(form.first_name, "Ana");
    assert_eq!(form.last_name, "Gomez");
    assert_eq!(form.email, "ana@x.com");
    assert_eq!(form.editing, Some(ana));
}

#[test]
fn start_editing_by_id_uses_repository_lookup() {
    let (_store, controller) = controller();
    add_user(&controller, "Ana", "Gomez", "ana@x.com");
    let id = controller.state().users[0].id;

    assert!(controller.start_editing_by_id(id).unwrap());
    assert_eq!(controller.state().form.first_name, "Ana");

    assert!(!controller.start_editing_by_id(id + 100).unwrap());
    assert_eq!(controller.state().form.mode(), FormMode::Edit(id));
}

#[test]
fn start_then_cancel_leaves_store_untouched() {
    let (store, controller) = controller();
    add_user(&controller, "Ana", "Gomez", "ana@x.com");
    let ana = controller.state().users[0].clone();

    controller.start_editing_user(&ana);
    controller.on_field_change(UserField::FirstName, "Anita");
    controller.cancel_editing();
    controller.wait_idle();

    let state = controller.state();
    assert_eq!(state.form.mode(), FormMode::Create);
    assert!(state.form.first_name.is_empty());
    assert!(state.form.last_name.is_empty());
    assert!(state.form.email.is_empty());
    assert_eq!(store.list().unwrap(), vec![ana]);
}

#[test]
fn edit_and_save_updates_in_place() {
    let (store, controller) = controller();
    add_user(&controller, "Ana", "Gomez", "ana@x.com");
    add_user(&controller, "Pedro", "Garcia", "pedro@x.com");
    let pedro = controller.state().users[1].clone();

    controller.start_editing_user(&pedro);
    controller.on_field_change(UserField::Email, "pedro@garcia.com");
    controller.save_user().unwrap();
    assert_eq!(controller.state().form.mode(), FormMode::Create);
    controller.wait_idle();

    let users = controller.state().users.clone();
    assert_eq!(users.len(), 2);
    assert_eq!(users[1].id, pedro.id);
    assert_eq!(users[1].email, "pedro@garcia.com");
    assert_eq!(users, store.list().unwrap());
}

#[test]
fn delete_removes_exactly_one_user_and_missing_id_is_noop() {
    let (_store, controller) = controller();
    add_user(&controller, "Ana", "Gomez", "ana@x.com");
    add_user(&controller, "Pedro", "Garcia", "pedro@x.com");
    let ana = controller.state().users[0].clone();

    controller.delete_user(&ana);
    controller.wait_idle();
    let remaining: Vec<UserId> = controller.state().users.iter().map(|u| u.id).collect();
    assert_eq!(remaining.len(), 1);
    assert!(!remaining.contains(&ana.id));

    controller.delete_user(&ana);
    controller.wait_idle();
    assert_eq!(controller.state().users.len(), 1);
    assert_eq!(controller.state().message, None);
}

#[test]
fn deleting_the_edited_user_cancels_editing() {
    let (_store, controller) = controller();
    add_user(&controller, "Ana", "Gomez", "ana@x.com");
    let ana = controller.state().users[0].clone();

    controller.start_editing_user(&ana);
    controller.delete_user(&ana);

    let state = controller.state();
    assert_eq!(state.form.mode(), FormMode::Create);
    assert!(state.form.first_name.is_empty());
    controller.wait_idle();
    assert!(controller.state().users.is_empty());
}

#[test]
fn external_delete_of_edited_user_cancels_editing_with_notice() {
    let (store, controller) = controller();
    add_user(&controller, "Ana", "Gomez", "ana@x.com");
    let ana = controller.state().users[0].clone();
    controller.start_editing_user(&ana);

    store.delete(&ana).unwrap();

    let state = controller.state();
    assert_eq!(state.form.mode(), FormMode::Create);
    assert!(state.message.as_deref().unwrap().contains("deleted"));
}

#[test]
fn store_failure_is_reported_through_message() {
    let store = UserStore::open_in_memory().unwrap();
    let controller = UserController::new(FailingInsertRepository {
        inner: StoreUserRepository::new(store.clone()),
    })
    .unwrap();

    controller.on_field_change(UserField::FirstName, "Ana");
    controller.on_field_change(UserField::LastName, "Gomez");
    controller.on_field_change(UserField::Email, "ana@x.com");
    controller.save_user().unwrap();
    controller.wait_idle();

    let state = controller.state();
    assert!(state.message.as_deref().unwrap().starts_with("Could not add user"));
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn observers_see_increasing_revisions() {
    let (_store, controller) = controller();
    let revisions: Arc<Mutex<Vec<u64>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&revisions);
    let _subscription = controller.subscribe(move |state: &ViewState| {
        sink.lock().push(state.revision);
    });

    add_user(&controller, "Ana", "Gomez", "ana@x.com");

    let revisions = revisions.lock();
    assert!(revisions.len() >= 5);
    assert!(revisions.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn subscribing_during_concurrent_updates_never_misses_the_latest_state() {
    let (_store, controller) = controller();
    let latest_seen: Vec<Arc<Mutex<u64>>> = (0..50).map(|_| Arc::new(Mutex::new(0))).collect();

    let subscriptions: Vec<Subscription> = std::thread::scope(|scope| {
        scope.spawn(|| {
            for i in 0..500 {
                controller.on_field_change(UserField::FirstName, format!("Ana {i}"));
            }
        });
        latest_seen
            .iter()
            .map(|slot| {
                let slot = Arc::clone(slot);
                controller.subscribe(move |state: &ViewState| {
                    let mut seen = slot.lock();
                    *seen = (*seen).max(state.revision);
                })
            })
            .collect()
    });

    let final_revision = controller.state().revision;
    for slot in &latest_seen {
        assert_eq!(*slot.lock(), final_revision);
    }
    drop(subscriptions);
}

#[test]
fn dropping_controller_cancels_listing_subscription() {
    let (store, controller) = controller();
    assert_eq!(store.subscriber_count(), 1);

    fill_form(&controller, "Ana", "Gomez", "ana@x.com");
    controller.save_user().unwrap();
    controller.close();

    assert_eq!(store.subscriber_count(), 0);
    assert_eq!(store.list().unwrap().len(), 1, "queued work finishes before close");
}

/// Repository whose inserts always fail with a constraint violation.
struct FailingInsertRepository {
    inner: StoreUserRepository,
}

impl UserRepository for FailingInsertRepository {
    fn insert_user(&self, user: &User) -> StoreResult<UserId> {
        Err(roster_core::StoreError::ConstraintViolation(user.id))
    }

    fn update_user(&self, user: &User) -> StoreResult<bool> {
        self.inner.update_user(user)
    }

    fn delete_user(&self, user: &User) -> StoreResult<bool> {
        self.inner.delete_user(user)
    }

    fn get_user_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        self.inner.get_user_by_id(id)
    }

    fn get_all_users(
        &self,
        callback: Box<dyn Fn(&[User]) + Send + Sync>,
    ) -> StoreResult<Subscription> {
        self.inner.get_all_users(callback)
    }
}
