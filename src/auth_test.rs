use super::*;
use crate::storage::MemoryStorage;

fn user() -> User {
    User { id: "u1".into(), name: "Ada".into(), email: "ada@example.com".into(), is_verified: true }
}

fn tokens(access: &str, refresh: Option<&str>) -> Tokens {
    Tokens { access_token: access.into(), refresh_token: refresh.map(str::to_owned) }
}

fn store() -> (Arc<MemoryStorage>, AuthStore) {
    let storage = Arc::new(MemoryStorage::new());
    let store = AuthStore::new(storage.clone());
    (storage, store)
}

#[test]
fn login_persists_tokens_and_publishes_user() {
    let (storage, store) = store();
    let mut rx = store.subscribe();

    store.login(&tokens("a1", Some("r1")), user()).unwrap();

    assert_eq!(storage.get(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some("a1"));
    assert_eq!(storage.get(REFRESH_TOKEN_KEY).unwrap().as_deref(), Some("r1"));
    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().user, Some(user()));
    assert!(store.has_session());
}

#[test]
fn logout_clears_tokens_and_notifies() {
    let (storage, store) = store();
    store.login(&tokens("a1", Some("r1")), user()).unwrap();
    let mut rx = store.subscribe();

    store.logout().unwrap();

    assert_eq!(storage.get(ACCESS_TOKEN_KEY).unwrap(), None);
    assert_eq!(storage.get(REFRESH_TOKEN_KEY).unwrap(), None);
    assert!(rx.has_changed().unwrap());
    assert_eq!(*rx.borrow_and_update(), AuthState::default());
    assert!(!store.has_session());
}

#[test]
fn refresh_without_new_refresh_token_keeps_old_one() {
    let (_, store) = store();
    store.store_tokens(&tokens("a1", Some("r1"))).unwrap();
    store.store_tokens(&tokens("a2", None)).unwrap();
    assert_eq!(store.access_token().unwrap().as_deref(), Some("a2"));
    assert_eq!(store.refresh_token().unwrap().as_deref(), Some("r1"));
}

#[test]
fn tokens_survive_a_new_store_on_same_storage() {
    let (storage, store) = store();
    store.login(&tokens("a1", None), user()).unwrap();
    let reopened = AuthStore::new(storage);
    assert!(reopened.has_session());
    // The user is not persisted; it is refetched from the profile endpoint.
    assert_eq!(reopened.user(), None);
}

#[test]
fn set_loading_only_notifies_on_change() {
    let (_, store) = store();
    let mut rx = store.subscribe();
    store.set_loading(false);
    assert!(!rx.has_changed().unwrap());
    store.set_loading(true);
    assert!(rx.has_changed().unwrap());
    assert!(rx.borrow_and_update().loading);
}

#[test]
fn user_deserializes_from_camel_case() {
    let json = serde_json::json!({ "id": "u9", "name": "Grace", "email": "g@example.com", "isVerified": true });
    let parsed: User = serde_json::from_value(json).unwrap();
    assert!(parsed.is_verified);
    let sparse: User = serde_json::from_value(serde_json::json!({ "id": "u9" })).unwrap();
    assert_eq!(sparse.name, "");
}
