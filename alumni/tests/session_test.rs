use alumni::session::{FileStore, KeyValueStore, MemoryStore, Session};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_memory_store_roundtrip() {
    let mut store = MemoryStore::new();
    assert_eq!(store.get("k").unwrap(), None);

    store.set("k", "v").unwrap();
    assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));

    store.remove("k").unwrap();
    assert_eq!(store.get("k").unwrap(), None);
}

#[test]
fn test_session_login_and_logout() {
    let mut session = Session::new(MemoryStore::new());
    assert!(!session.is_logged_in().unwrap());

    session.save_login("jwt", Some("u-1")).unwrap();
    assert!(session.is_logged_in().unwrap());
    assert_eq!(session.token().unwrap().as_deref(), Some("jwt"));
    assert_eq!(session.user_id().unwrap().as_deref(), Some("u-1"));

    session.clear().unwrap();
    assert!(!session.is_logged_in().unwrap());
    assert_eq!(session.user_id().unwrap(), None);
}

#[test]
fn test_relogin_without_user_drops_stale_id() {
    let mut session = Session::new(MemoryStore::new());
    session.save_login("old", Some("u-1")).unwrap();
    session.save_login("new", None).unwrap();

    assert_eq!(session.token().unwrap().as_deref(), Some("new"));
    assert_eq!(session.user_id().unwrap(), None);
}

#[test]
fn test_file_store_persists_across_instances() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("session.json");

    let mut first = Session::new(FileStore::new(path.clone()));
    first.save_login("jwt", Some("u-7")).unwrap();
    assert!(path.exists());

    let second = Session::new(FileStore::new(path.clone()));
    assert_eq!(second.token().unwrap().as_deref(), Some("jwt"));
    assert_eq!(second.user_id().unwrap().as_deref(), Some("u-7"));

    first.clear().unwrap();
    assert!(!second.is_logged_in().unwrap());
}

#[test]
fn test_file_store_tolerates_missing_and_empty_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.json");

    let store = FileStore::new(path.clone());
    assert_eq!(store.get("auth_token").unwrap(), None);

    fs::write(&path, "  \n").unwrap();
    assert_eq!(store.get("auth_token").unwrap(), None);
}

#[test]
fn test_file_store_rejects_corrupt_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.json");
    fs::write(&path, "{ not json").unwrap();

    let err = FileStore::new(path).get("auth_token").unwrap_err();
    assert!(err.to_string().contains("Failed to parse"));
}
