use super::*;
use chrono::Duration;

fn session(token: &str) -> Session {
    Session {
        token: token.to_string(),
        user_id: Some("u-1".into()),
        expires_at: None,
    }
}

#[test]
fn write_then_read_round_trips_optional_fields() {
    let store = SessionStore::in_memory();
    let mut stored = session("abc");
    stored.expires_at = Some(Utc::now() + Duration::hours(1));

    store.write(&stored);

    assert_eq!(store.read(), Some(stored));
}

#[test]
fn clear_is_idempotent() {
    let store = SessionStore::in_memory();
    store.clear();
    store.write(&session("abc"));
    store.clear();
    store.clear();
    assert_eq!(store.read(), None);
}

#[test]
fn write_is_idempotent() {
    let store = SessionStore::in_memory();
    store.write(&session("abc"));
    store.write(&session("abc"));
    assert_eq!(store.read().map(|s| s.token), Some("abc".to_string()));
}

#[test]
fn detached_store_is_a_no_op() {
    let store = SessionStore::detached();
    store.write(&session("abc"));
    assert!(!store.is_durable());
    assert_eq!(store.read(), None);
    store.clear();
}

#[test]
fn clones_share_the_backend() {
    let store = SessionStore::in_memory();
    let other = store.clone();
    store.write(&session("abc"));
    assert!(other.read().is_some());
    other.clear();
    assert!(store.read().is_none());
}

#[test]
fn malformed_record_reads_as_absent() {
    let backend = Arc::new(MemoryStore::new());
    backend.set(SESSION_KEY, "{not json").expect("set");
    let store = SessionStore::new(backend);
    assert_eq!(store.read(), None);
}

#[test]
fn empty_token_reads_as_absent() {
    let backend = Arc::new(MemoryStore::new());
    backend.set(SESSION_KEY, r#"{"token":""}"#).expect("set");
    assert_eq!(SessionStore::new(backend).read(), None);
}

#[test]
fn current_drops_expired_sessions() {
    let store = SessionStore::in_memory();
    let now = Utc::now();
    let mut expired = session("old");
    expired.expires_at = Some(now - Duration::seconds(1));
    store.write(&expired);

    assert_eq!(store.current(now), None);
    assert_eq!(store.read(), None, "expired record should be removed");
}

#[test]
fn current_keeps_live_sessions() {
    let store = SessionStore::in_memory();
    store.write(&session("live"));
    assert_eq!(
        store.current(Utc::now()).map(|s| s.token),
        Some("live".to_string())
    );
}

#[test]
fn file_store_persists_across_instances() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("origin.json");

    SessionStore::new(Arc::new(FileStore::new(&path))).write(&session("disk"));
    assert!(path.exists());

    let reopened = SessionStore::new(Arc::new(FileStore::new(&path)));
    assert_eq!(reopened.read().map(|s| s.token), Some("disk".to_string()));

    reopened.clear();
    assert!(!path.exists(), "empty store removes its file");
}

#[test]
fn file_store_keeps_unrelated_keys() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileStore::new(dir.path().join("kv.json"));
    store.set("other", "1").expect("set other");
    store.set(SESSION_KEY, "x").expect("set session");
    store.remove(SESSION_KEY).expect("remove");
    assert_eq!(store.get("other").expect("get"), Some("1".to_string()));
    assert_eq!(store.get(SESSION_KEY).expect("get"), None);
}

#[test]
fn malformed_file_surfaces_an_error_but_session_reads_absent() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("kv.json");
    fs::write(&path, "[1,2,3]").expect("write");
    let store = FileStore::new(&path);
    assert!(store.get(SESSION_KEY).is_err());
    assert_eq!(SessionStore::new(Arc::new(store)).read(), None);
}

#[test]
fn origin_file_names_are_per_host_and_port() {
    let a = Url::parse("http://127.0.0.1:8000/api/").expect("url");
    let b = Url::parse("https://skripts.example.com/api/").expect("url");
    assert_eq!(origin_file_name(&a), "127.0.0.1_8000.json");
    assert_eq!(origin_file_name(&b), "skripts.example.com_443.json");

    let dir = Path::new("/data");
    assert_eq!(
        FileStore::for_origin(dir, &a).path(),
        Path::new("/data/sessions/127.0.0.1_8000.json")
    );
}
