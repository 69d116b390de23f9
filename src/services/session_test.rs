use super::*;

#[test]
fn tokens_are_random_hex() {
    let a = generate_token();
    let b = generate_token();
    assert_eq!(a.len(), 64);
    assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    assert_ne!(a, b);
}

#[test]
fn hash_is_stable_sha256() {
    assert_eq!(
        hash_token("abc"),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
    assert_ne!(hash_token("abc"), "abc");
}

#[test]
fn only_administrators_manage_options() {
    assert!(Role::Administrator.can_manage_options());
    for role in &ROLES[1..] {
        assert!(!role.can_manage_options(), "{} must not manage options", role.as_str());
    }
}

#[test]
fn role_names_round_trip() {
    for role in ROLES {
        assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
    }
    let err = "superuser".parse::<Role>().unwrap_err();
    assert!(matches!(err, SessionError::UnknownRole(ref raw) if raw == "superuser"));
    assert_eq!(err.error_code(), "E_STORAGE_MALFORMED");
    assert_eq!(Role::Editor.display_name(), "Editor");
}

#[tokio::test]
async fn memory_store_validates_bound_tokens() {
    let store = MemorySessionStore::new();
    let user = store.ensure_user_session("ada", Role::Editor, "tok-1").await.unwrap();
    assert_eq!(store.validate("tok-1").await.unwrap(), Some(user));
    assert_eq!(store.validate("tok-2").await.unwrap(), None);
}

#[tokio::test]
async fn ensure_user_session_upserts_by_name() {
    let store = MemorySessionStore::new();
    let first = store.ensure_user_session("ada", Role::Subscriber, "old").await.unwrap();
    let second = store.ensure_user_session("ada", Role::Administrator, "new").await.unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(store.count_users().await.unwrap(), 1);

    let via_old = store.validate("old").await.unwrap().unwrap();
    assert_eq!(via_old.role, Role::Administrator);
}

#[test]
fn session_user_serializes_lowercase_role() {
    let user = SessionUser { id: Uuid::nil(), name: "ada".into(), role: Role::Administrator };
    let value = serde_json::to_value(&user).unwrap();
    assert_eq!(value["role"], "administrator");
    assert_eq!(value["name"], "ada");
}
