//! File-backed session persistence across process restarts.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use classdesk_application::auth::TokenStore;
use classdesk_application::ports::{SessionStorage, StorageError};
use classdesk_domain::User;
use classdesk_domain::session::SESSION_STORAGE_KEY;
use classdesk_infrastructure::{FileSessionStorage, TokioFileSystem};
use pretty_assertions::assert_eq;
use serde_json::Value;

fn storage(root: &std::path::Path) -> Arc<FileSessionStorage<TokioFileSystem>> {
    Arc::new(FileSessionStorage::new(TokioFileSystem::new(), root.join("classdesk")))
}

#[tokio::test]
async fn test_session_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let mut user = User::new("1", "a@b.com");
    user.first_name = Some("Ada".to_string());

    TokenStore::new(storage(dir.path()))
        .login(user.clone(), "T1".into(), "R1".into())
        .await;

    let restored = TokenStore::rehydrate(storage(dir.path())).await;
    assert!(restored.is_authenticated().await);
    assert_eq!(restored.user().await, Some(user));
    assert_eq!(restored.access_token().await.as_deref(), Some("T1"));
    assert_eq!(restored.refresh_token().await.as_deref(), Some("R1"));
}

#[tokio::test]
async fn test_session_file_is_versioned_pretty_json() {
    let dir = tempfile::tempdir().unwrap();
    TokenStore::new(storage(dir.path()))
        .login(User::new("1", "a@b.com"), "T1".into(), "R1".into())
        .await;

    let path = dir.path().join("classdesk/auth-storage.json");
    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.ends_with("}\n"));
    assert!(content.contains("\n  \"state\""));

    let document: Value = serde_json::from_str(&content).unwrap();
    assert_eq!(document["version"], 1);
    assert_eq!(document["state"]["user"]["email"], "a@b.com");
    assert!(!dir.path().join("classdesk/auth-storage.json.tmp").exists());
}

#[tokio::test]
async fn test_logout_wipes_every_key_in_namespace() {
    let dir = tempfile::tempdir().unwrap();
    let storage = storage(dir.path());
    storage.save("ui-preferences", b"{\"theme\": \"dark\"}").await.unwrap();

    let store = TokenStore::new(storage.clone());
    store
        .login(User::new("1", "a@b.com"), "T1".into(), "R1".into())
        .await;
    store.logout().await;

    assert_eq!(storage.load(SESSION_STORAGE_KEY).await.unwrap(), None);
    assert_eq!(storage.load("ui-preferences").await.unwrap(), None);
    assert!(!TokenStore::rehydrate(storage).await.is_authenticated().await);
}

#[tokio::test]
async fn test_logout_wipes_subdirectories_and_session_file() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("classdesk");
    let storage = storage(dir.path());

    let store = TokenStore::new(storage.clone());
    store
        .login(User::new("1", "a@b.com"), "T1".into(), "R1".into())
        .await;
    std::fs::create_dir_all(root.join("a-cache/nested")).unwrap();
    std::fs::write(root.join("a-cache/nested/page.json"), "{}").unwrap();

    assert!(store.logout().await);

    assert!(!root.join("auth-storage.json").exists());
    assert!(!root.join("a-cache").exists());
    assert!(!TokenStore::rehydrate(storage).await.is_authenticated().await);
}

#[tokio::test]
async fn test_corrupt_file_starts_anonymous() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("classdesk");
    std::fs::create_dir_all(&root).unwrap();
    std::fs::write(root.join("auth-storage.json"), "{\"version\": 1, \"state\":").unwrap();

    let store = TokenStore::rehydrate(storage(dir.path())).await;
    assert!(!store.is_authenticated().await);
}

#[tokio::test]
async fn test_clear_on_missing_namespace_is_ok() {
    let dir = tempfile::tempdir().unwrap();
    storage(dir.path()).clear().await.unwrap();
}

#[tokio::test]
async fn test_rejects_path_like_keys_and_non_json_values() {
    let dir = tempfile::tempdir().unwrap();
    let storage = storage(dir.path());

    assert!(matches!(
        storage.load("../outside").await,
        Err(StorageError::InvalidKey(_))
    ));
    assert!(matches!(
        storage.save("notes", b"not json").await,
        Err(StorageError::Serialization(_))
    ));
}
