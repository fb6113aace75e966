//! Integration tests for the `courtside` facade: builder, storage choice
//! and a full bootstrap against an unreachable backend.

use std::path::PathBuf;

use courtside::prelude::*;
use courtside_storage::{CredentialVault, PersistedCredentials};
use tempfile::TempDir;

// =========================================================================
// Helpers
// =========================================================================

/// A credential path inside a fresh temp dir. Keep the `TempDir` alive
/// for as long as the path is used.
fn scratch_file() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("credentials.json");
    (dir, path)
}

/// A base URL nothing is listening on, so every request is refused.
fn dead_backend_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/api")
}

fn seed(path: &PathBuf, user: &UserProfile) {
    let vault = CredentialVault::new(FileStore::open(path.clone()).unwrap());
    vault
        .save(&PersistedCredentials::authenticated(
            &TokenPair::new("access-1", Some("refresh-1".into())),
            user,
        ))
        .unwrap();
}

// =========================================================================
// Builder
// =========================================================================

#[test]
fn test_builder_default_is_in_memory() {
    let client = CourtsideClientBuilder::new().build().unwrap();
    assert!(matches!(client.vault().store(), ClientStore::Memory(_)));
    assert!(client.state().is_loading());
}

#[test]
fn test_builder_applies_config() {
    let client = CourtsideClientBuilder::new()
        .api_base_url("https://api.courtside.app/api")
        .request_timeout(std::time::Duration::from_secs(2))
        .build()
        .unwrap();

    let config = client.backend().config();
    assert_eq!(config.base_url, "https://api.courtside.app/api");
    assert_eq!(config.timeout, std::time::Duration::from_secs(2));
}

#[test]
fn test_builder_storage_path_uses_file_store() {
    let (_dir, path) = scratch_file();
    let client = CourtsideClientBuilder::new()
        .storage_path(&path)
        .build()
        .unwrap();

    match client.vault().store() {
        ClientStore::File(store) => assert_eq!(store.path(), path.as_path()),
        ClientStore::Memory(_) => panic!("expected a file store"),
    }
}

#[test]
fn test_builder_in_memory_overrides_path() {
    let (_dir, path) = scratch_file();
    let client = CourtsideClientBuilder::new()
        .storage_path(path)
        .in_memory()
        .build()
        .unwrap();
    assert!(matches!(client.vault().store(), ClientStore::Memory(_)));
}

// =========================================================================
// Bootstrap end to end
// =========================================================================

#[tokio::test]
async fn test_fresh_client_bootstraps_anonymous() {
    let client = CourtsideClientBuilder::new()
        .api_base_url(dead_backend_url())
        .build()
        .unwrap();

    let outcome = client.bootstrap().await.unwrap();

    assert_eq!(outcome, BootstrapOutcome::Anonymous);
    assert!(!client.state().is_loading());
}

#[tokio::test]
async fn test_cached_session_survives_unreachable_backend() {
    let (_dir, path) = scratch_file();
    let user = UserProfile::new("u1", "u1@example.com");
    seed(&path, &user);

    let client = CourtsideClientBuilder::new()
        .api_base_url(dead_backend_url())
        .storage_path(&path)
        .build()
        .unwrap();
    let outcome = client.bootstrap().await.unwrap();

    assert_eq!(outcome, BootstrapOutcome::Offline);
    let state = client.state();
    assert!(state.is_authenticated());
    assert_eq!(state.user(), Some(&user));
    assert_eq!(state.access_token(), Some("access-1"));
}

#[tokio::test]
async fn test_logout_clears_file_cache() {
    let (_dir, path) = scratch_file();
    seed(&path, &UserProfile::new("u1", "u1@example.com"));

    let client = CourtsideClientBuilder::new()
        .api_base_url(dead_backend_url())
        .storage_path(&path)
        .build()
        .unwrap();
    client.bootstrap().await.unwrap();
    client.logout().await;

    // A second client reading the same file finds nothing.
    let reopened = CredentialVault::new(FileStore::open(path).unwrap());
    assert!(reopened.load().is_empty());
}
