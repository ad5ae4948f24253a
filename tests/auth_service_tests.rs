//! Auth service lifecycle tests against the in-memory store

use std::sync::Arc;

use klinik_auth::auth::models::{Role, RoleKind};
use klinik_auth::auth::{AuthService, FileTokenStorage, MemoryTokenStorage, TokenStorage};
use klinik_auth::config::AuthConfig;
use klinik_auth::error::Error;
use klinik_auth::store::memory::MemoryStore;
use uuid::Uuid;

// Low bcrypt cost keeps the suite fast; the cost itself is covered by unit
// tests in the password module.
fn test_auth_config() -> AuthConfig {
    AuthConfig {
        session_ttl_hours: 24,
        bcrypt_cost: 4,
        token_file: ".unused".into(),
    }
}

fn service_over(store: &MemoryStore, storage: Arc<dyn TokenStorage>) -> AuthService {
    AuthService::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        storage,
        &test_auth_config(),
    )
}

fn memory_service(store: &MemoryStore) -> AuthService {
    service_over(store, Arc::new(MemoryTokenStorage::new()))
}

async fn seed_admin(service: &AuthService) -> Uuid {
    service
        .create_account("a@x.com", "Secret123", Role::Admin, "Ayşe", "Yılmaz")
        .await
        .expect("seeding admin account")
        .id
}

#[tokio::test]
async fn test_login_success_resolves_account_and_session() {
    let store = MemoryStore::new();
    let service = memory_service(&store);
    seed_admin(&service).await;

    let account = service.login("a@x.com", "Secret123").await.unwrap();
    assert_eq!(account.email, "a@x.com");
    assert!(account.last_login_at.is_some());

    assert!(service.validate_token().await.unwrap());
    assert!(service.has_role(RoleKind::Admin).await);
    assert_eq!(store.session_count().await, 1);
}

#[tokio::test]
async fn test_login_email_is_case_insensitive() {
    let store = MemoryStore::new();
    let service = memory_service(&store);
    seed_admin(&service).await;

    assert!(service.login(" A@X.Com ", "Secret123").await.is_ok());
}

#[tokio::test]
async fn test_login_wrong_password_creates_no_session() {
    let store = MemoryStore::new();
    let service = memory_service(&store);
    seed_admin(&service).await;

    let err = service.login("a@x.com", "wrong").await.unwrap_err();
    assert!(matches!(err, Error::InvalidCredentials));
    assert_eq!(store.session_count().await, 0);
    assert!(!service.validate_token().await.unwrap());
}

#[tokio::test]
async fn test_login_unknown_email_same_error_as_wrong_password() {
    let store = MemoryStore::new();
    let service = memory_service(&store);
    seed_admin(&service).await;

    let unknown = service.login("nobody@x.com", "Secret123").await.unwrap_err();
    let wrong = service.login("a@x.com", "wrong").await.unwrap_err();
    assert_eq!(unknown.to_string(), wrong.to_string());
}

#[tokio::test]
async fn test_login_inactive_account_rejected_with_correct_password() {
    let store = MemoryStore::new();
    let service = memory_service(&store);
    let id = seed_admin(&service).await;

    store.set_active(id, false).await;

    let err = service.login("a@x.com", "Secret123").await.unwrap_err();
    assert!(matches!(err, Error::InvalidCredentials));
}

#[tokio::test]
async fn test_interleaved_logins_keep_tokens_per_account() {
    let store = MemoryStore::new();
    let service = memory_service(&store);
    seed_admin(&service).await;
    service
        .create_account("b@x.com", "Other456", Role::Admin, "Banu", "Kaya")
        .await
        .unwrap();

    // Another sign-in lands on the shared service between this one and the
    // moment its caller uses the token; the token must still belong to the
    // account that created it.
    let (account_a, token_a) = service.login_session("a@x.com", "Secret123").await.unwrap();
    service.login("b@x.com", "Other456").await.unwrap();

    let resolved = service.resolve_token(&token_a).await.unwrap().unwrap();
    assert_eq!(resolved.email, "a@x.com");
    assert_eq!(resolved.id, account_a.id);
}

#[tokio::test]
async fn test_credential_store_outage_during_login_is_not_raw_store_error() {
    let store = MemoryStore::new();
    let service = memory_service(&store);
    seed_admin(&service).await;

    store.set_failing(true).await;
    let err = service.login("a@x.com", "Secret123").await.unwrap_err();
    assert!(matches!(err, Error::SessionCreationFailed));

    store.set_failing(false).await;
    assert_eq!(store.session_count().await, 0);
    assert!(!service.validate_token().await.unwrap());
}

#[tokio::test]
async fn test_session_insert_failure_surfaces_and_leaves_no_state() {
    let store = MemoryStore::new();
    let service = memory_service(&store);
    seed_admin(&service).await;

    store.set_sessions_failing(true).await;
    let err = service.login("a@x.com", "Secret123").await.unwrap_err();
    assert!(matches!(err, Error::SessionCreationFailed));

    store.set_sessions_failing(false).await;
    assert!(!service.validate_token().await.unwrap());
    assert!(service.current_account().await.is_none());
}

#[tokio::test]
async fn test_expired_session_clears_state_without_further_store_access() {
    let store = MemoryStore::new();
    let service = memory_service(&store);
    seed_admin(&service).await;

    service.login("a@x.com", "Secret123").await.unwrap();
    let token = service.current_token().await.unwrap();
    store.force_expire(&token).await;

    assert!(!service.validate_token().await.unwrap());
    assert!(service.current_token().await.is_none());

    // With no held token the check must answer without touching the store.
    store.set_failing(true).await;
    assert!(!service.validate_token().await.unwrap());
}

#[tokio::test]
async fn test_deactivation_kills_live_session() {
    let store = MemoryStore::new();
    let service = memory_service(&store);
    let id = seed_admin(&service).await;

    service.login("a@x.com", "Secret123").await.unwrap();
    assert!(service.validate_token().await.unwrap());

    store.set_active(id, false).await;
    assert!(!service.validate_token().await.unwrap());
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let store = MemoryStore::new();
    let service = memory_service(&store);
    seed_admin(&service).await;

    // Without any login
    service.logout().await;
    service.logout().await;
    assert!(!service.validate_token().await.unwrap());

    service.login("a@x.com", "Secret123").await.unwrap();
    service.logout().await;
    service.logout().await;
    assert!(!service.validate_token().await.unwrap());
    assert_eq!(store.session_count().await, 0);
}

#[tokio::test]
async fn test_logout_clears_state_even_when_store_is_down() {
    let store = MemoryStore::new();
    let service = memory_service(&store);
    seed_admin(&service).await;

    service.login("a@x.com", "Secret123").await.unwrap();
    store.set_sessions_failing(true).await;
    service.logout().await;

    assert!(service.current_account().await.is_none());
    assert!(service.current_token().await.is_none());
}

#[tokio::test]
async fn test_role_predicate() {
    let store = MemoryStore::new();
    let service = memory_service(&store);

    // Nobody signed in
    assert!(!service.has_role(RoleKind::Admin).await);

    let profile_id = Uuid::new_v4();
    service
        .create_account(
            "e@x.com",
            "Secret123",
            Role::Expert { profile_id },
            "Mehmet",
            "Demir",
        )
        .await
        .unwrap();

    let account = service.login("e@x.com", "Secret123").await.unwrap();
    assert!(service.has_role(RoleKind::Expert).await);
    assert!(!service.has_role(RoleKind::Admin).await);
    assert_eq!(account.role.expert_profile_id(), Some(profile_id));
}

#[tokio::test]
async fn test_change_password_round_trip() {
    let store = MemoryStore::new();
    let service = memory_service(&store);
    seed_admin(&service).await;

    service.login("a@x.com", "Secret123").await.unwrap();
    service
        .change_password("Secret123", "Better456")
        .await
        .unwrap();
    service.logout().await;

    assert!(service.login("a@x.com", "Better456").await.is_ok());
    service.logout().await;
    let err = service.login("a@x.com", "Secret123").await.unwrap_err();
    assert!(matches!(err, Error::InvalidCredentials));
}

#[tokio::test]
async fn test_change_password_rejects_wrong_current() {
    let store = MemoryStore::new();
    let service = memory_service(&store);
    seed_admin(&service).await;

    service.login("a@x.com", "Secret123").await.unwrap();
    let err = service
        .change_password("not-the-password", "Better456")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::WrongCurrentPassword));
    service.logout().await;

    // Stored hash untouched
    assert!(service.login("a@x.com", "Secret123").await.is_ok());
}

#[tokio::test]
async fn test_change_password_requires_session() {
    let store = MemoryStore::new();
    let service = memory_service(&store);
    seed_admin(&service).await;

    let err = service
        .change_password("Secret123", "Better456")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NoSession));
}

#[tokio::test]
async fn test_change_password_reports_update_failure() {
    let store = MemoryStore::new();
    let service = memory_service(&store);
    seed_admin(&service).await;

    service.login("a@x.com", "Secret123").await.unwrap();
    store.set_failing(true).await;
    let err = service
        .change_password("Secret123", "Better456")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UpdateFailed));
}

#[tokio::test]
async fn test_change_password_revokes_other_sessions() {
    let store = MemoryStore::new();
    let first = memory_service(&store);
    let second = memory_service(&store);
    seed_admin(&first).await;

    first.login("a@x.com", "Secret123").await.unwrap();
    second.login("a@x.com", "Secret123").await.unwrap();
    assert_eq!(store.session_count().await, 2);

    first
        .change_password("Secret123", "Better456")
        .await
        .unwrap();

    // The changing session survives, the other one is gone
    assert!(first.validate_token().await.unwrap());
    assert!(!second.validate_token().await.unwrap());
}

#[tokio::test]
async fn test_change_password_without_held_token_revokes_every_session() {
    let store = MemoryStore::new();
    let admin = memory_service(&store);
    let other = memory_service(&store);
    let id = seed_admin(&admin).await;

    other.login("a@x.com", "Secret123").await.unwrap();
    assert_eq!(store.session_count().await, 1);

    // A reset path with no session of its own keeps nothing alive
    admin
        .change_password_for(id, None, "Secret123", "Better456")
        .await
        .unwrap();

    assert_eq!(store.session_count().await, 0);
    assert!(!other.validate_token().await.unwrap());
}

#[tokio::test]
async fn test_resume_restores_session_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let token_path = dir.path().join("token");
    let store = MemoryStore::new();

    let first = service_over(&store, Arc::new(FileTokenStorage::new(&token_path)));
    seed_admin(&first).await;
    first.login("a@x.com", "Secret123").await.unwrap();
    drop(first);

    // A new client instance picks the token up from disk
    let second = service_over(&store, Arc::new(FileTokenStorage::new(&token_path)));
    assert!(second.resume().await.unwrap());
    let account = second.current_account().await.unwrap();
    assert_eq!(account.email, "a@x.com");
}

#[tokio::test]
async fn test_resume_with_expired_session_clears_persisted_token() {
    let dir = tempfile::tempdir().unwrap();
    let token_path = dir.path().join("token");
    let store = MemoryStore::new();

    let first = service_over(&store, Arc::new(FileTokenStorage::new(&token_path)));
    seed_admin(&first).await;
    first.login("a@x.com", "Secret123").await.unwrap();
    let token = first.current_token().await.unwrap();
    store.force_expire(&token).await;
    drop(first);

    let second = service_over(&store, Arc::new(FileTokenStorage::new(&token_path)));
    assert!(!second.resume().await.unwrap());
    let storage = FileTokenStorage::new(&token_path);
    assert!(storage.load().unwrap().is_none());
}

#[tokio::test]
async fn test_resume_without_persisted_token() {
    let store = MemoryStore::new();
    let service = memory_service(&store);
    assert!(!service.resume().await.unwrap());
}
