//! Credential and session storage

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::auth::models::{Account, Session};
use crate::error::Result;

/// Account table access used by the auth service
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Point lookup by case-normalized email, active accounts only
    async fn find_active_by_email(&self, email: &str) -> Result<Option<Account>>;

    /// Point lookup by account id
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>>;

    /// Insert a new account row
    async fn insert(&self, account: &Account) -> Result<()>;

    /// Update the last-login timestamp
    async fn set_last_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<()>;

    /// Replace the stored password hash
    async fn set_password_hash(&self, id: Uuid, hash: &str) -> Result<()>;
}

/// Session table access used by the auth service
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert a new session row
    async fn insert(&self, session: &Session) -> Result<()>;

    /// Point lookup by token, joined to the owning account.
    ///
    /// Returns rows regardless of expiry; the caller decides what an
    /// expired session means.
    async fn find_with_account(&self, token: &str) -> Result<Option<(Session, Account)>>;

    /// Delete by token; deleting a missing token is not an error
    async fn delete(&self, token: &str) -> Result<()>;

    /// Delete every session for an account except the given token
    async fn delete_for_account_except(&self, account_id: Uuid, keep_token: &str) -> Result<()>;

    /// Delete every session for an account
    async fn delete_for_account(&self, account_id: Uuid) -> Result<()>;

    /// Remove expired rows. Optional hygiene; validity never depends on it.
    async fn delete_expired(&self) -> Result<u64>;
}
