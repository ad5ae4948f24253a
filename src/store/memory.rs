//! In-memory store used by tests and local development

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::models::{Account, Session};
use crate::error::{Error, Result};
use crate::store::{CredentialStore, SessionStore};

/// HashMap-backed implementation of both store traits
#[derive(Default)]
pub struct MemoryStore {
    accounts: Arc<RwLock<HashMap<Uuid, Account>>>,
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    /// When set, every store call fails. Lets tests exercise outage paths.
    fail: Arc<RwLock<bool>>,
    /// When set, only session-store calls fail
    fail_sessions: Arc<RwLock<bool>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle simulated store failure
    pub async fn set_failing(&self, failing: bool) {
        *self.fail.write().await = failing;
    }

    /// Toggle simulated session-store failure while credentials stay up
    pub async fn set_sessions_failing(&self, failing: bool) {
        *self.fail_sessions.write().await = failing;
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Flip an account's active flag
    pub async fn set_active(&self, id: Uuid, active: bool) {
        if let Some(account) = self.accounts.write().await.get_mut(&id) {
            account.active = active;
        }
    }

    /// Backdate a session so it reads as expired
    pub async fn force_expire(&self, token: &str) {
        if let Some(session) = self.sessions.write().await.get_mut(token) {
            session.expires_at = Utc::now() - chrono::Duration::seconds(1);
        }
    }

    async fn check_available(&self) -> Result<()> {
        if *self.fail.read().await {
            return Err(Error::Store("simulated store outage".to_string()));
        }
        Ok(())
    }

    async fn check_sessions_available(&self) -> Result<()> {
        self.check_available().await?;
        if *self.fail_sessions.read().await {
            return Err(Error::Store("simulated session store outage".to_string()));
        }
        Ok(())
    }
}

impl Clone for MemoryStore {
    fn clone(&self) -> Self {
        Self {
            accounts: Arc::clone(&self.accounts),
            sessions: Arc::clone(&self.sessions),
            fail: Arc::clone(&self.fail),
            fail_sessions: Arc::clone(&self.fail_sessions),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_active_by_email(&self, email: &str) -> Result<Option<Account>> {
        self.check_available().await?;
        let needle = email.trim().to_lowercase();
        let accounts = self.accounts.read().await;
        Ok(accounts
            .values()
            .find(|a| a.active && a.email == needle)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        self.check_available().await?;
        Ok(self.accounts.read().await.get(&id).cloned())
    }

    async fn insert(&self, account: &Account) -> Result<()> {
        self.check_available().await?;
        let mut accounts = self.accounts.write().await;
        if accounts.values().any(|a| a.email == account.email) {
            return Err(Error::AccountAlreadyExists(account.email.clone()));
        }
        accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn set_last_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        self.check_available().await?;
        let mut accounts = self.accounts.write().await;
        if let Some(account) = accounts.get_mut(&id) {
            account.last_login_at = Some(at);
        }
        Ok(())
    }

    async fn set_password_hash(&self, id: Uuid, hash: &str) -> Result<()> {
        self.check_available().await?;
        let mut accounts = self.accounts.write().await;
        match accounts.get_mut(&id) {
            Some(account) => {
                account.password_hash = hash.to_string();
                Ok(())
            }
            None => Err(Error::Store(format!("no account {}", id))),
        }
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn insert(&self, session: &Session) -> Result<()> {
        self.check_sessions_available().await?;
        self.sessions
            .write()
            .await
            .insert(session.token.clone(), session.clone());
        Ok(())
    }

    async fn find_with_account(&self, token: &str) -> Result<Option<(Session, Account)>> {
        self.check_sessions_available().await?;
        let sessions = self.sessions.read().await;
        let Some(session) = sessions.get(token) else {
            return Ok(None);
        };
        let accounts = self.accounts.read().await;
        let Some(account) = accounts.get(&session.account_id) else {
            return Ok(None);
        };
        Ok(Some((session.clone(), account.clone())))
    }

    async fn delete(&self, token: &str) -> Result<()> {
        self.check_sessions_available().await?;
        self.sessions.write().await.remove(token);
        Ok(())
    }

    async fn delete_for_account_except(&self, account_id: Uuid, keep_token: &str) -> Result<()> {
        self.check_sessions_available().await?;
        self.sessions
            .write()
            .await
            .retain(|token, s| s.account_id != account_id || token == keep_token);
        Ok(())
    }

    async fn delete_for_account(&self, account_id: Uuid) -> Result<()> {
        self.check_sessions_available().await?;
        self.sessions
            .write()
            .await
            .retain(|_, s| s.account_id != account_id);
        Ok(())
    }

    async fn delete_expired(&self) -> Result<u64> {
        self.check_sessions_available().await?;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired());
        Ok((before - sessions.len()) as u64)
    }
}
